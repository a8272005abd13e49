// Chirp - An object-oriented client for the Twitter REST and Streaming APIs
// Copyright (C) 2025 Chirp Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The three OAuth stages

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::api::{percent_encode, Api, Invocation, Operation, Parameters, SignedRequest};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::Account;

use super::{Credentials, OAuthCredentials, SignaturePlacement};

const REQUEST_TOKEN: Operation = Operation::form("POST", "/oauth/request_token");
const ACCESS_TOKEN: Operation = Operation::form("POST", "/oauth/access_token");

/// Out-of-band callback: the user is shown a PIN instead of being redirected
pub const OUT_OF_BAND: &str = "oob";

/// Consumer key pair of a registered application (stage 1)
#[derive(Debug, Clone)]
pub struct ApplicationCredentials {
    oauth: OAuthCredentials,
}

impl ApplicationCredentials {
    /// Application credentials on the default API configuration
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Result<Self> {
        Self::with_api(Api::new(ApiConfig::default())?, consumer_key, consumer_secret)
    }

    pub fn with_api(
        api: Api,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            oauth: OAuthCredentials::new(api, consumer_key, consumer_secret, None)?,
        })
    }

    pub fn with_placement(mut self, placement: SignaturePlacement) -> Self {
        self.oauth = self.oauth.with_placement(placement);
        self
    }

    pub fn consumer_key(&self) -> &str {
        self.oauth.consumer_key()
    }

    pub fn consumer_secret(&self) -> &str {
        self.oauth.consumer_secret()
    }

    /// Obtain a request token. `callback` defaults to out-of-band.
    pub async fn request(&self, callback: Option<&str>) -> Result<TemporaryCredentials> {
        let mut parameters = Parameters::new();
        parameters.insert(
            "oauth_callback".into(),
            callback.unwrap_or(OUT_OF_BAND).to_string(),
        );

        let response = self.call(&REQUEST_TOKEN, parameters).await?;
        let response = response.unwrap_or(Value::Null);

        let token_key = required_field(&response, "oauth_token")?;
        let token_secret = required_field(&response, "oauth_token_secret")?;
        let callback_confirmed = optional_field(&response, "oauth_callback_confirmed")
            .map(|value| value == "true")
            .unwrap_or(false);

        info!(token = %token_key, "Obtained request token");

        let mut temporary = TemporaryCredentials::with_api(
            self.oauth.api().clone(),
            self.consumer_key(),
            self.consumer_secret(),
            token_key,
            token_secret,
        )?;
        temporary.callback_confirmed = callback_confirmed;
        temporary.oauth = temporary.oauth.with_placement(self.oauth.placement());
        Ok(temporary)
    }
}

impl Credentials for ApplicationCredentials {
    fn api(&self) -> &Api {
        self.oauth.api()
    }

    fn sign(&self, invocation: Invocation) -> Result<SignedRequest> {
        self.oauth.sign(invocation)
    }
}

/// Request token awaiting user approval (stage 2)
#[derive(Debug, Clone)]
pub struct TemporaryCredentials {
    oauth: OAuthCredentials,
    callback_confirmed: bool,
}

impl TemporaryCredentials {
    /// Resume a handshake from a stored request token
    pub fn with_api(
        api: Api,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token_key: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Result<Self> {
        let token = Some((token_key.into(), token_secret.into()));
        Ok(Self {
            oauth: OAuthCredentials::new(api, consumer_key, consumer_secret, token)?,
            callback_confirmed: false,
        })
    }

    pub fn token_key(&self) -> &str {
        self.oauth.token_key().unwrap_or_default()
    }

    pub fn token_secret(&self) -> &str {
        self.oauth.token_secret().unwrap_or_default()
    }

    /// Whether the server acknowledged the callback
    pub fn callback_confirmed(&self) -> bool {
        self.callback_confirmed
    }

    /// Page the user visits to approve the application
    pub fn authorization_url(&self) -> String {
        let base = self.oauth.api().normalize_url("/oauth/authorize", None);
        format!("{}?oauth_token={}", base, percent_encode(self.token_key()))
    }

    /// Exchange the request token and the user's verifier (PIN) for an
    /// access token.
    pub async fn confirm(&self, verifier: &str) -> Result<TokenCredentials> {
        let mut parameters = Parameters::new();
        parameters.insert("oauth_verifier".into(), verifier.trim().to_string());

        let response = self.call(&ACCESS_TOKEN, parameters).await?;
        let response = response.unwrap_or(Value::Null);

        let token_key = required_field(&response, "oauth_token")?;
        let token_secret = required_field(&response, "oauth_token_secret")?;

        let token = TokenCredentials::with_api(
            self.oauth.api().clone(),
            self.oauth.consumer_key(),
            self.oauth.consumer_secret(),
            token_key,
            token_secret,
        )?
        .with_placement(self.oauth.placement())
        .with_identity(
            optional_field(&response, "user_id"),
            optional_field(&response, "screen_name"),
        );

        info!(
            screen_name = token.screen_name().unwrap_or("-"),
            "Obtained access token"
        );
        Ok(token)
    }
}

impl Credentials for TemporaryCredentials {
    fn api(&self) -> &Api {
        self.oauth.api()
    }

    fn sign(&self, invocation: Invocation) -> Result<SignedRequest> {
        self.oauth.sign(invocation)
    }
}

/// Access token bound to a user (stage 3)
#[derive(Debug, Clone)]
pub struct TokenCredentials {
    oauth: OAuthCredentials,
    user_id: Option<String>,
    screen_name: Option<String>,
}

impl TokenCredentials {
    /// Token credentials on the default API configuration
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token_key: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Result<Self> {
        Self::with_api(
            Api::new(ApiConfig::default())?,
            consumer_key,
            consumer_secret,
            token_key,
            token_secret,
        )
    }

    pub fn with_api(
        api: Api,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token_key: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Result<Self> {
        let token = Some((token_key.into(), token_secret.into()));
        Ok(Self {
            oauth: OAuthCredentials::new(api, consumer_key, consumer_secret, token)?,
            user_id: None,
            screen_name: None,
        })
    }

    pub fn with_placement(mut self, placement: SignaturePlacement) -> Self {
        self.oauth = self.oauth.with_placement(placement);
        self
    }

    pub fn with_identity(mut self, user_id: Option<String>, screen_name: Option<String>) -> Self {
        self.user_id = user_id;
        self.screen_name = screen_name;
        self
    }

    pub fn consumer_key(&self) -> &str {
        self.oauth.consumer_key()
    }

    pub fn consumer_secret(&self) -> &str {
        self.oauth.consumer_secret()
    }

    pub fn token_key(&self) -> &str {
        self.oauth.token_key().unwrap_or_default()
    }

    pub fn token_secret(&self) -> &str {
        self.oauth.token_secret().unwrap_or_default()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn screen_name(&self) -> Option<&str> {
        self.screen_name.as_deref()
    }

    /// Account of the user these credentials belong to
    pub fn account(&self) -> Account {
        Account::new(Arc::new(self.clone()))
    }
}

impl Credentials for TokenCredentials {
    fn api(&self) -> &Api {
        self.oauth.api()
    }

    fn sign(&self, invocation: Invocation) -> Result<SignedRequest> {
        self.oauth.sign(invocation)
    }
}

fn optional_field(response: &Value, key: &str) -> Option<String> {
    response
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required_field(response: &Value, key: &str) -> Result<String> {
    optional_field(response, key)
        .ok_or_else(|| Error::MalformedResponse(format!("`{}` missing from token response", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CannedTransport;

    fn application(transport: &Arc<CannedTransport>) -> ApplicationCredentials {
        ApplicationCredentials::with_api(transport.api(), "ck", "cs").unwrap()
    }

    #[tokio::test]
    async fn test_request_defaults_to_out_of_band() {
        let transport = CannedTransport::new();
        transport.respond(
            200,
            vec!["oauth_token=rk&oauth_token_secret=rs&oauth_callback_confirmed=true"],
        );

        let temporary = application(&transport).request(None).await.unwrap();
        assert_eq!(temporary.token_key(), "rk");
        assert_eq!(temporary.token_secret(), "rs");
        assert!(temporary.callback_confirmed());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method(), "POST");
        assert_eq!(requests[0].url(), "https://api.twitter.com/oauth/request_token");
        let authorization = requests[0].header("Authorization").unwrap();
        assert!(authorization.contains("oauth_callback=\"oob\""));
        assert!(!authorization.contains("oauth_token="));
    }

    #[tokio::test]
    async fn test_request_with_callback_url() {
        let transport = CannedTransport::new();
        transport.respond(200, vec!["oauth_token=rk&oauth_token_secret=rs"]);

        let temporary = application(&transport)
            .request(Some("https://example.org/cb"))
            .await
            .unwrap();
        assert!(!temporary.callback_confirmed());

        let authorization = transport.requests()[0]
            .header("Authorization")
            .unwrap()
            .to_string();
        assert!(authorization.contains("oauth_callback=\"https%3A%2F%2Fexample.org%2Fcb\""));
    }

    #[tokio::test]
    async fn test_request_missing_secret_is_malformed() {
        let transport = CannedTransport::new();
        transport.respond(200, vec!["oauth_token=rk"]);

        let result = application(&transport).request(None).await;
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_request_rejected_consumer() {
        let transport = CannedTransport::new();
        transport.respond(401, vec!["Failed to validate oauth signature and token"]);

        let result = application(&transport).request(None).await;
        assert!(matches!(result, Err(Error::CredentialsRejected { .. })));
    }

    #[test]
    fn test_authorization_url_embeds_token() {
        let temporary =
            TemporaryCredentials::with_api(CannedTransport::new().api(), "ck", "cs", "a b", "s")
                .unwrap();
        assert_eq!(
            temporary.authorization_url(),
            "https://api.twitter.com/oauth/authorize?oauth_token=a%20b"
        );
    }

    #[tokio::test]
    async fn test_confirm_yields_token_credentials() {
        let transport = CannedTransport::new();
        transport.respond(
            200,
            vec!["oauth_token=ak&oauth_token_secret=as&user_id=12&screen_name=jack"],
        );
        let temporary =
            TemporaryCredentials::with_api(transport.api(), "ck", "cs", "rk", "rs").unwrap();

        let token = temporary.confirm(" 1234567 ").await.unwrap();
        assert_eq!(token.token_key(), "ak");
        assert_eq!(token.token_secret(), "as");
        assert_eq!(token.user_id(), Some("12"));
        assert_eq!(token.screen_name(), Some("jack"));
        assert_eq!(token.consumer_key(), "ck");

        let request = &transport.requests()[0];
        assert_eq!(request.url(), "https://api.twitter.com/oauth/access_token");
        let authorization = request.header("Authorization").unwrap();
        assert!(authorization.contains("oauth_token=\"rk\""));
        assert!(authorization.contains("oauth_verifier=\"1234567\""));
    }

    #[tokio::test]
    async fn test_confirm_without_identity() {
        let transport = CannedTransport::new();
        transport.respond(200, vec!["oauth_token=ak&oauth_token_secret=as"]);
        let temporary =
            TemporaryCredentials::with_api(transport.api(), "ck", "cs", "rk", "rs").unwrap();

        let token = temporary.confirm("1").await.unwrap();
        assert!(token.user_id().is_none());
        assert!(token.screen_name().is_none());
    }

    #[test]
    fn test_placement_carries_through_stages() {
        let app = ApplicationCredentials::with_api(CannedTransport::new().api(), "ck", "cs")
            .unwrap()
            .with_placement(SignaturePlacement::Parameters);
        assert_eq!(app.oauth.placement(), SignaturePlacement::Parameters);
    }
}

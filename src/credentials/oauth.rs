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

//! OAuth 1.0a request signing (HMAC-SHA1)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::hmac;

use crate::api::{percent_encode, Api, Invocation, Parameters, SignedRequest};
use crate::error::{Error, Result};

use super::Credentials;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Where the OAuth protocol parameters travel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignaturePlacement {
    /// `Authorization: OAuth ...` header
    #[default]
    Header,
    /// Query string for GET, form body otherwise, next to the request parameters
    Parameters,
}

/// Consumer key pair plus an optional token pair.
///
/// Requests are signed with the consumer alone while no token is known
/// (request token stage) and with both afterwards.
#[derive(Clone)]
pub struct OAuthCredentials {
    api: Api,
    consumer_key: String,
    consumer_secret: String,
    token: Option<(String, String)>,
    placement: SignaturePlacement,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key())
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

impl OAuthCredentials {
    pub fn new(
        api: Api,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: Option<(String, String)>,
    ) -> Result<Self> {
        let consumer_key = consumer_key.into();
        let consumer_secret = consumer_secret.into();
        if consumer_key.trim().is_empty() || consumer_secret.trim().is_empty() {
            return Err(Error::CredentialsValue(
                "consumer key and secret must not be empty".into(),
            ));
        }
        if let Some((key, _)) = &token {
            if key.trim().is_empty() {
                return Err(Error::CredentialsValue("token key must not be empty".into()));
            }
        }

        Ok(Self {
            api,
            consumer_key,
            consumer_secret,
            token,
            placement: SignaturePlacement::default(),
        })
    }

    pub fn with_placement(mut self, placement: SignaturePlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn token_key(&self) -> Option<&str> {
        self.token.as_ref().map(|(key, _)| key.as_str())
    }

    pub fn token_secret(&self) -> Option<&str> {
        self.token.as_ref().map(|(_, secret)| secret.as_str())
    }

    pub fn placement(&self) -> SignaturePlacement {
        self.placement
    }

    /// Sign with an explicit nonce and timestamp
    pub fn sign_with(
        &self,
        invocation: Invocation,
        nonce: &str,
        timestamp: i64,
    ) -> Result<SignedRequest> {
        // Caller-supplied protocol parameters (oauth_callback, oauth_verifier)
        // travel with the generated ones.
        let (mut protocol, request): (Parameters, Parameters) = invocation
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(key, _)| key.starts_with("oauth_"));

        protocol.insert("oauth_consumer_key".into(), self.consumer_key.clone());
        protocol.insert("oauth_nonce".into(), nonce.to_string());
        protocol.insert("oauth_signature_method".into(), "HMAC-SHA1".into());
        protocol.insert("oauth_timestamp".into(), timestamp.to_string());
        if let Some(token_key) = self.token_key() {
            protocol.insert("oauth_token".into(), token_key.to_string());
        }
        protocol.insert("oauth_version".into(), "1.0".into());

        let mut all = protocol.clone();
        all.extend(request.clone());

        let base = signature_base_string(&invocation.method, &invocation.url, &all);
        let signature = hmac_sha1(
            &signing_key(&self.consumer_secret, self.token_secret()),
            &base,
        );

        let mut headers = invocation.headers.clone();
        let (url, body) = match self.placement {
            SignaturePlacement::Header => {
                protocol.insert("oauth_signature".into(), signature);
                headers.insert("Authorization".into(), authorization_header(&protocol));
                invocation.place_parameters(&request)
            }
            SignaturePlacement::Parameters => {
                all.insert("oauth_signature".into(), signature);
                invocation.place_parameters(&all)
            }
        };
        if body.is_some() {
            headers.insert("Content-Type".into(), FORM_CONTENT_TYPE.into());
        }

        Ok(SignedRequest::new(invocation.method, url, headers, body))
    }
}

impl Credentials for OAuthCredentials {
    fn api(&self) -> &Api {
        &self.api
    }

    fn sign(&self, invocation: Invocation) -> Result<SignedRequest> {
        self.sign_with(invocation, &generate_nonce(), chrono::Utc::now().timestamp())
    }
}

/// `METHOD&url&params`, every part percent-encoded, parameters sorted.
pub fn signature_base_string(method: &str, url: &str, parameters: &Parameters) -> String {
    let mut encoded: Vec<(String, String)> = parameters
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    )
}

/// `consumer_secret&token_secret`; the token part is empty before a token exists.
pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or(""))
    )
}

/// Base64 of HMAC-SHA1(key, data)
pub fn hmac_sha1(key: &str, data: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
    let tag = hmac::sign(&key, data.as_bytes());
    BASE64.encode(tag.as_ref())
}

fn authorization_header(protocol: &Parameters) -> String {
    let fields = protocol
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}

/// 32 hex characters
fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

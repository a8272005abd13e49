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

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::api::{Api, Invocation, SignedRequest};
use crate::error::{Error, Result};

use super::Credentials;

/// HTTP Basic authentication, for endpoints and proxies that still accept it
#[derive(Clone)]
pub struct BasicCredentials {
    api: Api,
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(api: Api, username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        if username.is_empty() || username.contains(':') {
            return Err(Error::CredentialsValue(
                "username must be non-empty and must not contain ':'".into(),
            ));
        }
        Ok(Self {
            api,
            username,
            password: password.into(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials for BasicCredentials {
    fn api(&self) -> &Api {
        &self.api
    }

    fn sign(&self, invocation: Invocation) -> Result<SignedRequest> {
        let token = BASE64.encode(format!("{}:{}", self.username, self.password));
        let mut headers = invocation.headers.clone();
        headers.insert("Authorization".into(), format!("Basic {}", token));

        let (url, body) = invocation.place_parameters(&invocation.parameters);
        if body.is_some() {
            headers.insert(
                "Content-Type".into(),
                "application/x-www-form-urlencoded".into(),
            );
        }
        Ok(SignedRequest::new(invocation.method, url, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Operation, Parameters};
    use crate::testing::CannedTransport;

    #[test]
    fn test_basic_header() {
        let api = CannedTransport::new().api();
        let creds = BasicCredentials::new(api.clone(), "Aladdin", "open sesame").unwrap();

        let mut params = Parameters::new();
        params.insert("count".into(), "5".into());
        let invocation = api
            .invoke(&Operation::new("GET", "statuses/public_timeline"), params)
            .unwrap();
        let request = creds.sign(invocation).unwrap();

        assert_eq!(
            request.header("authorization"),
            Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
        assert!(request.url().ends_with("public_timeline.json?count=5"));
        assert!(request.header("Content-Type").is_none());
    }

    #[test]
    fn test_colon_in_username_rejected() {
        let api = CannedTransport::new().api();
        assert!(matches!(
            BasicCredentials::new(api, "a:b", "pw"),
            Err(Error::CredentialsValue(_))
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = BasicCredentials::new(CannedTransport::new().api(), "user", "hunter2").unwrap();
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}

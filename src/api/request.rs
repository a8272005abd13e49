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

//! Invocations and signed requests

use std::collections::BTreeMap;

use crate::formats::Format;

/// Request parameters, sorted by name
pub type Parameters = BTreeMap<String, String>;

/// Request headers
pub type Headers = BTreeMap<String, String>;

/// Insert a parameter only when it has a value
pub fn set_optional<V: ToString>(parameters: &mut Parameters, name: &str, value: Option<V>) {
    if let Some(value) = value {
        parameters.insert(name.to_string(), value.to_string());
    }
}

/// A normalized, not yet signed, request
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Uppercase HTTP method
    pub method: String,
    /// Absolute URL without query string
    pub url: String,
    pub parameters: Parameters,
    pub headers: Headers,
    /// Format the response will be decoded with
    pub format: Format,
}

impl Invocation {
    /// Put the parameters where the method expects them: the query string for
    /// GET, a form body otherwise. Returns the final URL and body.
    pub fn place_parameters(&self, parameters: &Parameters) -> (String, Option<String>) {
        let encoded = encode_pairs(parameters);
        if self.method == "GET" {
            if encoded.is_empty() {
                (self.url.clone(), None)
            } else {
                (format!("{}?{}", self.url, encoded), None)
            }
        } else {
            (self.url.clone(), Some(encoded))
        }
    }
}

/// A request after signing. Nothing in it may change, or the signature breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    method: String,
    url: String,
    headers: Headers,
    body: Option<String>,
}

impl SignedRequest {
    pub fn new(method: String, url: String, headers: Headers, body: Option<String>) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL without the query string, safe to log
    pub fn endpoint(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Header value, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// RFC 3986 percent-encoding
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `k=v&k=v` with both sides percent-encoded, in parameter order
pub fn encode_pairs(parameters: &Parameters) -> String {
    parameters
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

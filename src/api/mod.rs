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

//! API access layer
//!
//! [`Api`] holds what is common to every request: endpoint configuration,
//! default headers and the transport. It turns an [`Operation`] plus
//! parameters into a normalized [`Invocation`], which credentials then sign.
//! Signed requests are executed either as a single call (read everything,
//! decode once) or as a flow (decode line by line, potentially forever).

mod request;

use std::borrow::Cow;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::Stream;
use serde_json::Value;
use tracing::{trace, warn};

pub use request::{
    encode_pairs, percent_encode, set_optional, Headers, Invocation, Parameters, SignedRequest,
};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::formats::Format;
use crate::transport::{HttpTransport, Lines, Transport};
use crate::{log_api_call, log_stream};

/// HTTP method, URL and response format of one remote operation.
///
/// The URL may be relative (`statuses/show/{id}`), host-absolute
/// (`/oauth/request_token`) or absolute. `{name}` placeholders are filled
/// from the invocation parameters.
#[derive(Debug, Clone)]
pub struct Operation {
    pub method: Cow<'static, str>,
    pub url: Cow<'static, str>,
    pub format: Format,
}

impl Operation {
    /// JSON operation
    pub const fn new(method: &'static str, url: &'static str) -> Self {
        Self {
            method: Cow::Borrowed(method),
            url: Cow::Borrowed(url),
            format: Format::Json,
        }
    }

    /// Form-urlencoded operation (OAuth handshake)
    pub const fn form(method: &'static str, url: &'static str) -> Self {
        Self {
            method: Cow::Borrowed(method),
            url: Cow::Borrowed(url),
            format: Format::Form,
        }
    }

    /// Operation built at runtime
    pub fn dynamic(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Cow::Owned(method.into()),
            url: Cow::Owned(url.into()),
            format: Format::Json,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

/// Shared API context
#[derive(Debug, Clone)]
pub struct Api {
    config: Arc<ApiConfig>,
    transport: Arc<dyn Transport>,
}

impl Api {
    /// Api over the default HTTP transport
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new()?)))
    }

    pub fn with_transport(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Library User-Agent
    pub fn user_agent() -> String {
        format!("chirp-core/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Trim and uppercase an HTTP method
    pub fn normalize_method(method: &str) -> Result<String> {
        let method = method.trim();
        if method.is_empty() {
            return Err(Error::OperationValue("HTTP method is empty".into()));
        }
        if !method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::OperationValue(format!("bad HTTP method: {:?}", method)));
        }
        Ok(method.to_ascii_uppercase())
    }

    /// Make a URL absolute and append the format extension.
    ///
    /// `scheme://...` is kept, `/path` is rooted at the API host, anything
    /// else is rooted at the versioned API prefix.
    pub fn normalize_url(&self, url: &str, extension: Option<&str>) -> String {
        let extension = extension
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let url = if url.contains("://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!(
                "{}://{}/{}",
                self.config.scheme(),
                self.config.api_host,
                url.trim_matches('/')
            )
        } else {
            format!(
                "{}://{}/{}/{}",
                self.config.scheme(),
                self.config.api_host,
                self.config.api_version,
                url.trim_matches('/')
            )
        };

        if url.ends_with(&extension) {
            url
        } else {
            url + &extension
        }
    }

    /// Append the library User-Agent to the caller's one, whatever its key case.
    pub fn normalize_headers(&self, mut headers: Headers) -> Headers {
        let user_agent = Self::user_agent();
        let existing = headers
            .keys()
            .find(|key| key.eq_ignore_ascii_case("user-agent"))
            .cloned();

        match existing {
            Some(key) => {
                let value = headers.remove(&key).unwrap_or_default();
                let value = if value.trim().is_empty() {
                    user_agent
                } else {
                    format!("{} {}", value.trim(), user_agent)
                };
                headers.insert(key, value);
            }
            None => {
                headers.insert("User-Agent".to_string(), user_agent);
            }
        }
        headers
    }

    /// Normalize an operation and its parameters. No I/O happens here.
    pub fn invoke(&self, operation: &Operation, parameters: Parameters) -> Result<Invocation> {
        let method = Self::normalize_method(&operation.method)?;
        let mut parameters = parameters;
        let url = fill_placeholders(&operation.url, &mut parameters)?;
        let url = self.normalize_url(&url, operation.format.extension());
        let headers = self.normalize_headers(self.config.headers.clone());

        Ok(Invocation {
            method,
            url,
            parameters,
            headers,
            format: operation.format.clone(),
        })
    }

    /// Single request: send, read the whole body, decode it.
    pub async fn call(&self, request: &SignedRequest, format: &Format) -> Result<Option<Value>> {
        log_api_call!(request.method(), request.endpoint());
        let started = Instant::now();

        let response = self
            .transport
            .open(request, Some(self.config.timeout))
            .await?;
        let success = response.is_success();
        let status = response.status;
        let body = response.body.text().await?;

        if !success {
            warn!(status, url = request.endpoint(), "API call failed");
            return Err(Error::from_status(status, body));
        }

        log_api_call!(
            request.method(),
            request.endpoint(),
            started.elapsed().as_millis() as u64
        );
        format.decode(&body)
    }

    /// Streaming request: every line of the body is one message.
    pub async fn flow(&self, request: &SignedRequest, format: &Format) -> Result<Flow> {
        log_api_call!(request.method(), request.endpoint());

        let response = self.transport.open(request, None).await?;
        if !response.is_success() {
            let status = response.status;
            let body = response.body.text().await?;
            log_stream!(disconnected, request.endpoint(), status.to_string());
            return Err(Error::from_status(status, body));
        }

        log_stream!(connected, request.endpoint());
        Ok(Flow::new(
            response.body.lines(),
            format.clone(),
            request.endpoint().to_string(),
        ))
    }
}

/// Replace `{name}` with the `name` parameter, consuming it.
fn fill_placeholders(url: &str, parameters: &mut Parameters) -> Result<String> {
    let mut filled = String::with_capacity(url.len());
    let mut rest = url;

    while let Some(start) = rest.find('{') {
        filled.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| Error::OperationValue(format!("unclosed placeholder in {:?}", url)))?;
        let name = &after[..end];
        let value = parameters.remove(name).ok_or_else(|| {
            Error::OperationValue(format!("missing parameter `{}` for {:?}", name, url))
        })?;
        filled.push_str(&percent_encode(&value));
        rest = &after[end + 1..];
    }
    filled.push_str(rest);

    Ok(filled)
}

type ValueStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;

/// Decoded lines of a streaming response.
///
/// Keep-alive lines are skipped. A line that fails to decode yields an
/// error and the flow goes on; a transport error ends the flow.
pub struct Flow {
    inner: ValueStream,
}

impl Flow {
    fn new(lines: Lines, format: Format, endpoint: String) -> Self {
        let inner = futures::stream::unfold(Some(lines), move |state| {
            let format = format.clone();
            let endpoint = endpoint.clone();
            async move {
                let mut lines = state?;
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => match format.decode(&line) {
                            Ok(Some(value)) => return Some((Ok(value), Some(lines))),
                            Ok(None) => trace!(target: "streaming", "Keep-alive"),
                            Err(e) => return Some((Err(e), Some(lines))),
                        },
                        Ok(None) => {
                            log_stream!(disconnected, &endpoint, "closed by server");
                            return None;
                        }
                        Err(e) => {
                            log_stream!(disconnected, &endpoint, e.to_string());
                            return Some((Err(e), None));
                        }
                    }
                }
            }
        });

        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for Flow {
    type Item = Result<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CannedTransport;
    use futures::StreamExt;
    use serde_json::json;

    const FAKE_OPERATION: Operation = Operation::new("GET", "/nowhere/");

    fn api(use_ssl: bool) -> Api {
        let config = ApiConfig {
            use_ssl,
            ..Default::default()
        };
        Api::with_transport(config, CannedTransport::new())
    }

    fn unsigned(invocation: &Invocation) -> SignedRequest {
        let (url, body) = invocation.place_parameters(&invocation.parameters);
        SignedRequest::new(invocation.method.clone(), url, invocation.headers.clone(), body)
    }

    #[test]
    fn test_normalize_method() {
        assert_eq!(Api::normalize_method(" gEt  ").unwrap(), "GET");
        assert_eq!(Api::normalize_method(" PoSt ").unwrap(), "POST");
        assert!(matches!(
            Api::normalize_method("  "),
            Err(Error::OperationValue(_))
        ));
        assert!(matches!(
            Api::normalize_method("1234"),
            Err(Error::OperationValue(_))
        ));
    }

    #[test]
    fn test_normalize_url() {
        for (api, scheme) in [(api(false), "http"), (api(true), "https")] {
            let base = format!("{}://api.twitter.com", scheme);
            assert_eq!(api.normalize_url("method", None), format!("{}/1/method", base));
            assert_eq!(api.normalize_url("method", Some("ext")), format!("{}/1/method.ext", base));
            assert_eq!(api.normalize_url("method", Some(".ext")), format!("{}/1/method.ext", base));
            assert_eq!(api.normalize_url("/method", None), format!("{}/method", base));
            assert_eq!(api.normalize_url("/method", Some("ext")), format!("{}/method.ext", base));
            assert_eq!(api.normalize_url("/method", Some(".ext")), format!("{}/method.ext", base));
            assert_eq!(api.normalize_url("proto://server/method", None), "proto://server/method");
            assert_eq!(
                api.normalize_url("proto://server/method", Some("ext")),
                "proto://server/method.ext"
            );
            assert_eq!(
                api.normalize_url("proto://server/method", Some(".ext")),
                "proto://server/method.ext"
            );
        }
    }

    #[test]
    fn test_extension_not_doubled() {
        let api = api(true);
        assert_eq!(
            api.normalize_url("statuses/update.json", Some("json")),
            "https://api.twitter.com/1/statuses/update.json"
        );
    }

    #[test]
    fn test_user_agent_alone() {
        let headers = api(true).normalize_headers(Headers::new());
        assert_eq!(headers["User-Agent"], Api::user_agent());
        assert!(Api::user_agent().starts_with("chirp-core/"));
    }

    #[test]
    fn test_user_agent_appended_whatever_the_key_case() {
        for key in ["User-Agent", "user-agent", "USER-AGENT"] {
            let mut headers = Headers::new();
            headers.insert(key.to_string(), "test-user-agent/1.2.3".to_string());
            let headers = api(true).normalize_headers(headers);

            assert_eq!(headers.len(), 1);
            assert_eq!(
                headers[key],
                format!("test-user-agent/1.2.3 {}", Api::user_agent())
            );
        }
    }

    #[test]
    fn test_invoke_normalizes_everything() {
        let mut config = ApiConfig::default();
        config.headers.insert("hello".into(), "world".into());
        config.headers.insert("empty".into(), String::new());
        let api = Api::with_transport(config, CannedTransport::new());

        let operation = Operation::new(" gEt ", "fake-operation");
        let mut params = Parameters::new();
        params.insert("a".into(), "123".into());

        let invocation = api.invoke(&operation, params).unwrap();
        assert_eq!(invocation.method, "GET");
        assert_eq!(invocation.url, "https://api.twitter.com/1/fake-operation.json");
        assert_eq!(invocation.parameters["a"], "123");
        assert_eq!(invocation.headers["hello"], "world");
        assert_eq!(invocation.headers["empty"], "");
        assert!(invocation.headers.contains_key("User-Agent"));
    }

    #[test]
    fn test_invoke_fills_placeholders() {
        let operation = Operation::new("POST", "statuses/retweet/{id}");
        let mut params = Parameters::new();
        params.insert("id".into(), "42".into());
        params.insert("trim_user".into(), "true".into());

        let invocation = api(true).invoke(&operation, params).unwrap();
        assert_eq!(invocation.url, "https://api.twitter.com/1/statuses/retweet/42.json");
        assert!(!invocation.parameters.contains_key("id"));
        assert_eq!(invocation.parameters["trim_user"], "true");
    }

    #[test]
    fn test_invoke_rejects_unfilled_placeholder() {
        let operation = Operation::new("GET", "statuses/show/{id}");
        let result = api(true).invoke(&operation, Parameters::new());
        assert!(matches!(result, Err(Error::OperationValue(_))));
    }

    #[test]
    fn test_form_operation_has_no_extension() {
        let operation = Operation::form("POST", "/oauth/request_token");
        let invocation = api(true).invoke(&operation, Parameters::new()).unwrap();
        assert_eq!(invocation.url, "https://api.twitter.com/oauth/request_token");
    }

    #[tokio::test]
    async fn test_call_decodes_body() {
        let transport = CannedTransport::new();
        transport.respond(200, vec!["{\"id\":", " 7}"]);
        let api = transport.api();

        let invocation = api.invoke(&FAKE_OPERATION, Parameters::new()).unwrap();
        let value = api
            .call(&unsigned(&invocation), &invocation.format)
            .await
            .unwrap();

        assert_eq!(value, Some(json!({"id": 7})));
        assert_eq!(transport.timeouts(), vec![Some(api.config().timeout)]);
    }

    #[tokio::test]
    async fn test_call_maps_error_statuses() {
        let transport = CannedTransport::new();
        transport.respond(401, vec!["Could not authenticate you."]);
        transport.respond(403, vec![""]);
        transport.respond(404, vec![""]);
        transport.respond(500, vec!["oops"]);
        let api = transport.api();
        let invocation = api.invoke(&FAKE_OPERATION, Parameters::new()).unwrap();
        let request = unsigned(&invocation);

        match api.call(&request, &Format::Json).await {
            Err(Error::CredentialsRejected { body }) => {
                assert_eq!(body, "Could not authenticate you.")
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            api.call(&request, &Format::Json).await,
            Err(Error::OperationNotPermitted { .. })
        ));
        assert!(matches!(
            api.call(&request, &Format::Json).await,
            Err(Error::OperationNotFound { .. })
        ));
        assert!(matches!(
            api.call(&request, &Format::Json).await,
            Err(Error::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_flow_skips_keepalives_and_survives_bad_lines() {
        let transport = CannedTransport::new();
        transport.respond(200, vec!["{\"n\":1}\r\n\r\n", "\r\nnot json\r\n{\"n\"", ":2}\r\n"]);
        let api = transport.api();
        let invocation = api.invoke(&FAKE_OPERATION, Parameters::new()).unwrap();

        let mut flow = api
            .flow(&unsigned(&invocation), &Format::Json)
            .await
            .unwrap();

        assert_eq!(flow.next().await.unwrap().unwrap(), json!({"n": 1}));
        assert!(flow.next().await.unwrap().is_err());
        assert_eq!(flow.next().await.unwrap().unwrap(), json!({"n": 2}));
        assert!(flow.next().await.is_none());
        assert_eq!(transport.timeouts(), vec![None]);
    }

    #[tokio::test]
    async fn test_flow_refused_connection() {
        let transport = CannedTransport::new();
        transport.respond(401, vec!["Unauthorized"]);
        let api = transport.api();
        let invocation = api.invoke(&FAKE_OPERATION, Parameters::new()).unwrap();

        let result = api.flow(&unsigned(&invocation), &Format::Json).await;
        assert!(matches!(result, Err(Error::CredentialsRejected { .. })));
    }
}

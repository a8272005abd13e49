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

//! Network transport
//!
//! A transport sends a signed request exactly as it was signed and hands the
//! response body back as a stream of chunks, so that the same code path
//! serves single calls and endless streams.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, Method};
use tracing::debug;

use crate::api::SignedRequest;
use crate::error::{Error, Result};

/// Body chunks as they arrive from the network
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Opens signed requests
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send the request. `timeout` bounds the whole exchange; `None` for streams.
    async fn open(&self, request: &SignedRequest, timeout: Option<Duration>) -> Result<Response>;
}

/// Status and body of an opened request
pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Response body, consumed either whole or line by line
pub struct Body {
    chunks: ChunkStream,
}

impl Body {
    pub fn new(chunks: ChunkStream) -> Self {
        Self { chunks }
    }

    /// Body made of fixed chunks
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::new(Box::pin(futures::stream::iter(chunks).map(Ok::<Bytes, Error>)))
    }

    /// Read the remaining body as (lossy) UTF-8 text
    pub async fn text(mut self) -> Result<String> {
        let mut data = Vec::new();
        while let Some(chunk) = self.chunks.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Split the body into lines
    pub fn lines(self) -> Lines {
        Lines {
            chunks: self.chunks,
            buffer: Vec::new(),
            done: false,
        }
    }
}

/// Line reader over a chunked body
pub struct Lines {
    chunks: ChunkStream,
    buffer: Vec<u8>,
    done: bool,
}

impl Lines {
    /// Next complete line without its terminator; `None` once the body ends.
    ///
    /// A trailing line with no newline is returned when the body ends.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
                return Ok(Some(to_line(&line)));
            }

            if self.done {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.buffer);
                return Ok(Some(to_line(&line)));
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    self.done = true;
                    self.buffer.clear();
                    return Err(e);
                }
                None => self.done = true,
            }
        }
    }
}

fn to_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
        .to_string()
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    /// Use an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &SignedRequest, timeout: Option<Duration>) -> Result<Response> {
        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|_| Error::OperationValue(format!("bad HTTP method: {}", request.method())))?;

        let mut builder = self.client.request(method, request.url());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        debug!(status, "Response received");

        let chunks = response.bytes_stream().map(|chunk| chunk.map_err(Error::from));
        Ok(Response {
            status,
            body: Body::new(Box::pin(chunks)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: &[&'static str]) -> Body {
        Body::from_chunks(
            chunks
                .iter()
                .map(|c| Bytes::from_static(c.as_bytes()))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_text_joins_chunks() {
        let text = body(&["a=1", "&b=", "2"]).text().await.unwrap();
        assert_eq!(text, "a=1&b=2");
    }

    #[tokio::test]
    async fn test_lines_across_chunk_boundaries() {
        let mut lines = body(&["{\"a\":", "1}\r\n\r\n{\"b\"", ":2}\n", "tail"]).lines();

        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("{\"b\":2}"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("tail"));
        assert_eq!(lines.next_line().await.unwrap(), None);
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[test]
    fn test_empty_body() {
        let mut lines = body(&[]).lines();
        assert_eq!(tokio_test::block_on(lines.next_line()).unwrap(), None);
        assert_eq!(tokio_test::block_on(body(&["", ""]).text()).unwrap(), "");
    }

    #[tokio::test]
    async fn test_lines_stop_after_error() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"first\npartial")),
            Err(Error::Codec("connection reset".into())),
            Ok(Bytes::from_static(b"never\n")),
        ];
        let mut lines = Body::new(Box::pin(futures::stream::iter(chunks))).lines();

        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("first"));
        assert!(lines.next_line().await.is_err());
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}

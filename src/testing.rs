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

//! Test transport that records requests and replays canned responses

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::api::{Api, SignedRequest};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::transport::{Body, Response, Transport};

#[derive(Debug, Default)]
pub struct CannedTransport {
    responses: Mutex<VecDeque<(u16, Vec<&'static str>)>>,
    requests: Mutex<Vec<(SignedRequest, Option<Duration>)>>,
}

impl CannedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response made of the given body chunks
    pub fn respond(&self, status: u16, chunks: Vec<&'static str>) {
        self.responses.lock().unwrap().push_back((status, chunks));
    }

    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, timeout)| *timeout)
            .collect()
    }

    /// Api on the default configuration backed by this transport
    pub fn api(self: &Arc<Self>) -> Api {
        Api::with_transport(ApiConfig::default(), self.clone())
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn open(&self, request: &SignedRequest, timeout: Option<Duration>) -> Result<Response> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), timeout));
        let (status, chunks) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Codec("no canned response left".into()))?;
        let chunks: Vec<Bytes> = chunks
            .into_iter()
            .map(|c| Bytes::from_static(c.as_bytes()))
            .collect();
        Ok(Response {
            status,
            body: Body::from_chunks(chunks),
        })
    }
}

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

//! Credentials sign invocations and run them through the API.
//!
//! The OAuth handshake is modelled as three stages, each a value of its own:
//! [`ApplicationCredentials`] obtains [`TemporaryCredentials`], which are
//! confirmed with a verifier into [`TokenCredentials`]. Every stage can sign
//! requests; only the last one is useful for regular API calls.

mod basic;
mod oauth;
mod stages;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use basic::BasicCredentials;
pub use oauth::{hmac_sha1, signature_base_string, signing_key, OAuthCredentials, SignaturePlacement};
pub use stages::{ApplicationCredentials, TemporaryCredentials, TokenCredentials, OUT_OF_BAND};

use crate::api::{Api, Flow, Invocation, Operation, Parameters, SignedRequest};
use crate::error::Result;

/// Anything able to sign a request
#[async_trait]
pub trait Credentials: Send + Sync + fmt::Debug {
    /// API context the credentials are bound to
    fn api(&self) -> &Api;

    /// Turn a normalized invocation into a ready-to-send request
    fn sign(&self, invocation: Invocation) -> Result<SignedRequest>;

    /// Invoke, sign and execute a single call
    async fn call(&self, operation: &Operation, parameters: Parameters) -> Result<Option<Value>> {
        let invocation = self.api().invoke(operation, parameters)?;
        let format = invocation.format.clone();
        let request = self.sign(invocation)?;
        self.api().call(&request, &format).await
    }

    /// Invoke, sign and open a streaming call
    async fn flow(&self, operation: &Operation, parameters: Parameters) -> Result<Flow> {
        let invocation = self.api().invoke(operation, parameters)?;
        let format = invocation.format.clone();
        let request = self.sign(invocation)?;
        self.api().flow(&request, &format).await
    }
}

/// Credentials shared between models and streams
pub type SharedCredentials = Arc<dyn Credentials>;

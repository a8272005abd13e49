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

//! Chirp Core - object-oriented client for the Twitter REST and Streaming APIs
//!
//! ```no_run
//! use chirp_core::{ApplicationCredentials, Result};
//!
//! # async fn run() -> Result<()> {
//! let application = ApplicationCredentials::new("consumer-key", "consumer-secret")?;
//! let temporary = application.request(None).await?;
//! println!("Visit {} and enter the PIN", temporary.authorization_url());
//!
//! let token = temporary.confirm("1234567").await?;
//! let me = token.account().verify_credentials().await?;
//! println!("Hello, @{}", me.screen_name);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod formats;
pub mod logger;
pub mod models;
pub mod store;
pub mod streams;
pub mod transport;

#[cfg(test)]
mod testing;

pub use api::{Api, Operation, Parameters};
pub use config::{ApiConfig, Settings};
pub use credentials::{
    ApplicationCredentials, BasicCredentials, Credentials, SharedCredentials,
    SignaturePlacement, TemporaryCredentials, TokenCredentials,
};
pub use error::{Error, Result};
pub use formats::Format;
pub use models::{Account, List, Model, NewStatus, PublicTimeline, Status, User, UserLookup};
pub use store::CredentialStore;
pub use streams::{DefaultMessageFactory, FilterParams, Message, MessageFactory, Stream};

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

//! Data models
//!
//! Plain serde structs ([`Status`], [`User`]) hold what the API returns.
//! [`Model`] binds such data to the credentials it was loaded with, so that
//! related resources can be fetched from it directly.

mod account;
mod status;
mod timeline;
mod user;

use std::fmt;
use std::ops::{Deref, Index};

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;

pub use account::Account;
pub use status::{NewStatus, Status};
pub use timeline::PublicTimeline;
pub use user::{User, UserLookup};

use crate::api::{Operation, Parameters};
use crate::credentials::SharedCredentials;
use crate::error::{Error, Result};

/// Timestamp layout used by the REST and streaming APIs
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parse `Wed Aug 27 13:08:45 +0000 2008`
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| Error::Codec(format!("bad timestamp {:?}: {}", value, e)))
}

/// Data bound to the credentials it was loaded with
#[derive(Clone)]
pub struct Model<T> {
    credentials: SharedCredentials,
    data: T,
}

impl<T> Model<T> {
    pub fn new(credentials: SharedCredentials, data: T) -> Self {
        Self { credentials, data }
    }

    pub fn credentials(&self) -> &SharedCredentials {
        &self.credentials
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }

    /// Bind related data to the same credentials
    pub(crate) fn relate<U>(&self, data: U) -> Model<U> {
        Model::new(self.credentials.clone(), data)
    }
}

impl<T> Deref for Model<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T: fmt::Debug> fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}

/// Ordered sequence of models sharing the same credentials
#[derive(Clone)]
pub struct List<T> {
    items: Vec<Model<T>>,
}

impl<T> List<T> {
    pub fn new(credentials: &SharedCredentials, data: Vec<T>) -> Self {
        Self {
            items: data
                .into_iter()
                .map(|item| Model::new(credentials.clone(), item))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Model<T>> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model<T>> {
        self.items.iter()
    }
}

impl<T> Index<usize> for List<T> {
    type Output = Model<T>;

    fn index(&self, index: usize) -> &Model<T> {
        &self.items[index]
    }
}

impl<T> IntoIterator for List<T> {
    type Item = Model<T>;
    type IntoIter = std::vec::IntoIter<Model<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a Model<T>;
    type IntoIter = std::slice::Iter<'a, Model<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

/// Call an operation and deserialize its non-empty response
pub(crate) async fn fetch<T: DeserializeOwned>(
    credentials: &SharedCredentials,
    operation: &Operation,
    parameters: Parameters,
) -> Result<T> {
    let value = credentials
        .call(operation, parameters)
        .await?
        .ok_or_else(|| Error::MalformedResponse(format!("empty response to {}", operation.url)))?;
    Ok(serde_json::from_value(value)?)
}

pub(crate) async fn fetch_model<T: DeserializeOwned>(
    credentials: &SharedCredentials,
    operation: &Operation,
    parameters: Parameters,
) -> Result<Model<T>> {
    let data = fetch(credentials, operation, parameters).await?;
    Ok(Model::new(credentials.clone(), data))
}

pub(crate) async fn fetch_list<T: DeserializeOwned>(
    credentials: &SharedCredentials,
    operation: &Operation,
    parameters: Parameters,
) -> Result<List<T>> {
    let data: Vec<T> = fetch(credentials, operation, parameters).await?;
    Ok(List::new(credentials, data))
}

/// Counts arrive as numbers, or as strings such as `"100+"` once capped.
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
        Missing(()),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(text) => text
            .trim_end_matches('+')
            .parse()
            .map_err(|_| de::Error::custom(format!("bad count: {:?}", text))),
        Count::Missing(()) => Ok(0),
    }
}

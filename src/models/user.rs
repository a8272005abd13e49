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

//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{fetch_list, fetch_model, lenient_count, parse_timestamp, List, Model, Status};
use crate::api::{set_optional, Operation, Parameters};
use crate::credentials::SharedCredentials;
use crate::error::{Error, Result};

const SHOW: Operation = Operation::new("GET", "users/show");
const CONTRIBUTORS: Operation = Operation::new("GET", "users/contributors");
const CONTRIBUTEES: Operation = Operation::new("GET", "users/contributees");

/// A user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Numeric identifier
    pub id: u64,

    /// Identifier as a string, safe for JavaScript consumers
    pub id_str: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Handle without the leading `@`
    #[serde(default)]
    pub screen_name: String,

    pub location: Option<String>,

    pub description: Option<String>,

    /// Homepage
    pub url: Option<String>,

    /// Whether statuses are only visible to approved followers
    #[serde(default)]
    pub protected: bool,

    #[serde(default, deserialize_with = "lenient_count")]
    pub followers_count: u64,

    #[serde(default, deserialize_with = "lenient_count")]
    pub friends_count: u64,

    #[serde(default, deserialize_with = "lenient_count")]
    pub statuses_count: u64,

    #[serde(default, deserialize_with = "lenient_count")]
    pub favourites_count: u64,

    #[serde(default, deserialize_with = "lenient_count")]
    pub listed_count: u64,

    /// Raw creation timestamp; see [`User::created_at`]
    #[serde(rename = "created_at")]
    pub created_at_raw: Option<String>,

    pub profile_image_url: Option<String>,

    /// Most recent status, when the endpoint embeds it
    pub status: Option<Box<Status>>,

    /// Fields not mapped above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How to identify a user in a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(u64),
    ScreenName(String),
}

impl UserLookup {
    fn apply(&self, parameters: &mut Parameters) -> Result<()> {
        match self {
            UserLookup::Id(id) => {
                parameters.insert("user_id".into(), id.to_string());
            }
            UserLookup::ScreenName(name) => {
                let name = name.trim().trim_start_matches('@');
                if name.is_empty() {
                    return Err(Error::OperationValue("screen name is empty".into()));
                }
                parameters.insert("screen_name".into(), name.to_string());
            }
        }
        Ok(())
    }
}

impl From<u64> for UserLookup {
    fn from(id: u64) -> Self {
        UserLookup::Id(id)
    }
}

impl From<&str> for UserLookup {
    fn from(name: &str) -> Self {
        UserLookup::ScreenName(name.to_string())
    }
}

impl User {
    /// Parsed creation time
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .created_at_raw
            .as_deref()
            .ok_or_else(|| Error::MalformedResponse("user has no created_at".into()))?;
        parse_timestamp(raw)
    }

    /// Look a user up by id or screen name
    pub async fn show(
        credentials: &SharedCredentials,
        lookup: UserLookup,
        include_entities: Option<bool>,
        skip_status: Option<bool>,
    ) -> Result<Model<User>> {
        let mut parameters = Parameters::new();
        lookup.apply(&mut parameters)?;
        set_optional(&mut parameters, "include_entities", include_entities);
        set_optional(&mut parameters, "skip_status", skip_status);
        fetch_model(credentials, &SHOW, parameters).await
    }
}

impl Model<User> {
    /// Users allowed to post on behalf of this one
    pub async fn contributors(
        &self,
        include_entities: Option<bool>,
        skip_status: Option<bool>,
    ) -> Result<List<User>> {
        self.relation(&CONTRIBUTORS, include_entities, skip_status)
            .await
    }

    /// Users this one may post on behalf of
    pub async fn contributees(
        &self,
        include_entities: Option<bool>,
        skip_status: Option<bool>,
    ) -> Result<List<User>> {
        self.relation(&CONTRIBUTEES, include_entities, skip_status)
            .await
    }

    /// Embedded latest status, bound to the same credentials
    pub fn latest_status(&self) -> Option<Model<Status>> {
        self.status.as_deref().map(|status| self.relate(status.clone()))
    }

    /// Fetch the profile again
    pub async fn reload(&self) -> Result<Model<User>> {
        User::show(self.credentials(), UserLookup::Id(self.id), None, None).await
    }

    async fn relation(
        &self,
        operation: &Operation,
        include_entities: Option<bool>,
        skip_status: Option<bool>,
    ) -> Result<List<User>> {
        let mut parameters = Parameters::new();
        parameters.insert("user_id".into(), self.id.to_string());
        set_optional(&mut parameters, "include_entities", include_entities);
        set_optional(&mut parameters, "skip_status", skip_status);
        fetch_list(self.credentials(), operation, parameters).await
    }
}

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

//! Status model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::{fetch, fetch_list, fetch_model, lenient_count, parse_timestamp, List, Model, User};
use crate::api::{set_optional, Operation, Parameters};
use crate::credentials::SharedCredentials;
use crate::error::{Error, Result};

const SHOW: Operation = Operation::new("GET", "statuses/show/{id}");
const UPDATE: Operation = Operation::new("POST", "statuses/update");
const RETWEET: Operation = Operation::new("POST", "statuses/retweet/{id}");
const DESTROY: Operation = Operation::new("POST", "statuses/destroy/{id}");
const RETWEETS: Operation = Operation::new("GET", "statuses/retweets/{id}");
const RETWEETED_BY: Operation = Operation::new("GET", "statuses/{id}/retweeted_by");
const RETWEETED_BY_IDS: Operation = Operation::new("GET", "statuses/{id}/retweeted_by/ids");

/// A status (tweet)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub id: u64,

    pub id_str: Option<String>,

    #[serde(default)]
    pub text: String,

    /// Raw creation timestamp; see [`Status::created_at`]
    #[serde(rename = "created_at")]
    pub created_at_raw: Option<String>,

    /// Client the status was posted with, as an HTML anchor
    pub source: Option<String>,

    #[serde(default)]
    pub truncated: bool,

    pub in_reply_to_status_id: Option<u64>,

    pub in_reply_to_user_id: Option<u64>,

    pub in_reply_to_screen_name: Option<String>,

    /// Author; absent when requested with `trim_user`
    pub user: Option<Box<User>>,

    #[serde(default, deserialize_with = "lenient_count")]
    pub retweet_count: u64,

    #[serde(default)]
    pub favorited: bool,

    #[serde(default)]
    pub retweeted: bool,

    /// Original status when this one is a retweet
    pub retweeted_status: Option<Box<Status>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameters of a status update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewStatus {
    pub text: String,
    pub in_reply_to_status_id: Option<u64>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub place_id: Option<String>,
    pub display_coordinates: Option<bool>,
    pub trim_user: Option<bool>,
    pub include_entities: Option<bool>,
}

impl NewStatus {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_reply_to(mut self, status_id: u64) -> Self {
        self.in_reply_to_status_id = Some(status_id);
        self
    }

    pub fn at(mut self, lat: f64, long: f64) -> Self {
        self.lat = Some(lat);
        self.long = Some(long);
        self
    }

    fn into_parameters(self) -> Result<Parameters> {
        if self.text.trim().is_empty() {
            return Err(Error::OperationValue("status text is empty".into()));
        }

        let mut parameters = Parameters::new();
        parameters.insert("status".into(), self.text);
        set_optional(&mut parameters, "in_reply_to_status_id", self.in_reply_to_status_id);
        set_optional(&mut parameters, "lat", self.lat);
        set_optional(&mut parameters, "long", self.long);
        set_optional(&mut parameters, "place_id", self.place_id);
        set_optional(&mut parameters, "display_coordinates", self.display_coordinates);
        set_optional(&mut parameters, "trim_user", self.trim_user);
        set_optional(&mut parameters, "include_entities", self.include_entities);
        Ok(parameters)
    }
}

fn by_id(id: u64) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert("id".into(), id.to_string());
    parameters
}

impl Status {
    /// Parsed creation time
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .created_at_raw
            .as_deref()
            .ok_or_else(|| Error::MalformedResponse("status has no created_at".into()))?;
        parse_timestamp(raw)
    }

    pub async fn show(credentials: &SharedCredentials, id: u64) -> Result<Model<Status>> {
        fetch_model(credentials, &SHOW, by_id(id)).await
    }

    /// Post a new status
    pub async fn update(
        credentials: &SharedCredentials,
        status: NewStatus,
    ) -> Result<Model<Status>> {
        let posted: Model<Status> =
            fetch_model(credentials, &UPDATE, status.into_parameters()?).await?;
        info!(id = posted.id, "Status posted");
        Ok(posted)
    }
}

impl Model<Status> {
    /// Author, bound to the same credentials
    pub fn user(&self) -> Option<Model<User>> {
        self.data().user.as_deref().map(|user| self.relate(user.clone()))
    }

    /// Original status of a retweet
    pub fn retweeted_status(&self) -> Option<Model<Status>> {
        self.data()
            .retweeted_status
            .as_deref()
            .map(|status| self.relate(status.clone()))
    }

    /// Fetch the status again
    pub async fn reload(&self) -> Result<Model<Status>> {
        Status::show(self.credentials(), self.id).await
    }

    /// Retweet as the authenticated user; returns the new retweet
    pub async fn retweet(&self) -> Result<Model<Status>> {
        fetch_model(self.credentials(), &RETWEET, by_id(self.id)).await
    }

    /// Delete the status; returns what the server removed
    pub async fn destroy(self) -> Result<Model<Status>> {
        let destroyed: Model<Status> =
            fetch_model(self.credentials(), &DESTROY, by_id(self.id)).await?;
        info!(id = destroyed.id, "Status destroyed");
        Ok(destroyed)
    }

    /// Retweets of this status
    pub async fn retweets(&self, count: Option<u32>) -> Result<List<Status>> {
        let mut parameters = by_id(self.id);
        set_optional(&mut parameters, "count", count);
        fetch_list(self.credentials(), &RETWEETS, parameters).await
    }

    /// Users who retweeted this status
    pub async fn retweeted_by(&self, count: Option<u32>) -> Result<List<User>> {
        let mut parameters = by_id(self.id);
        set_optional(&mut parameters, "count", count);
        fetch_list(self.credentials(), &RETWEETED_BY, parameters).await
    }

    /// Ids of the users who retweeted this status
    pub async fn retweeted_by_ids(&self, count: Option<u32>) -> Result<Vec<u64>> {
        let mut parameters = by_id(self.id);
        set_optional(&mut parameters, "count", count);
        fetch(self.credentials(), &RETWEETED_BY_IDS, parameters).await
    }
}

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

//! The authenticated account

use super::{fetch_model, Model, NewStatus, PublicTimeline, Status, User};
use crate::api::{set_optional, Operation, Parameters};
use crate::credentials::SharedCredentials;
use crate::error::Result;

const VERIFY_CREDENTIALS: Operation = Operation::new("GET", "account/verify_credentials");

/// Entry point for everything done as the authenticated user
#[derive(Debug, Clone)]
pub struct Account {
    credentials: SharedCredentials,
}

impl Account {
    pub fn new(credentials: SharedCredentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &SharedCredentials {
        &self.credentials
    }

    /// Check the credentials and return the user they belong to
    pub async fn verify_credentials(&self) -> Result<Model<User>> {
        self.verify_credentials_with(None, None).await
    }

    pub async fn verify_credentials_with(
        &self,
        include_entities: Option<bool>,
        skip_status: Option<bool>,
    ) -> Result<Model<User>> {
        let mut parameters = Parameters::new();
        set_optional(&mut parameters, "include_entities", include_entities);
        set_optional(&mut parameters, "skip_status", skip_status);
        fetch_model(&self.credentials, &VERIFY_CREDENTIALS, parameters).await
    }

    pub fn public_timeline(&self) -> PublicTimeline {
        PublicTimeline::new(self.credentials.clone())
    }

    pub async fn update_status(&self, status: NewStatus) -> Result<Model<Status>> {
        Status::update(&self.credentials, status).await
    }

    pub async fn show_status(&self, id: u64) -> Result<Model<Status>> {
        Status::show(&self.credentials, id).await
    }
}

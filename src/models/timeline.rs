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

//! Public timeline

use super::{fetch_list, List, Status};
use crate::api::{set_optional, Operation, Parameters};
use crate::credentials::SharedCredentials;
use crate::error::Result;

const PUBLIC_TIMELINE: Operation = Operation::new("GET", "statuses/public_timeline");

/// Most recent public statuses
#[derive(Debug, Clone)]
pub struct PublicTimeline {
    credentials: SharedCredentials,
    /// Replace embedded users with their id only
    pub trim_user: Option<bool>,
    pub include_entities: Option<bool>,
}

impl PublicTimeline {
    pub fn new(credentials: SharedCredentials) -> Self {
        Self {
            credentials,
            trim_user: None,
            include_entities: None,
        }
    }

    pub fn trim_user(mut self, trim_user: bool) -> Self {
        self.trim_user = Some(trim_user);
        self
    }

    pub fn include_entities(mut self, include_entities: bool) -> Self {
        self.include_entities = Some(include_entities);
        self
    }

    /// Fetch the timeline
    pub async fn load(&self) -> Result<List<Status>> {
        let mut parameters = Parameters::new();
        set_optional(&mut parameters, "trim_user", self.trim_user);
        set_optional(&mut parameters, "include_entities", self.include_entities);
        fetch_list(&self.credentials, &PUBLIC_TIMELINE, parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TokenCredentials;
    use crate::testing::CannedTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_load_public_timeline() {
        let transport = CannedTransport::new();
        transport.respond(
            200,
            vec![r#"[{"id":3,"text":"c"},"#, r#"{"id":2,"text":"b"},{"id":1,"text":"a"}]"#],
        );
        let creds: SharedCredentials =
            Arc::new(TokenCredentials::with_api(transport.api(), "ck", "cs", "tk", "ts").unwrap());

        let timeline = PublicTimeline::new(creds).trim_user(true).load().await.unwrap();
        let texts: Vec<&str> = timeline.iter().map(|status| status.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "b", "a"]);

        assert_eq!(
            transport.requests()[0].url(),
            "https://api.twitter.com/1/statuses/public_timeline.json?trim_user=true"
        );
    }
}

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

//! Stream message factories

use serde_json::Value;

use crate::credentials::SharedCredentials;
use crate::error::{Error, Result};
use crate::models::{Model, Status};

/// Turns each decoded stream line into an item.
///
/// Returning `Ok(None)` drops the line.
pub trait MessageFactory: Send + Sync + 'static {
    type Message: Send + 'static;

    fn make(&self, credentials: &SharedCredentials, value: Value) -> Result<Option<Self::Message>>;
}

/// Message recognized by [`DefaultMessageFactory`]
#[derive(Debug, Clone)]
pub enum Message {
    /// New status
    Status(Model<Status>),
    /// A status was deleted and should be removed from display
    Delete { id: u64, user_id: Option<u64> },
    /// Statuses matching the filter that were not delivered
    Limit { track: u64 },
    /// Friend ids, sent first on a user stream
    Friends(Vec<u64>),
    /// Anything else, as received
    Unknown(Value),
}

impl Message {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Status(_) => "status",
            Message::Delete { .. } => "delete",
            Message::Limit { .. } => "limit",
            Message::Friends(_) => "friends",
            Message::Unknown(_) => "unknown",
        }
    }
}

/// Recognizes statuses and the common control messages
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessageFactory;

impl MessageFactory for DefaultMessageFactory {
    type Message = Message;

    fn make(&self, credentials: &SharedCredentials, value: Value) -> Result<Option<Message>> {
        let message = if value.get("text").is_some() {
            let status: Status = serde_json::from_value(value)?;
            Message::Status(Model::new(credentials.clone(), status))
        } else if let Some(delete) = value.get("delete") {
            let status = delete.get("status").unwrap_or(delete);
            let id = status
                .get("id")
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::MalformedResponse("delete message without id".into()))?;
            Message::Delete {
                id,
                user_id: status.get("user_id").and_then(Value::as_u64),
            }
        } else if let Some(limit) = value.get("limit") {
            Message::Limit {
                track: limit.get("track").and_then(Value::as_u64).unwrap_or(0),
            }
        } else if let Some(friends) = value.get("friends") {
            Message::Friends(serde_json::from_value(friends.clone())?)
        } else {
            Message::Unknown(value)
        };
        Ok(Some(message))
    }
}

/// Yields every line as the decoded JSON value
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMessageFactory;

impl MessageFactory for RawMessageFactory {
    type Message = Value;

    fn make(&self, _credentials: &SharedCredentials, value: Value) -> Result<Option<Value>> {
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TokenCredentials;
    use crate::testing::CannedTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn make(value: Value) -> Result<Option<Message>> {
        let creds: SharedCredentials = Arc::new(
            TokenCredentials::with_api(CannedTransport::new().api(), "ck", "cs", "tk", "ts")
                .unwrap(),
        );
        DefaultMessageFactory.make(&creds, value)
    }

    #[test]
    fn test_status_message() {
        match make(json!({"id": 5, "text": "hi"})).unwrap() {
            Some(Message::Status(status)) => {
                assert_eq!(status.id, 5);
                assert_eq!(status.text, "hi");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_control_messages() {
        let delete = make(json!({"delete": {"status": {"id": 9, "user_id": 3}}})).unwrap();
        assert!(matches!(delete, Some(Message::Delete { id: 9, user_id: Some(3) })));

        let limit = make(json!({"limit": {"track": 1234}})).unwrap();
        assert!(matches!(limit, Some(Message::Limit { track: 1234 })));

        match make(json!({"friends": [1, 2]})).unwrap() {
            Some(Message::Friends(ids)) => assert_eq!(ids, vec![1, 2]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_is_unknown() {
        let value = json!({"scrub_geo": {"user_id": 1}});
        match make(value.clone()).unwrap() {
            Some(message @ Message::Unknown(_)) => {
                assert_eq!(message.kind(), "unknown");
                assert!(matches!(message, Message::Unknown(v) if v == value));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(make(json!([1, 2])).unwrap(), Some(Message::Unknown(_))));
    }

    #[test]
    fn test_delete_without_id() {
        assert!(matches!(
            make(json!({"delete": {"status": {}}})),
            Err(Error::MalformedResponse(_))
        ));
    }
}

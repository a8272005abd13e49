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

//! Error types for the Chirp library

use thiserror::Error;

/// Errors produced by requests, credentials, models and streams.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Something unusable was passed to a credentials constructor
    #[error("Invalid credentials: {0}")]
    CredentialsValue(String),

    /// The remote side refused the credentials (HTTP 401)
    #[error("Credentials rejected: {body}")]
    CredentialsRejected { body: String },

    /// The operation descriptor is malformed (bad method, unfilled URL placeholder)
    #[error("Invalid operation: {0}")]
    OperationValue(String),

    /// The operation is not allowed for these credentials (HTTP 403)
    #[error("Operation not permitted: {body}")]
    OperationNotPermitted { body: String },

    /// The operation or the requested resource does not exist (HTTP 404)
    #[error("Operation not found: {body}")]
    OperationNotFound { body: String },

    /// Any other non-success HTTP status
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// A response body could not be decoded
    #[error("Decode error: {0}")]
    Codec(String),

    /// A response decoded fine but lacks required fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::CredentialsRejected { body },
            403 => Self::OperationNotPermitted { body },
            404 => Self::OperationNotFound { body },
            _ => Self::Status { status, body },
        }
    }

    /// The HTTP status behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::CredentialsRejected { .. } => Some(401),
            Self::OperationNotPermitted { .. } => Some(403),
            Self::OperationNotFound { .. } => Some(404),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for Chirp operations.
pub type Result<T> = std::result::Result<T, Error>;

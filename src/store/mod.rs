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

//! Credential store
//!
//! Keeps the application consumer pair and one access token per profile in
//! SQLite, so that the handshake only has to be done once.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, warn};

use crate::api::Api;
use crate::credentials::{ApplicationCredentials, TokenCredentials};
use crate::error::Result;

/// Consumer pair as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredApplication {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl StoredApplication {
    pub fn into_credentials(self, api: Api) -> Result<ApplicationCredentials> {
        ApplicationCredentials::with_api(api, self.consumer_key, self.consumer_secret)
    }
}

/// Access token of one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub profile: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token_key: String,
    pub token_secret: String,
    pub user_id: Option<String>,
    pub screen_name: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn into_credentials(self, api: Api) -> Result<TokenCredentials> {
        Ok(TokenCredentials::with_api(
            api,
            self.consumer_key,
            self.consumer_secret,
            self.token_key,
            self.token_secret,
        )?
        .with_identity(self.user_id, self.screen_name))
    }
}

/// What `list_profiles` shows; secrets stay in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub profile: String,
    pub screen_name: Option<String>,
    pub saved_at: DateTime<Utc>,
}

type TokenRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
);

/// SQLite-backed credential storage
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Open the store at the default location
    pub async fn open() -> Result<Self> {
        Self::open_path(&default_db_path()).await
    }

    /// Open (creating if needed) the store at `path`
    pub async fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening credential store at {}", path.display());
        Self::open_url(&format!("sqlite:{}?mode=rwc", path.display())).await
    }

    /// Open a store from a sqlx connection URL (`sqlite::memory:` in tests)
    pub async fn open_url(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        debug!("Initializing credential store schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS application (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                consumer_key TEXT NOT NULL,
                consumer_secret TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS tokens (
                profile TEXT PRIMARY KEY,
                consumer_key TEXT NOT NULL,
                consumer_secret TEXT NOT NULL,
                token_key TEXT NOT NULL,
                token_secret TEXT NOT NULL,
                user_id TEXT,
                screen_name TEXT,
                saved_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn save_application(&self, application: &ApplicationCredentials) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO application (id, consumer_key, consumer_secret, updated_at)
            VALUES (1, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                consumer_key = excluded.consumer_key,
                consumer_secret = excluded.consumer_secret,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(application.consumer_key())
        .bind(application.consumer_secret())
        .execute(&self.pool)
        .await?;

        info!("Saved application {}", application.consumer_key());
        Ok(())
    }

    pub async fn load_application(&self) -> Result<Option<StoredApplication>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT consumer_key, consumer_secret FROM application WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(consumer_key, consumer_secret)| StoredApplication {
            consumer_key,
            consumer_secret,
        }))
    }

    /// Save or replace the token of a profile
    pub async fn save_token(&self, profile: &str, token: &TokenCredentials) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (profile, consumer_key, consumer_secret, token_key, token_secret, user_id, screen_name, saved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(profile) DO UPDATE SET
                consumer_key = excluded.consumer_key,
                consumer_secret = excluded.consumer_secret,
                token_key = excluded.token_key,
                token_secret = excluded.token_secret,
                user_id = excluded.user_id,
                screen_name = excluded.screen_name,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(profile)
        .bind(token.consumer_key())
        .bind(token.consumer_secret())
        .bind(token.token_key())
        .bind(token.token_secret())
        .bind(token.user_id())
        .bind(token.screen_name())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!(
            "Saved token for profile {} ({})",
            profile,
            token.screen_name().unwrap_or("unknown user")
        );
        Ok(())
    }

    pub async fn load_token(&self, profile: &str) -> Result<Option<StoredToken>> {
        let row: Option<TokenRow> = sqlx::query_as(
            r#"
            SELECT profile, consumer_key, consumer_secret, token_key, token_secret, user_id, screen_name, saved_at
            FROM tokens WHERE profile = ?
            "#,
        )
        .bind(profile)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(profile, consumer_key, consumer_secret, token_key, token_secret, user_id, screen_name, saved_at)| {
                StoredToken {
                    profile,
                    consumer_key,
                    consumer_secret,
                    token_key,
                    token_secret,
                    user_id,
                    screen_name,
                    saved_at: parse_saved_at(&saved_at),
                }
            },
        ))
    }

    /// Stored profiles, most recently saved first
    pub async fn list_profiles(&self) -> Result<Vec<ProfileSummary>> {
        let rows: Vec<(String, Option<String>, String)> = sqlx::query_as(
            "SELECT profile, screen_name, saved_at FROM tokens ORDER BY saved_at DESC, profile",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(profile, screen_name, saved_at)| ProfileSummary {
                profile,
                screen_name,
                saved_at: parse_saved_at(&saved_at),
            })
            .collect())
    }

    /// Forget a profile's token. Returns whether there was one.
    pub async fn remove_token(&self, profile: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE profile = ?")
            .bind(profile)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!("Removed token for profile {}", profile);
        }
        Ok(removed)
    }
}

fn parse_saved_at(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(e) => {
            warn!("Unreadable saved_at {:?}: {}", raw, e);
            DateTime::<Utc>::default()
        }
    }
}

/// `<local data dir>/chirp/credentials.db`
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chirp")
        .join("credentials.db")
}

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

//! Endpoint configuration and CLI settings

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Where and how the API is reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Use https rather than http for relative operation URLs
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,

    /// Host (optionally with port) of the REST API
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Version prefix for relative operation URLs
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Host of the public streams (sample, filter, ...)
    #[serde(default = "default_stream_host")]
    pub stream_host: String,

    /// Host of the user stream
    #[serde(default = "default_user_stream_host")]
    pub user_stream_host: String,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Timeout for single requests; streams are not bounded by it
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
}

fn default_use_ssl() -> bool {
    true
}

fn default_api_host() -> String {
    "api.twitter.com".into()
}

fn default_api_version() -> String {
    "1".into()
}

fn default_stream_host() -> String {
    "stream.twitter.com".into()
}

fn default_user_stream_host() -> String {
    "userstream.twitter.com".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            use_ssl: default_use_ssl(),
            api_host: default_api_host(),
            api_version: default_api_version(),
            stream_host: default_stream_host(),
            user_stream_host: default_user_stream_host(),
            headers: BTreeMap::new(),
            timeout: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Configuration pointing every endpoint at a single plain-http server.
    pub fn local(host: &str) -> Self {
        Self {
            use_ssl: false,
            api_host: host.to_string(),
            stream_host: host.to_string(),
            user_stream_host: host.to_string(),
            ..Default::default()
        }
    }

    /// URL scheme for this configuration
    pub fn scheme(&self) -> &'static str {
        if self.use_ssl {
            "https"
        } else {
            "http"
        }
    }
}

/// Settings used by the `chirp` binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Application consumer key
    #[serde(default)]
    pub consumer_key: Option<String>,

    /// Application consumer secret
    #[serde(default)]
    pub consumer_secret: Option<String>,

    /// Stored token profile used when none is given on the command line
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Path of the credential database (defaults to the local data dir)
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_profile() -> String {
    "default".into()
}

impl Settings {
    /// Load settings from the default config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self {
                profile: default_profile(),
                ..Default::default()
            },
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Override fields from `CHIRP_*` variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("CHIRP_CONSUMER_KEY") {
            self.consumer_key = Some(key);
        }
        if let Some(secret) = lookup("CHIRP_CONSUMER_SECRET") {
            self.consumer_secret = Some(secret);
        }
        if let Some(profile) = lookup("CHIRP_PROFILE") {
            self.profile = profile;
        }
    }

    /// Consumer key and secret, or a config error naming what is missing.
    pub fn consumer(&self) -> Result<(String, String)> {
        match (&self.consumer_key, &self.consumer_secret) {
            (Some(key), Some(secret)) => Ok((key.clone(), secret.clone())),
            _ => Err(Error::Config(
                "consumer key and secret are required (CHIRP_CONSUMER_KEY, CHIRP_CONSUMER_SECRET)"
                    .into(),
            )),
        }
    }
}

/// `<config dir>/chirp/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chirp").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_defaults_fill_missing_fields() {
        let config: ApiConfig = serde_json::from_str(r#"{"api_host": "example.org"}"#).unwrap();
        assert_eq!(config.api_host, "example.org");
        assert_eq!(config.api_version, "1");
        assert!(config.use_ssl);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.scheme(), "https");
    }

    #[test]
    fn test_local_config_uses_plain_http() {
        let config = ApiConfig::local("127.0.0.1:8080");
        assert_eq!(config.scheme(), "http");
        assert_eq!(config.stream_host, "127.0.0.1:8080");
        assert_eq!(config.user_stream_host, "127.0.0.1:8080");
    }

    #[test]
    fn test_env_overrides() {
        let mut settings: Settings = serde_json::from_str(
            r#"{"consumer_key": "file-key", "consumer_secret": "file-secret"}"#,
        )
        .unwrap();
        assert_eq!(settings.profile, "default");

        settings.apply_env(|key| match key {
            "CHIRP_CONSUMER_KEY" => Some("env-key".to_string()),
            "CHIRP_PROFILE" => Some("work".to_string()),
            _ => None,
        });

        assert_eq!(
            settings.consumer().unwrap(),
            ("env-key".to_string(), "file-secret".to_string())
        );
        assert_eq!(settings.profile, "work");
    }

    #[test]
    fn test_missing_consumer_is_config_error() {
        let settings = Settings::default();
        assert!(matches!(settings.consumer(), Err(Error::Config(_))));
    }
}

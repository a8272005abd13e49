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

//! Logging setup for applications built on Chirp
//!
//! The library itself only emits `tracing` events. Binaries call
//! [`Logger::init`] (or [`Logger::init_with_config`]) once at startup to get
//! console output plus a JSON log file with daily rotation.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{Error, Result};

/// Logger configuration
pub struct LoggerConfig {
    /// Log directory path
    pub log_dir: PathBuf,
    /// Log file prefix
    pub file_prefix: String,
    /// Maximum log level
    pub level: Level,
    /// Whether to log to console
    pub console_output: bool,
    /// Whether to log to file
    pub file_output: bool,
    /// Log rotation strategy
    pub rotation: Rotation,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let log_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chirp")
            .join("logs");

        Self {
            log_dir,
            file_prefix: "chirp".to_string(),
            level: Level::INFO,
            console_output: true,
            file_output: true,
            rotation: Rotation::DAILY,
        }
    }
}

/// Main logger struct
pub struct Logger;

impl Logger {
    /// Initialize the logging system with default configuration
    pub fn init() -> Result<()> {
        Self::init_with_config(LoggerConfig::default())
    }

    /// Initialize the logging system with custom configuration
    pub fn init_with_config(config: LoggerConfig) -> Result<()> {
        if config.file_output {
            std::fs::create_dir_all(&config.log_dir)?;
        }

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => default_filter(config.level)?,
        };

        let subscriber = tracing_subscriber::registry().with(env_filter);

        let file_layer = config.file_output.then(|| {
            let file_appender =
                RollingFileAppender::new(config.rotation.clone(), &config.log_dir, &config.file_prefix);
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .json()
        });

        let console_layer = config.console_output.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_span_events(FmtSpan::CLOSE)
        });

        subscriber
            .with(file_layer)
            .with(console_layer)
            .try_init()
            .map_err(|e| Error::Config(format!("logger already initialized: {}", e)))
    }
}

/// Library and binary at `level`, request/stream targets included.
fn default_filter(level: Level) -> Result<EnvFilter> {
    let mut filter = EnvFilter::new(format!("chirp_core={}", level));
    for target in ["chirp", "api", "streaming"] {
        let directive = format!("{}={}", target, level)
            .parse()
            .map_err(|e| Error::Config(format!("bad log directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Macro for logging API calls with timing
#[macro_export]
macro_rules! log_api_call {
    ($method:expr, $url:expr) => {
        tracing::debug!(
            target: "api",
            method = $method,
            url = $url,
            "API call started"
        )
    };
    ($method:expr, $url:expr, $duration:expr) => {
        tracing::info!(
            target: "api",
            method = $method,
            url = $url,
            duration_ms = $duration,
            "API call completed"
        )
    };
}

/// Macro for logging streaming events
#[macro_export]
macro_rules! log_stream {
    (connected, $endpoint:expr) => {
        tracing::info!(
            target: "streaming",
            event = "connected",
            endpoint = $endpoint,
            "Stream connected"
        )
    };
    (disconnected, $endpoint:expr, $reason:expr) => {
        tracing::warn!(
            target: "streaming",
            event = "disconnected",
            endpoint = $endpoint,
            reason = $reason,
            "Stream disconnected"
        )
    };
    (message, $endpoint:expr, $msg_type:expr) => {
        tracing::trace!(
            target: "streaming",
            event = "message",
            endpoint = $endpoint,
            message_type = $msg_type,
            "Stream message received"
        )
    };
}

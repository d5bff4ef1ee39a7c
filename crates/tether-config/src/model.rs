// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tether plugin transport.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Tether configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Listener and discovery settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Event bridge and broker settings.
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging and request dump settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Listener and discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// TCP bind address, optionally followed by the address to advertise.
    /// Empty selects local (Unix socket) mode.
    #[serde(default)]
    pub listen: Vec<String>,

    /// Discovery marker path. In local mode this is the socket itself; in
    /// remote mode a file receiving `tcp://<advertise>`.
    #[serde(default = "default_discovery_path")]
    pub discovery_path: String,

    /// Grace period for in-flight requests during shutdown.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: Vec::new(),
            discovery_path: default_discovery_path(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Returns true when the server should bind TCP rather than a Unix socket.
    pub fn is_remote(&self) -> bool {
        !self.listen.is_empty()
    }

    /// Drain deadline as a `Duration`.
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

fn default_discovery_path() -> String {
    dirs::home_dir()
        .map(|d| d.join(".tether/plugins/tether.sock"))
        .unwrap_or_else(|| std::path::PathBuf::from("tether.sock"))
        .display()
        .to_string()
}

fn default_drain_timeout_secs() -> u64 {
    10
}

/// Event bridge and broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Upper bound for delivering one event to all matching subscribers.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Capacity of each publisher's event channel.
    #[serde(default = "default_capacity")]
    pub queue_capacity: usize,

    /// Capacity of each subscriber's delivery queue.
    #[serde(default = "default_capacity")]
    pub subscriber_buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            publish_timeout_ms: default_publish_timeout_ms(),
            queue_capacity: default_capacity(),
            subscriber_buffer: default_capacity(),
        }
    }
}

impl EventsConfig {
    /// Publish deadline as a `Duration`.
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

fn default_publish_timeout_ms() -> u64 {
    1000
}

fn default_capacity() -> usize {
    64
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Dump dispatch requests and responses at debug level.
    #[serde(default = "default_dump_requests")]
    pub dump_requests: bool,

    /// Longest body rendered into a dump; the response itself is never cut.
    #[serde(default = "default_max_dump_bytes")]
    pub max_dump_bytes: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dump_requests: default_dump_requests(),
            max_dump_bytes: default_max_dump_bytes(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_dump_requests() -> bool {
    true
}

fn default_max_dump_bytes() -> usize {
    64 * 1024
}

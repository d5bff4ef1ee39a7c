// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as address shapes, non-empty paths, and strictly positive timeouts.

use crate::diagnostic::ConfigError;
use crate::model::TetherConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TetherConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.discovery_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "server.discovery_path must not be empty",
        ));
    }

    if config.server.listen.len() > 2 {
        errors.push(ConfigError::validation(format!(
            "server.listen takes a bind address and an optional advertise address, got {} entries",
            config.server.listen.len()
        )));
    }

    for (i, addr) in config.server.listen.iter().enumerate() {
        if !is_host_port(addr) {
            errors.push(ConfigError::validation(format!(
                "server.listen[{i}] `{addr}` is not a host:port address"
            )));
        }
    }

    if config.server.drain_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "server.drain_timeout_secs must be greater than 0",
        ));
    }

    if config.events.publish_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "events.publish_timeout_ms must be greater than 0",
        ));
    }

    if config.events.queue_capacity == 0 {
        errors.push(ConfigError::validation(
            "events.queue_capacity must be greater than 0",
        ));
    }

    if config.events.subscriber_buffer == 0 {
        errors.push(ConfigError::validation(
            "events.subscriber_buffer must be greater than 0",
        ));
    }

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level `{}` must be one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accepts `host:port`, `:port`, and bracketed IPv6 (`[::1]:port`).
fn is_host_port(addr: &str) -> bool {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return false;
    };
    if port.parse::<u16>().is_err() {
        return false;
    }
    if let Some(inner) = host.strip_prefix('[') {
        return inner
            .strip_suffix(']')
            .is_some_and(|ip| ip.parse::<std::net::Ipv6Addr>().is_ok());
    }
    host.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tether plugin transport.

use thiserror::Error;

/// The primary error type for server bootstrap, subscription, and broker operations.
#[derive(Debug, Error)]
pub enum TetherError {
    /// A backing object's method set cannot be exposed (empty, malformed, or
    /// colliding with another object's methods).
    #[error("registration error: {message}")]
    Registration { message: String },

    /// The listener could not be bound (address or path in use, unwritable).
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The discovery marker could not be written.
    #[error("failed to write discovery marker {path}: {source}")]
    MarkerWrite {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No validator admitted the requested topic.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// The broker no longer accepts subscriptions.
    #[error("event broker is stopped")]
    BrokerStopped,

    /// Invalid startup parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TetherError {
    /// Shorthand for a [`TetherError::Registration`] with the given message.
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }
}

/// Failure of a single method invocation on a backing object.
///
/// These stay scoped to one request; the dispatch layer maps them onto
/// response envelopes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The service has no method with this name.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Parameters could not be decoded into what the method expects.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The method ran and failed.
    #[error("{message}")]
    Failed {
        message: String,
        data: Option<serde_json::Value>,
    },
}

impl CallError {
    /// Shorthand for a [`CallError::Failed`] without attached data.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            data: None,
        }
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidParams(err.to_string())
    }
}

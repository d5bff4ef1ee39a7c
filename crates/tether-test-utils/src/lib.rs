// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tether integration tests.
//!
//! # Components
//!
//! - [`MockPlugin`] - backing object implementing every capability trait
//! - [`UnixHttpClient`] - HTTP and SSE client for local-mode servers

pub mod mock_plugin;
pub mod unix_client;

pub use mock_plugin::MockPlugin;
pub use unix_client::{EventStream, HttpResponse, SseFrame, UnixHttpClient};

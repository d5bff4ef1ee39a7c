// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named method sets callable through the dispatch endpoint.

use async_trait::async_trait;

use crate::error::CallError;

/// A named set of methods invocable as `Service.Method`.
///
/// The method list is read once at registration; `call` is only ever invoked
/// with one of the names it returned.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Service namespace, the part before the `.` in a method name.
    fn name(&self) -> &str;

    /// Bare method names this service exposes.
    fn methods(&self) -> Vec<String>;

    /// Invoke `method` with JSON parameters.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CallError>;
}

// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template function export.

use crate::types::FunctionSpec;

/// Lists the template functions a plugin makes available to clients.
pub trait FunctionExporter: Send + Sync + 'static {
    /// Exported functions.
    fn functions(&self) -> Vec<FunctionSpec>;
}

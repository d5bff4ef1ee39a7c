// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits implemented by backing objects.
//!
//! Every backing object is a [`Service`] with a [`VersionedInterface`].
//! Event publishing, subscription validation, and function export are
//! optional capabilities declared explicitly when the object is registered.

pub mod events;
pub mod functions;
pub mod interface;
pub mod service;

pub use events::{EventSink, Publisher, Validator};
pub use functions::FunctionExporter;
pub use interface::VersionedInterface;
pub use service::Service;

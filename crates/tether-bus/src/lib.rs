// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory event broker for the Tether plugin transport.
//!
//! The bus is best-effort and scoped to one server's lifetime: topics are
//! hierarchical, subscribers receive events for their topic and every
//! descendant, and a subscriber that falls behind misses events rather than
//! slowing down publishers.

pub mod broker;
pub mod subscription;

pub use broker::{Broker, DEFAULT_SUBSCRIBER_BUFFER};
pub use subscription::{Delivery, Subscription};

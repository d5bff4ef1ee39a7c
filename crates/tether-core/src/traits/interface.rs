// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interface identity of a backing object.

use crate::traits::service::Service;
use crate::types::InterfaceSpec;

/// Identifies which interface a backing object implements.
pub trait VersionedInterface: Service {
    /// The interface being provided.
    fn implemented_interface(&self) -> InterfaceSpec;

    /// The type variants of this interface, in declaration order.
    fn types(&self) -> Vec<String>;
}

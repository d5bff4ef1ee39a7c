// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tether plugin transport.
//!
//! This crate provides the error taxonomy, the value types exchanged between
//! plugins and clients, and the traits a backing object implements to be
//! served by `tether-server`.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CallError, TetherError};
pub use types::{Event, FunctionSpec, InterfaceSpec, Topic};

pub use traits::{
    EventSink, FunctionExporter, Publisher, Service, Validator, VersionedInterface,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tether_error_has_all_variants() {
        let _registration = TetherError::registration("test");
        let _bind = TetherError::Bind {
            address: "127.0.0.1:0".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _marker = TetherError::MarkerWrite {
            path: "/tmp/marker".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _topic = TetherError::InvalidTopic("a/b".into());
        let _stopped = TetherError::BrokerStopped;
        let _config = TetherError::Config("test".into());
        let _timeout = TetherError::Timeout {
            duration: std::time::Duration::from_secs(1),
        };
        let _internal = TetherError::Internal("test".into());
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_service<T: Service>() {}
        fn _assert_versioned<T: VersionedInterface>() {}
        fn _assert_publisher<T: Publisher>() {}
        fn _assert_validator<T: Validator>() {}
        fn _assert_exporter<T: FunctionExporter>() {}
    }
}

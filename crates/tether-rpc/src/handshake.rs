// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Version handshake service.
//!
//! Every server exposes `Handshake.Implements` and `Handshake.Interfaces` so
//! clients can check API compatibility before making other calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use tether_core::{CallError, InterfaceSpec, Service};

/// Service name the handshake is registered under.
pub const HANDSHAKE_SERVICE: &str = "Handshake";

/// Interfaces a server implements, with the object types each one serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InterfaceMap(BTreeMap<InterfaceSpec, Vec<String>>);

impl InterfaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `spec`; a spec seen before keeps the latest types.
    pub fn insert(&mut self, spec: InterfaceSpec, types: Vec<String>) {
        if let Some(previous) = self.0.insert(spec.clone(), types) {
            warn!(
                interface = %spec,
                ?previous,
                "interface registered twice, keeping latest types"
            );
        }
    }

    pub fn get(&self, spec: &InterfaceSpec) -> Option<&[String]> {
        self.0.get(spec).map(Vec::as_slice)
    }

    /// Implemented specs in sorted order.
    pub fn specs(&self) -> Vec<InterfaceSpec> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Answers the handshake methods from a fixed [`InterfaceMap`].
#[derive(Debug, Clone)]
pub struct Handshake {
    interfaces: Arc<InterfaceMap>,
}

impl Handshake {
    pub fn new(interfaces: Arc<InterfaceMap>) -> Self {
        Self { interfaces }
    }

    pub fn interfaces(&self) -> &InterfaceMap {
        &self.interfaces
    }
}

#[async_trait]
impl Service for Handshake {
    fn name(&self) -> &str {
        HANDSHAKE_SERVICE
    }

    fn methods(&self) -> Vec<String> {
        vec!["Implements".to_string(), "Interfaces".to_string()]
    }

    async fn call(&self, method: &str, _params: Value) -> Result<Value, CallError> {
        match method {
            "Implements" => Ok(serde_json::to_value(&*self.interfaces)?),
            "Interfaces" => Ok(serde_json::to_value(self.interfaces.specs())?),
            other => Err(CallError::MethodNotFound(format!(
                "{HANDSHAKE_SERVICE}.{other}"
            ))),
        }
    }
}

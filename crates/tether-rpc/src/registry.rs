// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name-keyed register of RPC services.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use tether_core::{CallError, Service, TetherError};

use crate::handshake::HANDSHAKE_SERVICE;

/// Maps fully qualified `Service.Method` names to the service answering them.
#[derive(Default)]
pub struct ServiceRegistry {
    methods: BTreeMap<String, Arc<dyn Service>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every method `service` exposes.
    ///
    /// Nothing is registered when any method is rejected.
    pub fn register(&mut self, service: Arc<dyn Service>) -> Result<(), TetherError> {
        let name = service.name();
        if name.is_empty() || name.contains('.') {
            return Err(TetherError::registration(format!(
                "invalid service name `{name}`"
            )));
        }
        if name == HANDSHAKE_SERVICE {
            return Err(TetherError::registration(format!(
                "service name `{name}` is reserved"
            )));
        }

        let methods = service.methods();
        if methods.is_empty() {
            return Err(TetherError::registration(format!(
                "service `{name}` exposes no methods"
            )));
        }

        let mut qualified = Vec::with_capacity(methods.len());
        for method in &methods {
            if method.is_empty() || method.contains('.') {
                return Err(TetherError::registration(format!(
                    "service `{name}` has invalid method name `{method}`"
                )));
            }
            let full = format!("{name}.{method}");
            if self.methods.contains_key(&full) || qualified.contains(&full) {
                return Err(TetherError::registration(format!(
                    "method `{full}` is already registered"
                )));
            }
            qualified.push(full);
        }

        debug!(service = name, methods = qualified.len(), "service registered");
        for full in qualified {
            self.methods.insert(full, Arc::clone(&service));
        }
        Ok(())
    }

    /// Fully qualified names of all registered methods, sorted.
    pub fn method_names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Returns true if `method` (as `Service.Method`) is registered.
    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Invoke a registered method.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, CallError> {
        let service = self
            .methods
            .get(method)
            .ok_or_else(|| CallError::MethodNotFound(method.to_string()))?;
        let (_, local) = method
            .split_once('.')
            .ok_or_else(|| CallError::MethodNotFound(method.to_string()))?;
        service.call(local, params).await
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

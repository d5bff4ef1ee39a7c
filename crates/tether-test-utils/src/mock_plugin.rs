// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock backing object for deterministic testing.
//!
//! `MockPlugin` implements every backing-object trait. Tests declare which
//! capabilities the server sees through the `Plugin` builder.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use tether_core::{
    CallError, Event, EventSink, FunctionExporter, FunctionSpec, InterfaceSpec, Publisher,
    Service, TetherError, Topic, Validator, VersionedInterface,
};

/// A configurable backing object.
///
/// Exposes two methods: `Echo` returns its params, `Fail` always fails.
pub struct MockPlugin {
    name: String,
    interface: InterfaceSpec,
    types: Vec<String>,
    allowed_topics: Vec<Topic>,
    functions: Vec<FunctionSpec>,
    sink: Mutex<Option<EventSink>>,
}

impl MockPlugin {
    /// Create a mock serving `interface` under service `name`.
    pub fn new(name: &str, interface: InterfaceSpec, types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            interface,
            types: types.iter().map(|t| t.to_string()).collect(),
            allowed_topics: Vec::new(),
            functions: Vec::new(),
            sink: Mutex::new(None),
        }
    }

    /// Accept subscriptions to exactly these topics.
    pub fn with_allowed_topics(mut self, topics: &[&str]) -> Self {
        self.allowed_topics = topics.iter().map(|t| Topic::new(t)).collect();
        self
    }

    /// Export these template functions.
    pub fn with_functions(mut self, functions: Vec<FunctionSpec>) -> Self {
        self.functions = functions;
        self
    }

    fn sink(&self) -> MutexGuard<'_, Option<EventSink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true once the server has handed over an event sink.
    pub fn has_sink(&self) -> bool {
        self.sink().is_some()
    }

    /// Emit an event on the sink received from the server.
    pub async fn emit(&self, event: Event) -> Result<(), TetherError> {
        let sink = self
            .sink()
            .clone()
            .ok_or_else(|| TetherError::Internal(format!("{} has no event sink", self.name)))?;
        sink.send(event).await
    }

    /// Drop the sink, closing this plugin's event channel.
    pub fn close_events(&self) {
        self.sink().take();
    }
}

#[async_trait]
impl Service for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn methods(&self) -> Vec<String> {
        vec!["Echo".to_string(), "Fail".to_string()]
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, CallError> {
        match method {
            "Echo" => Ok(params),
            "Fail" => Err(CallError::failed(format!("{} failed on purpose", self.name))),
            other => Err(CallError::MethodNotFound(format!("{}.{other}", self.name))),
        }
    }
}

impl VersionedInterface for MockPlugin {
    fn implemented_interface(&self) -> InterfaceSpec {
        self.interface.clone()
    }

    fn types(&self) -> Vec<String> {
        self.types.clone()
    }
}

impl Publisher for MockPlugin {
    fn publish_on(&self, sink: EventSink) {
        *self.sink() = Some(sink);
    }
}

impl Validator for MockPlugin {
    fn validate(&self, topic: &Topic) -> Result<(), TetherError> {
        if self.allowed_topics.contains(topic) {
            Ok(())
        } else {
            Err(TetherError::InvalidTopic(topic.to_string()))
        }
    }
}

impl FunctionExporter for MockPlugin {
    fn functions(&self) -> Vec<FunctionSpec> {
        self.functions.clone()
    }
}

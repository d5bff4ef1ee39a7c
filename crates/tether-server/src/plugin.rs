// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registration records and the registration pass.

use std::sync::Arc;

use tracing::{debug, info};

use tether_core::{
    FunctionExporter, FunctionSpec, Publisher, Service, TetherError, Validator,
    VersionedInterface,
};
use tether_rpc::{Dispatcher, InterfaceMap, ServiceRegistry};

use crate::info::{ApiDescription, InterfaceEntry};

/// A backing object plus the capabilities it declares.
///
/// ```ignore
/// let plugin = Plugin::new(Arc::clone(&obj))
///     .publisher(obj.clone())
///     .validator(obj);
/// ```
pub struct Plugin {
    service: Arc<dyn Service>,
    interface: Arc<dyn VersionedInterface>,
    publisher: Option<Arc<dyn Publisher>>,
    validator: Option<Arc<dyn Validator>>,
    functions: Option<Arc<dyn FunctionExporter>>,
}

impl Plugin {
    pub fn new<T: VersionedInterface>(object: Arc<T>) -> Self {
        let service: Arc<dyn Service> = object.clone();
        Self {
            service,
            interface: object,
            publisher: None,
            validator: None,
            functions: None,
        }
    }

    /// Declare that this plugin emits events.
    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Declare that this plugin judges topic subscriptions.
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Declare the template functions this plugin exports.
    pub fn functions(mut self, exporter: Arc<dyn FunctionExporter>) -> Self {
        self.functions = Some(exporter);
        self
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("service", &self.service.name())
            .field("interface", &self.interface.implemented_interface().to_string())
            .field("publisher", &self.publisher.is_some())
            .field("validator", &self.validator.is_some())
            .field("functions", &self.functions.is_some())
            .finish()
    }
}

/// A publisher together with the service name used in its logs.
pub(crate) struct NamedPublisher {
    pub(crate) name: String,
    pub(crate) publisher: Arc<dyn Publisher>,
}

/// Everything derived from the plugin list, fixed for the server's lifetime.
pub(crate) struct Registration {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) publishers: Vec<NamedPublisher>,
    pub(crate) validators: Vec<Arc<dyn Validator>>,
    pub(crate) functions: Vec<FunctionSpec>,
    pub(crate) api: ApiDescription,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("dispatcher", &self.dispatcher)
            .field("functions", &self.functions)
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Register `primary` then `more`, in order.
pub(crate) fn register(primary: Plugin, more: Vec<Plugin>) -> Result<Registration, TetherError> {
    let primary_name = primary.service_name().to_string();
    let functions = primary
        .functions
        .as_ref()
        .map(|exporter| exporter.functions())
        .unwrap_or_default();

    let mut services = ServiceRegistry::new();
    let mut interfaces = InterfaceMap::new();
    let mut entries: Vec<InterfaceEntry> = Vec::new();
    let mut publishers = Vec::new();
    let mut validators = Vec::new();

    for plugin in std::iter::once(primary).chain(more) {
        services.register(Arc::clone(&plugin.service))?;

        let spec = plugin.interface.implemented_interface();
        let types = plugin.interface.types();
        let name = plugin.service.name().to_string();
        debug!(service = %name, interface = %spec, ?types, "plugin registered");

        let entry = InterfaceEntry {
            interface: spec.clone(),
            types: types.clone(),
            methods: plugin
                .service
                .methods()
                .into_iter()
                .map(|m| format!("{name}.{m}"))
                .collect(),
        };
        match entries.iter_mut().find(|e| e.interface == spec) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        interfaces.insert(spec, types);

        if let Some(publisher) = plugin.publisher {
            publishers.push(NamedPublisher {
                name: name.clone(),
                publisher,
            });
        }
        if let Some(validator) = plugin.validator {
            validators.push(validator);
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(services, Arc::new(interfaces)));
    let api = ApiDescription {
        name: primary_name,
        implements: dispatcher.interfaces().specs(),
        interfaces: entries,
        handshake: dispatcher
            .method_names()
            .into_iter()
            .filter(|m| m.starts_with("Handshake."))
            .collect(),
    };

    info!(
        interfaces = api.implements.len(),
        publishers = publishers.len(),
        validators = validators.len(),
        "plugin registration complete"
    );

    Ok(Registration {
        dispatcher,
        publishers,
        validators,
        functions,
        api,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_core::InterfaceSpec;
    use tether_test_utils::MockPlugin;

    #[test]
    fn disjoint_plugins_register() {
        let a = Arc::new(MockPlugin::new("A", InterfaceSpec::new("X", "1.0"), &["a", "b"]));
        let b = Arc::new(MockPlugin::new("B", InterfaceSpec::new("Y", "1.0"), &["c"]));

        let reg = register(Plugin::new(a), vec![Plugin::new(b.clone()).publisher(b)]).unwrap();
        assert_eq!(
            serde_json::to_value(reg.dispatcher.interfaces()).unwrap(),
            json!({"X/1.0": ["a", "b"], "Y/1.0": ["c"]})
        );
        assert_eq!(reg.publishers.len(), 1);
        assert_eq!(reg.publishers[0].name, "B");
        assert!(reg.validators.is_empty());
        assert_eq!(reg.api.name, "A");
        assert_eq!(
            reg.api.handshake,
            vec!["Handshake.Implements", "Handshake.Interfaces"]
        );
    }

    #[test]
    fn colliding_methods_fail() {
        let a = Arc::new(MockPlugin::new("A", InterfaceSpec::new("X", "1.0"), &[]));
        let again = Arc::new(MockPlugin::new("A", InterfaceSpec::new("Z", "1.0"), &[]));

        let err = register(Plugin::new(a), vec![Plugin::new(again)]).unwrap_err();
        assert!(matches!(err, TetherError::Registration { .. }));
    }

    #[test]
    fn duplicate_interface_keeps_later_types() {
        let a = Arc::new(MockPlugin::new("A", InterfaceSpec::new("X", "1.0"), &["old"]));
        let b = Arc::new(MockPlugin::new("B", InterfaceSpec::new("X", "1.0"), &["new"]));

        let reg = register(Plugin::new(a), vec![Plugin::new(b)]).unwrap();
        assert_eq!(
            reg.dispatcher.interfaces().get(&InterfaceSpec::new("X", "1.0")),
            Some(&["new".to_string()][..])
        );
        assert_eq!(reg.api.interfaces.len(), 1);
        assert_eq!(reg.api.interfaces[0].methods, vec!["B.Echo", "B.Fail"]);
    }

    #[test]
    fn functions_come_from_primary() {
        let a = Arc::new(
            MockPlugin::new("A", InterfaceSpec::new("X", "1.0"), &[])
                .with_functions(vec![FunctionSpec {
                    name: "join".into(),
                    description: "joins strings".into(),
                    usage: "{{ join \",\" .list }}".into(),
                }]),
        );
        let reg = register(Plugin::new(a.clone()).functions(a), vec![]).unwrap();
        assert_eq!(reg.functions.len(), 1);
        assert_eq!(reg.functions[0].name, "join");
    }
}

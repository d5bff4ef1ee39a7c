// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin server bootstrap for Tether.
//!
//! [`start`] registers a set of [`Plugin`]s, binds a TCP or Unix listener,
//! writes the discovery marker, and serves:
//!
//! | route | purpose |
//! |---|---|
//! | `POST /` | JSON-RPC dispatch, including the `Handshake` service |
//! | `GET /events/{topic}` | Server-Sent Events for admitted topics |
//! | `GET /info/api.json` | registered interfaces and methods |
//! | `GET /info/functions.json` | template functions of the primary plugin |
//!
//! The returned [`Stoppable`] stops the server and reports when cleanup is done.

mod bridge;
mod drain;
pub mod dump;
pub mod gate;
pub mod info;
pub mod lifecycle;
pub mod plugin;
pub mod transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn_with_state;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tether_bus::{Broker, DEFAULT_SUBSCRIBER_BUFFER};
use tether_config::TetherConfig;
use tether_core::TetherError;

use crate::bridge::EventBridge;
use crate::drain::{InFlight, bound_in_flight};
use crate::gate::{EventsState, events_router};
use crate::info::{InfoState, info_router};
use crate::plugin::Registration;
use crate::transport::{Supervised, spawn_supervisor};

pub use dump::{DumpConfig, dump_exchange};
pub use gate::SubscriptionGate;
pub use info::{ApiDescription, InterfaceEntry};
pub use lifecycle::{Endpoint, LifecycleState, Stoppable};
pub use plugin::Plugin;
pub use transport::Binding;

/// Tunables for a server instance.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// How long in-flight requests may run after stop begins.
    pub drain_timeout: Duration,
    /// Deadline for delivering one event to all subscribers.
    pub publish_timeout: Duration,
    /// Capacity of each publisher's event channel.
    pub queue_capacity: usize,
    /// Capacity of each subscriber's queue.
    pub subscriber_buffer: usize,
    pub dump: DumpConfig,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(1),
            queue_capacity: 64,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            dump: DumpConfig::default(),
        }
    }
}

impl From<&TetherConfig> for ServerOptions {
    fn from(config: &TetherConfig) -> Self {
        Self {
            drain_timeout: config.server.drain_timeout(),
            publish_timeout: config.events.publish_timeout(),
            queue_capacity: config.events.queue_capacity,
            subscriber_buffer: config.events.subscriber_buffer,
            dump: DumpConfig::from(&config.log),
        }
    }
}

fn build_router(
    registration: Registration,
    broker: &Broker,
    shutdown: CancellationToken,
    in_flight: InFlight,
    dump: DumpConfig,
) -> (Router, Vec<plugin::NamedPublisher>) {
    let Registration {
        dispatcher,
        publishers,
        validators,
        functions,
        api,
    } = registration;

    let rpc =
        tether_rpc::rpc_router(dispatcher).route_layer(from_fn_with_state(dump, dump_exchange));
    let events = events_router(EventsState {
        gate: SubscriptionGate::new(validators),
        broker: broker.clone(),
        shutdown,
    });
    let info = info_router(InfoState {
        api: Arc::new(api),
        functions: functions.into(),
    });

    let router = Router::new()
        .merge(rpc)
        .merge(events)
        .merge(info)
        .layer(from_fn_with_state(in_flight, bound_in_flight));
    (router, publishers)
}

/// Start a server for `primary` and `more`.
///
/// Registration, bind, and marker write all happen before this returns;
/// any failure leaves no listener and no background task behind.
pub async fn start(
    binding: Binding,
    options: ServerOptions,
    primary: Plugin,
    more: Vec<Plugin>,
) -> Result<Stoppable, TetherError> {
    let registration = plugin::register(primary, more)?;
    let bound = transport::bind(&binding).await?;

    let handle = Stoppable::new(bound.endpoint.clone());
    let broker = Broker::with_buffer(options.subscriber_buffer);
    let in_flight = InFlight::new();
    let (router, publishers) = build_router(
        registration,
        &broker,
        handle.shutdown_token(),
        in_flight.clone(),
        options.dump,
    );
    let bridge = EventBridge::start(
        publishers,
        &broker,
        options.queue_capacity,
        options.publish_timeout,
    );

    spawn_supervisor(
        Supervised {
            bound,
            router,
            bridge,
            broker,
            in_flight,
            drain_timeout: options.drain_timeout,
        },
        handle.clone(),
    );
    Ok(handle)
}

/// Start on TCP `listen[0]`, advertising `listen[1]` (or `listen[0]`) in a
/// marker file at `discovery_path`.
pub async fn start_remote(
    listen: &[String],
    discovery_path: impl AsRef<Path>,
    primary: Plugin,
    more: Vec<Plugin>,
) -> Result<Stoppable, TetherError> {
    let binding = Binding::Remote {
        listen: listen.to_vec(),
        discovery_path: discovery_path.as_ref().to_path_buf(),
    };
    start(binding, ServerOptions::default(), primary, more).await
}

/// Start on a Unix socket at `socket_path`.
pub async fn start_local(
    socket_path: impl AsRef<Path>,
    primary: Plugin,
    more: Vec<Plugin>,
) -> Result<Stoppable, TetherError> {
    let binding = Binding::Local {
        socket_path: socket_path.as_ref().to_path_buf(),
    };
    start(binding, ServerOptions::default(), primary, more).await
}

/// Start using the listener and tunables from `config`.
///
/// Remote mode when `server.listen` is non-empty, otherwise a Unix socket at
/// `server.discovery_path`.
pub async fn start_from_config(
    config: &TetherConfig,
    primary: Plugin,
    more: Vec<Plugin>,
) -> Result<Stoppable, TetherError> {
    let binding = if config.server.is_remote() {
        Binding::Remote {
            listen: config.server.listen.clone(),
            discovery_path: config.server.discovery_path.clone().into(),
        }
    } else {
        Binding::Local {
            socket_path: config.server.discovery_path.clone().into(),
        }
    };
    info!(remote = config.server.is_remote(), "starting from configuration");
    start(binding, ServerOptions::from(config), primary, more).await
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise Tether crates log at `level` and
/// everything else at warn. Does nothing if a subscriber is already set.
pub fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tether={level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

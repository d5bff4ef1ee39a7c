// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listener binding, discovery marker ownership, and the serve supervisor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use tokio::net::{TcpListener, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tether_bus::Broker;
use tether_core::TetherError;

use crate::bridge::EventBridge;
use crate::drain::InFlight;
use crate::lifecycle::{Endpoint, Stoppable};

/// How a server is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// TCP on `listen[0]`, advertising `listen[1]` (or `listen[0]`) through a
    /// marker file at `discovery_path`.
    Remote {
        listen: Vec<String>,
        discovery_path: PathBuf,
    },
    /// Unix socket at `socket_path`; the socket file is the marker.
    Local { socket_path: PathBuf },
}

pub(crate) enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

/// A live listener and the marker that advertises it.
pub(crate) struct Bound {
    pub(crate) listener: Listener,
    pub(crate) endpoint: Endpoint,
    pub(crate) marker: PathBuf,
}

fn bind_error(address: impl Into<String>, source: std::io::Error) -> TetherError {
    TetherError::Bind {
        address: address.into(),
        source: Box::new(source),
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(parent).await
        }
        _ => Ok(()),
    }
}

/// A listen address with an empty host (`:port`) binds every interface.
fn bind_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    }
}

/// Address written to the marker: the second listen entry if given, else the
/// first, with a requested port 0 replaced by the port actually bound.
fn advertised(listen: &[String], bound: std::net::SocketAddr) -> String {
    if let Some(explicit) = listen.get(1) {
        return explicit.clone();
    }
    match listen.first().map(|first| bind_address(first)) {
        Some(first) if first.rsplit_once(':').is_some_and(|(_, port)| port == "0") => {
            bound.to_string()
        }
        Some(first) => first,
        None => bound.to_string(),
    }
}

/// Bind the listener, then write the discovery marker.
pub(crate) async fn bind(binding: &Binding) -> Result<Bound, TetherError> {
    match binding {
        Binding::Remote {
            listen,
            discovery_path,
        } => {
            let Some(address) = listen.first() else {
                return Err(TetherError::Config(
                    "remote mode requires at least one listen address".to_string(),
                ));
            };
            let listener = TcpListener::bind(bind_address(address))
                .await
                .map_err(|e| bind_error(address.clone(), e))?;
            let local_addr = listener
                .local_addr()
                .map_err(|e| bind_error(address.clone(), e))?;
            let advertise = advertised(listen, local_addr);

            let contents = format!("tcp://{advertise}");
            let written = async {
                ensure_parent(discovery_path).await?;
                tokio::fs::write(discovery_path, &contents).await
            }
            .await;
            if let Err(e) = written {
                drop(listener);
                return Err(TetherError::MarkerWrite {
                    path: discovery_path.display().to_string(),
                    source: Box::new(e),
                });
            }
            debug!(path = %discovery_path.display(), %contents, "discovery marker written");

            Ok(Bound {
                listener: Listener::Tcp(listener),
                endpoint: Endpoint::Tcp {
                    local_addr,
                    advertise,
                },
                marker: discovery_path.clone(),
            })
        }
        Binding::Local { socket_path } => {
            let address = socket_path.display().to_string();
            ensure_parent(socket_path)
                .await
                .map_err(|e| bind_error(address.clone(), e))?;
            let listener =
                UnixListener::bind(socket_path).map_err(|e| bind_error(address, e))?;

            Ok(Bound {
                listener: Listener::Unix(listener),
                endpoint: Endpoint::Unix {
                    path: socket_path.clone(),
                },
                marker: socket_path.clone(),
            })
        }
    }
}

async fn serve(
    listener: Listener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    match listener {
        Listener::Tcp(listener) => {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
        }
        Listener::Unix(listener) => {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
        }
    }
}

async fn remove_marker(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "discovery marker removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove discovery marker");
        }
    }
}

/// Everything the supervisor owns until the server has stopped.
pub(crate) struct Supervised {
    pub(crate) bound: Bound,
    pub(crate) router: Router,
    pub(crate) bridge: EventBridge,
    pub(crate) broker: Broker,
    pub(crate) in_flight: InFlight,
    pub(crate) drain_timeout: Duration,
}

/// Run the accept loop in the background and drive the STOPPED cleanup.
pub(crate) fn spawn_supervisor(supervised: Supervised, handle: Stoppable) {
    let Supervised {
        bound: Bound {
            listener,
            endpoint,
            marker,
        },
        router,
        bridge,
        broker,
        in_flight,
        drain_timeout,
    } = supervised;
    let shutdown = handle.shutdown_token();

    tokio::spawn(async move {
        info!(?endpoint, forwarders = bridge.len(), "server listening");

        let mut serving = Box::pin(serve(listener, router, shutdown.clone()));
        let drain = async {
            shutdown.cancelled().await;
            tokio::time::sleep(drain_timeout).await;
        };

        tokio::select! {
            result = &mut serving => match result {
                Ok(()) if shutdown.is_cancelled() => debug!("listener drained"),
                Ok(()) => warn!("listener exited unexpectedly"),
                Err(e) if shutdown.is_cancelled() => warn!(error = %e, "listener error during shutdown"),
                Err(e) => error!(error = %e, "listener failed"),
            },
            () = drain => {
                warn!(
                    ?drain_timeout,
                    in_flight = in_flight.len(),
                    "drain deadline reached, cutting off remaining requests"
                );
                in_flight.force_and_wait().await;
            }
        }
        drop(serving);
        in_flight.wait().await;

        debug!(active = bridge.active(), "stopping event forwarding");
        bridge.shutdown().await;
        broker.stop();
        remove_marker(&marker).await;
        handle.mark_stopped();
    });
}

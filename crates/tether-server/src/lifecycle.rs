// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server lifecycle handle.
//!
//! A server moves `RUNNING -> STOPPING -> STOPPED` exactly once. The first
//! [`Stoppable::stop`] call begins the transition; the background supervisor
//! completes it after the listener has drained and cleanup has run.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::info;

/// Lifecycle states of a running server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LifecycleState {
    Running,
    Stopping,
    Stopped,
}

/// Where a server is listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP listener and the address published in the discovery marker.
    Tcp {
        local_addr: SocketAddr,
        advertise: String,
    },
    /// Unix socket listener; the socket file is the discovery marker.
    Unix { path: PathBuf },
}

impl Endpoint {
    /// Path of the Unix socket, if any.
    pub fn unix_path(&self) -> Option<&Path> {
        match self {
            Endpoint::Unix { path } => Some(path),
            Endpoint::Tcp { .. } => None,
        }
    }

    /// Bound TCP address, if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Endpoint::Tcp { local_addr, .. } => Some(*local_addr),
            Endpoint::Unix { .. } => None,
        }
    }
}

struct Shared {
    state: watch::Sender<LifecycleState>,
    shutdown: CancellationToken,
    stopped: CancellationToken,
    endpoint: Endpoint,
}

/// Handle to a running server. Clones share the same server.
#[derive(Clone)]
pub struct Stoppable {
    shared: Arc<Shared>,
}

impl Stoppable {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        let (state, _) = watch::channel(LifecycleState::Running);
        Self {
            shared: Arc::new(Shared {
                state,
                shutdown: CancellationToken::new(),
                stopped: CancellationToken::new(),
                endpoint,
            }),
        }
    }

    /// Begin a graceful stop. Only the first call has an effect.
    pub fn stop(&self) {
        let began = self.shared.state.send_if_modified(|state| {
            if *state == LifecycleState::Running {
                *state = LifecycleState::Stopping;
                true
            } else {
                false
            }
        });
        if began {
            info!(endpoint = ?self.shared.endpoint, "server stopping");
            self.shared.shutdown.cancel();
        }
    }

    /// Wait until the server has fully stopped.
    pub async fn await_stopped(&self) {
        self.shared.stopped.cancelled().await;
    }

    /// Owned future that completes once the server has stopped.
    pub fn wait(&self) -> WaitForCancellationFutureOwned {
        self.shared.stopped.clone().cancelled_owned()
    }

    pub fn state(&self) -> LifecycleState {
        *self.shared.state.borrow()
    }

    /// Observe state transitions.
    pub fn watch(&self) -> watch::Receiver<LifecycleState> {
        self.shared.state.subscribe()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    /// Token cancelled when the server enters STOPPING.
    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Final transition, run by the supervisor after cleanup.
    pub(crate) fn mark_stopped(&self) {
        // A listener that failed on its own still passes through STOPPING.
        self.stop();
        self.shared.state.send_replace(LifecycleState::Stopped);
        self.shared.stopped.cancel();
        info!(endpoint = ?self.shared.endpoint, "server stopped");
    }
}

impl std::fmt::Debug for Stoppable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stoppable")
            .field("state", &self.state())
            .field("endpoint", &self.shared.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn handle() -> Stoppable {
        Stoppable::new(Endpoint::Unix {
            path: PathBuf::from("/tmp/unused.sock"),
        })
    }

    #[test]
    fn state_names() {
        assert_eq!(LifecycleState::Running.to_string(), "RUNNING");
        assert_eq!(LifecycleState::Stopped.to_string(), "STOPPED");
    }

    #[test]
    fn stop_is_idempotent() {
        let stoppable = handle();
        let token = stoppable.shutdown_token();
        assert_eq!(stoppable.state(), LifecycleState::Running);

        stoppable.stop();
        stoppable.clone().stop();
        assert_eq!(stoppable.state(), LifecycleState::Stopping);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn watchers_see_each_transition() {
        let stoppable = handle();
        let mut rx = stoppable.watch();

        stoppable.stop();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LifecycleState::Stopping);

        stoppable.mark_stopped();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn many_waiters_released_together() {
        let stoppable = handle();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let s = stoppable.clone();
                tokio::spawn(async move { s.await_stopped().await })
            })
            .collect();
        let owned = stoppable.wait();

        stoppable.stop();
        stoppable.mark_stopped();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
        }
        tokio::time::timeout(Duration::from_secs(1), owned).await.unwrap();
        assert_eq!(stoppable.state(), LifecycleState::Stopped);
    }

    #[test]
    fn unexpected_listener_exit_passes_through_stopping() {
        let stoppable = handle();
        let mut rx = stoppable.watch();
        stoppable.mark_stopped();
        assert!(stoppable.shutdown_token().is_cancelled());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), LifecycleState::Stopped);
    }

    #[test]
    fn endpoint_accessors() {
        let tcp = Endpoint::Tcp {
            local_addr: "127.0.0.1:9000".parse().unwrap(),
            advertise: "10.0.0.1:9000".into(),
        };
        assert_eq!(tcp.local_addr(), Some("127.0.0.1:9000".parse().unwrap()));
        assert!(tcp.unix_path().is_none());
    }
}

// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight request tracking for the drain deadline.
//!
//! Every request holds a tracker token while its handler runs. When the drain
//! deadline expires the force token fires, each pending handler is dropped and
//! answered with 503, and the supervisor waits for the last token to go.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight {
    tracker: TaskTracker,
    force: CancellationToken,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Requests whose handlers have not returned yet.
    pub(crate) fn len(&self) -> usize {
        self.tracker.len()
    }

    /// Cut off every running handler and wait until all of them are gone.
    pub(crate) async fn force_and_wait(&self) {
        self.force.cancel();
        self.wait().await;
    }

    /// Wait for running handlers without cutting them off.
    pub(crate) async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        debug!("no requests in flight");
    }
}

/// Middleware that runs the handler until it returns or the drain deadline passes.
pub(crate) async fn bound_in_flight(
    State(in_flight): State<InFlight>,
    request: Request,
    next: Next,
) -> Response {
    let _token = in_flight.tracker.token();
    let uri = request.uri().clone();
    tokio::select! {
        biased;
        () = in_flight.force.cancelled() => {
            warn!(%uri, "request cut off at drain deadline");
            (StatusCode::SERVICE_UNAVAILABLE, "server stopped").into_response()
        }
        response = next.run(request) => response,
    }
}

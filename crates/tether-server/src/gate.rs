// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription gate and the Server-Sent Events route in front of the broker.
//!
//! Stream format, one SSE event per delivery:
//! ```text
//! event: y/evt
//! id: 42
//! data: {"k":1}
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tether_bus::{Broker, Delivery};
use tether_core::{TetherError, Topic, Validator};

/// Admits a topic when any registered validator accepts it.
#[derive(Clone)]
pub struct SubscriptionGate {
    validators: Arc<[Arc<dyn Validator>]>,
}

impl SubscriptionGate {
    pub fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        Self {
            validators: validators.into(),
        }
    }

    /// Validators run in registration order; the first acceptance admits.
    /// With no validators every topic is rejected.
    pub fn admit(&self, topic: &Topic) -> Result<(), TetherError> {
        for validator in self.validators.iter() {
            match validator.validate(topic) {
                Ok(()) => return Ok(()),
                Err(e) => debug!(topic = %topic, error = %e, "validator declined topic"),
            }
        }
        Err(TetherError::InvalidTopic(topic.to_string()))
    }
}

impl std::fmt::Debug for SubscriptionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGate")
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct EventsState {
    pub(crate) gate: SubscriptionGate,
    pub(crate) broker: Broker,
    /// Cancelled when the server begins stopping.
    pub(crate) shutdown: CancellationToken,
}

pub(crate) fn events_router(state: EventsState) -> Router {
    Router::new()
        .route("/events", get(subscribe_root))
        .route("/events/", get(subscribe_root))
        .route("/events/{*topic}", get(subscribe_topic))
        .with_state(state)
}

async fn subscribe_root(State(state): State<EventsState>) -> Response {
    subscribe(state, Topic::root())
}

async fn subscribe_topic(State(state): State<EventsState>, Path(topic): Path<String>) -> Response {
    subscribe(state, Topic::new(&topic))
}

/// Logs the departure of a subscriber when its stream is dropped.
struct ClientGuard {
    topic: Topic,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        info!(topic = %self.topic, "client left");
    }
}

fn to_sse(delivery: &Delivery) -> SseEvent {
    SseEvent::default()
        .event(delivery.event.topic.to_string())
        .id(delivery.sequence.to_string())
        .data(delivery.event.payload.to_string())
}

fn subscribe(state: EventsState, topic: Topic) -> Response {
    if let Err(e) = state.gate.admit(&topic) {
        warn!(topic = %topic, "subscription rejected");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    let subscription = match state.broker.subscribe(topic.clone()) {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(topic = %topic, error = %e, "subscription refused");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    info!(topic = %topic, subscriber = %subscription.id(), "client subscribed");
    let guard = ClientGuard { topic };
    let stream = subscription
        .map(move |delivery| {
            let _ = &guard;
            Ok::<_, Infallible>(to_sse(&delivery))
        })
        .take_until(state.shutdown.cancelled_owned());

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tether_core::{Event, InterfaceSpec};
    use tether_test_utils::MockPlugin;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn validator(allowed: &[&str]) -> Arc<dyn Validator> {
        Arc::new(
            MockPlugin::new("V", InterfaceSpec::new("V", "1.0"), &[]).with_allowed_topics(allowed),
        )
    }

    #[test]
    fn no_validators_rejects_everything() {
        let gate = SubscriptionGate::new(vec![]);
        let err = gate.admit(&Topic::new("y/evt")).unwrap_err();
        assert_eq!(err.to_string(), "invalid topic: y/evt");
    }

    #[test]
    fn any_accepting_validator_admits() {
        let gate = SubscriptionGate::new(vec![validator(&["a"]), validator(&["y/evt"])]);
        assert!(gate.admit(&Topic::new("y/evt")).is_ok());
        assert!(gate.admit(&Topic::new("a")).is_ok());
        assert!(gate.admit(&Topic::new("z/other")).is_err());
    }

    fn state(gate: SubscriptionGate) -> EventsState {
        EventsState {
            gate,
            broker: Broker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn rejected_topic_is_bad_request() {
        let router = events_router(state(SubscriptionGate::new(vec![validator(&["y/evt"])])));
        let response = router
            .oneshot(Request::get("/events/z/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"error": "invalid topic: z/other"}));
    }

    #[tokio::test]
    #[traced_test]
    async fn admitted_topic_streams_deliveries() {
        let state = state(SubscriptionGate::new(vec![validator(&["y/evt"])]));
        let broker = state.broker.clone();
        let shutdown = state.shutdown.clone();

        let response = events_router(state)
            .oneshot(Request::get("/events/y/evt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );
        assert_eq!(broker.subscriber_count(), 1);

        broker
            .publish(Event::new("y/evt", json!({"k": 1})), Duration::from_secs(1))
            .await;

        let mut body = response.into_body().into_data_stream();
        let mut text = String::new();
        while !text.contains("data: ") {
            let chunk = body.next().await.unwrap().unwrap();
            text.push_str(std::str::from_utf8(&chunk).unwrap());
        }
        assert!(text.contains("event: y/evt\n"), "{text}");
        assert!(text.contains("id: 1\n"), "{text}");
        assert!(text.contains("data: {\"k\":1}\n"), "{text}");

        // Shutdown ends the stream.
        shutdown.cancel();
        while body.next().await.is_some() {}
        drop(body);

        assert_eq!(broker.subscriber_count(), 0);
        assert!(logs_contain("client left"));
    }

    #[tokio::test]
    async fn stopped_broker_refuses_subscription() {
        let state = state(SubscriptionGate::new(vec![validator(&["y"])]));
        state.broker.stop();
        let response = events_router(state)
            .oneshot(Request::get("/events/y").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

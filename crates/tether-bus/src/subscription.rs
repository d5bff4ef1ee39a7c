// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscriber handle returned by [`Broker::subscribe`](crate::Broker::subscribe).

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use tether_core::{Event, Topic};

use crate::broker::{self, Inner};

/// One event as seen by subscribers, shared between all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Broker-wide sequence number, increasing in publish order.
    pub sequence: u64,
    /// The published event.
    pub event: Event,
}

/// A live subscription. Dropping it unregisters the subscriber.
///
/// The stream ends when the broker stops.
pub struct Subscription {
    id: Uuid,
    topic: Topic,
    rx: mpsc::Receiver<Arc<Delivery>>,
    registry: Weak<Inner>,
}

impl Subscription {
    pub(crate) fn new(
        id: Uuid,
        topic: Topic,
        rx: mpsc::Receiver<Arc<Delivery>>,
        registry: Weak<Inner>,
    ) -> Self {
        Self {
            id,
            topic,
            rx,
            registry,
        }
    }

    /// Subscriber id, unique per broker.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The subscribed topic.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Wait for the next delivery; `None` once the broker has stopped.
    pub async fn recv(&mut self) -> Option<Arc<Delivery>> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Arc<Delivery>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        broker::unregister(&self.registry, &self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic.to_string())
            .finish()
    }
}

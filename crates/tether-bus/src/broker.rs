// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Topic-keyed publish/subscribe register.
//!
//! Each subscriber owns a bounded queue. Publishing fans an event out to every
//! subscriber whose topic covers the event's topic, concurrently, under one
//! shared deadline: a subscriber that cannot take the event in time misses it,
//! and the publisher moves on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use uuid::Uuid;

use tether_core::{Event, TetherError, Topic};

use crate::subscription::{Delivery, Subscription};

/// Default capacity of each subscriber queue.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

pub(crate) struct Slot {
    topic: Topic,
    tx: mpsc::Sender<Arc<Delivery>>,
}

pub(crate) struct Inner {
    pub(crate) subscribers: DashMap<Uuid, Slot>,
    sequence: AtomicU64,
    buffer: usize,
    stopped: CancellationToken,
}

/// In-memory event broker, cheap to clone and shared by all tasks of a server.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("subscribers", &self.inner.subscribers.len())
            .field("buffer", &self.inner.buffer)
            .field("stopped", &self.inner.stopped.is_cancelled())
            .finish()
    }
}

impl Broker {
    /// Create a broker with the default subscriber queue capacity.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_SUBSCRIBER_BUFFER)
    }

    /// Create a broker whose subscriber queues hold `buffer` events.
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: DashMap::new(),
                sequence: AtomicU64::new(0),
                buffer: buffer.max(1),
                stopped: CancellationToken::new(),
            }),
        }
    }

    /// Register a subscriber for `topic` and its descendants.
    pub fn subscribe(&self, topic: Topic) -> Result<Subscription, TetherError> {
        if self.is_stopped() {
            return Err(TetherError::BrokerStopped);
        }

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        self.inner.subscribers.insert(
            id,
            Slot {
                topic: topic.clone(),
                tx,
            },
        );

        // A stop racing with this insert may already have cleared the map.
        if self.is_stopped() {
            self.inner.subscribers.remove(&id);
            return Err(TetherError::BrokerStopped);
        }

        debug!(subscriber = %id, topic = %topic, "subscriber registered");
        Ok(Subscription::new(
            id,
            topic,
            rx,
            Arc::downgrade(&self.inner),
        ))
    }

    /// Deliver `event` to every subscriber covering its topic.
    ///
    /// Returns the number of subscribers that received it. Never waits longer
    /// than `timeout`; subscribers that were too slow miss this event.
    pub async fn publish(&self, event: Event, timeout: Duration) -> usize {
        if self.is_stopped() {
            trace!(topic = %event.topic, "broker stopped, event discarded");
            return 0;
        }

        // Snapshot the targets so no map lock is held across the sends.
        let targets: Vec<(Uuid, mpsc::Sender<Arc<Delivery>>)> = self
            .inner
            .subscribers
            .iter()
            .filter(|slot| slot.topic.covers(&event.topic))
            .map(|slot| (*slot.key(), slot.tx.clone()))
            .collect();

        if targets.is_empty() {
            trace!(topic = %event.topic, "no subscribers for event");
            return 0;
        }

        let delivery = Arc::new(Delivery {
            sequence: self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            event,
        });
        let deadline = Instant::now() + timeout;

        let outcomes = join_all(targets.into_iter().map(|(id, tx)| {
            let delivery = Arc::clone(&delivery);
            async move { (id, tokio::time::timeout_at(deadline, tx.send(delivery)).await) }
        }))
        .await;

        let mut delivered = 0;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(_)) => {
                    self.inner.subscribers.remove(&id);
                    debug!(subscriber = %id, "pruned disconnected subscriber");
                }
                Err(_) => {
                    debug!(
                        subscriber = %id,
                        topic = %delivery.event.topic,
                        sequence = delivery.sequence,
                        ?timeout,
                        "delivery timed out, event dropped for subscriber"
                    );
                }
            }
        }
        delivered
    }

    /// Stop the broker: every subscriber stream ends and later publishes are no-ops.
    pub fn stop(&self) {
        if self.inner.stopped.is_cancelled() {
            return;
        }
        self.inner.stopped.cancel();
        let dropped = self.inner.subscribers.len();
        self.inner.subscribers.clear();
        info!(subscribers = dropped, "event broker stopped");
    }

    /// Returns true once [`Broker::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.is_cancelled()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn unregister(inner: &Weak<Inner>, id: &Uuid) {
    if let Some(inner) = inner.upgrade() {
        if inner.subscribers.remove(id).is_some() {
            debug!(subscriber = %id, "subscriber unregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECOND: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn delivers_to_exact_and_ancestor_topics() {
        let broker = Broker::new();
        let mut exact = broker.subscribe(Topic::new("y/evt")).unwrap();
        let mut parent = broker.subscribe(Topic::new("y")).unwrap();
        let mut root = broker.subscribe(Topic::root()).unwrap();

        let delivered = broker.publish(Event::new("y/evt", json!({"k": 1})), SECOND).await;
        assert_eq!(delivered, 3);

        for sub in [&mut exact, &mut parent, &mut root] {
            let delivery = sub.recv().await.unwrap();
            assert_eq!(delivery.event.payload, json!({"k": 1}));
        }
    }

    #[tokio::test]
    async fn skips_unrelated_topics() {
        let broker = Broker::new();
        let _sibling = broker.subscribe(Topic::new("y/other")).unwrap();
        let _child = broker.subscribe(Topic::new("y/evt/deeper")).unwrap();

        let delivered = broker.publish(Event::new("y/evt", json!(null)), SECOND).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn preserves_publish_order_per_subscriber() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(Topic::new("seq")).unwrap();

        for i in 0..10 {
            broker.publish(Event::new("seq", json!(i)), SECOND).await;
        }
        for i in 0..10 {
            let delivery = sub.recv().await.unwrap();
            assert_eq!(delivery.event.payload, json!(i));
        }
    }

    #[tokio::test]
    async fn sequence_numbers_increase() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(Topic::root()).unwrap();
        broker.publish(Event::new("a", json!(1)), SECOND).await;
        broker.publish(Event::new("b", json!(2)), SECOND).await;

        let first = sub.recv().await.unwrap().sequence;
        let second = sub.recv().await.unwrap().sequence;
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_subscriber_misses_event_without_stalling_publisher() {
        let broker = Broker::with_buffer(1);
        let mut slow = broker.subscribe(Topic::new("t")).unwrap();
        let mut fast = broker.subscribe(Topic::new("t")).unwrap();

        assert_eq!(broker.publish(Event::new("t", json!(1)), SECOND).await, 2);
        fast.recv().await.unwrap();

        // `slow` never drained its single slot, so only `fast` gets the second event.
        let started = Instant::now();
        let delivered = broker.publish(Event::new("t", json!(2)), SECOND).await;
        assert_eq!(delivered, 1);
        assert!(started.elapsed() <= SECOND + Duration::from_millis(10));

        assert_eq!(fast.recv().await.unwrap().event.payload, json!(2));
        assert_eq!(slow.recv().await.unwrap().event.payload, json!(1));
        assert_eq!(broker.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters() {
        let broker = Broker::new();
        let sub = broker.subscribe(Topic::new("t")).unwrap();
        assert_eq!(broker.subscriber_count(), 1);
        drop(sub);
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stop_ends_streams_and_refuses_new_subscribers() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(Topic::new("t")).unwrap();

        broker.stop();
        broker.stop();

        assert!(broker.is_stopped());
        assert!(sub.recv().await.is_none());
        assert!(matches!(
            broker.subscribe(Topic::new("t")),
            Err(TetherError::BrokerStopped)
        ));
        assert_eq!(broker.publish(Event::new("t", json!(1)), SECOND).await, 0);
    }
}

// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forwards each publisher's private event channel into the shared broker.
//!
//! Every publisher gets one bounded channel and one worker task. A publisher
//! that closes its channel stops only its own worker.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tether_bus::Broker;
use tether_core::EventSink;

use crate::plugin::NamedPublisher;

/// Owner of the forwarding workers.
#[derive(Debug)]
pub(crate) struct EventBridge {
    workers: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl EventBridge {
    /// Hand each publisher its sink and spawn its worker.
    pub(crate) fn start(
        publishers: Vec<NamedPublisher>,
        broker: &Broker,
        capacity: usize,
        publish_timeout: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let workers = publishers
            .into_iter()
            .map(|NamedPublisher { name, publisher }| {
                let (sink, mut rx) = EventSink::channel(capacity);
                publisher.publish_on(sink);

                let broker = broker.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    debug!(publisher = %name, "event forwarding started");
                    loop {
                        let event = tokio::select! {
                            _ = cancel.cancelled() => break,
                            next = rx.recv() => match next {
                                Some(event) => event,
                                None => {
                                    debug!(publisher = %name, "event channel closed, forwarding ends");
                                    break;
                                }
                            },
                        };
                        let delivered = broker.publish(event, publish_timeout).await;
                        if delivered == 0 {
                            debug!(publisher = %name, "event had no receivers");
                        }
                    }
                })
            })
            .collect();

        Self { workers, cancel }
    }

    /// Number of workers started.
    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers still forwarding.
    pub(crate) fn active(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_finished()).count()
    }

    /// Cancel every worker and wait for all of them to exit.
    pub(crate) async fn shutdown(self) {
        self.cancel.cancel();
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "event forwarding task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use tether_core::{Event, InterfaceSpec, Service, Topic};
    use tether_test_utils::MockPlugin;

    fn named(mock: &Arc<MockPlugin>) -> NamedPublisher {
        NamedPublisher {
            name: mock.name().to_string(),
            publisher: mock.clone(),
        }
    }

    #[tokio::test]
    async fn forwards_events_to_broker() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(Topic::new("y")).unwrap();
        let b = Arc::new(MockPlugin::new("B", InterfaceSpec::new("Y", "1.0"), &[]));

        let bridge = EventBridge::start(vec![named(&b)], &broker, 8, Duration::from_secs(1));
        assert_eq!(bridge.len(), 1);

        b.emit(Event::new("y/evt", json!({"k": 1}))).await.unwrap();
        let delivery = sub.recv().await.unwrap();
        assert_eq!(delivery.event.payload, json!({"k": 1}));

        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn closing_one_publisher_leaves_others_running() {
        let broker = Broker::new();
        let mut sub = broker.subscribe(Topic::root()).unwrap();
        let quitter = Arc::new(MockPlugin::new("Q", InterfaceSpec::new("Q", "1.0"), &[]));
        let stayer = Arc::new(MockPlugin::new("S", InterfaceSpec::new("S", "1.0"), &[]));

        let bridge = EventBridge::start(
            vec![named(&quitter), named(&stayer)],
            &broker,
            8,
            Duration::from_secs(1),
        );

        quitter.close_events();
        while bridge.active() > 1 {
            tokio::task::yield_now().await;
        }

        stayer.emit(Event::new("s/evt", json!(2))).await.unwrap();
        assert_eq!(sub.recv().await.unwrap().event.payload, json!(2));
        assert_eq!(bridge.active(), 1);

        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_joins_idle_workers() {
        let broker = Broker::new();
        let b = Arc::new(MockPlugin::new("B", InterfaceSpec::new("Y", "1.0"), &[]));
        let bridge = EventBridge::start(vec![named(&b)], &broker, 8, Duration::from_secs(1));

        tokio::time::timeout(Duration::from_secs(1), bridge.shutdown())
            .await
            .expect("workers should exit on cancel");
    }
}

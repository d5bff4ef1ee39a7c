// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event publishing and subscription validation capabilities.

use tokio::sync::mpsc;

use crate::error::TetherError;
use crate::types::{Event, Topic};

/// Sending half of a publisher's dedicated event channel.
///
/// The channel is bounded; `send` waits for room. Dropping every clone of the
/// sink closes the channel, which ends forwarding for that publisher only.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Event>,
}

impl EventSink {
    /// Create a bounded channel and return the sink with its receiving half.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue an event, waiting while the channel is full.
    pub async fn send(&self, event: Event) -> Result<(), TetherError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| TetherError::Internal("event channel closed".to_string()))
    }

    /// Queue an event without waiting.
    pub fn try_send(&self, event: Event) -> Result<(), TetherError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TetherError::Internal("event channel full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                TetherError::Internal("event channel closed".to_string())
            }
        })
    }

    /// Returns true once the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A backing object that emits events.
pub trait Publisher: Send + Sync + 'static {
    /// Hand the object its event channel. Called exactly once per object.
    fn publish_on(&self, sink: EventSink);
}

/// A backing object that decides which topics may be subscribed to.
pub trait Validator: Send + Sync + 'static {
    /// Accept or reject a subscription to `topic`.
    fn validate(&self, topic: &Topic) -> Result<(), TetherError>;
}

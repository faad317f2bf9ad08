// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::config::TransportKind;
use crate::errors::TransportError;
use crate::router::Topic;

/// Opaque message body. The runtime never inspects it.
pub type Payload = Bytes;

/// Receiving end of a transport subscription.
///
/// Payloads arrive in the order the transport accepted them from a given
/// sender. Dropping the subscription (or calling [`close`](Self::close))
/// releases the transport-side endpoint exactly once.
pub struct Subscription {
    topic: Topic,
    receiver: mpsc::Receiver<Payload>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(topic: Topic, receiver: mpsc::Receiver<Payload>) -> Self {
        Self {
            topic,
            receiver,
            release: None,
        }
    }

    /// Run `release` when the subscription closes.
    pub fn with_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Next payload, or `None` once the transport side is gone.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.receiver.recv().await
    }

    pub fn close(&mut self) {
        self.receiver.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// A channel implementation carrying payloads for a set of topics.
///
/// `publish` delivers one payload to every current subscriber of the topic
/// and fails with [`TransportError::NoSubscriber`] when there is none.
/// Implementations apply backpressure by awaiting inside `publish`; callers
/// bound the wait with a timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    fn name(&self) -> &'static str;

    async fn publish(&self, topic: &Topic, payload: Payload) -> Result<(), TransportError>;

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription, TransportError>;
}

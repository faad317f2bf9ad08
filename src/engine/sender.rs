// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use crate::errors::SendError;
use crate::observability::messages::dispatch::SendFailed;
use crate::observability::messages::StructuredLog;
use crate::router::{Route, Topic};
use crate::traits::{Payload, Transport};

/// Publishing endpoint bound to one resolved topic.
///
/// Cheap to clone; clones share the transport. Payloads from one sender
/// reach each subscriber in send order.
#[derive(Clone)]
pub struct Sender {
    route: Route,
    transport: Arc<dyn Transport>,
    max_payload: usize,
    timeout: Option<Duration>,
}

impl Sender {
    pub(crate) fn new(
        route: Route,
        transport: Arc<dyn Transport>,
        max_payload: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            route,
            transport,
            max_payload,
            timeout,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.route.topic
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Replace the timeout used by [`send`](Self::send). `None` waits as
    /// long as the transport applies backpressure.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publish one payload to every current subscriber of the topic.
    ///
    /// Fails with [`SendError::NoSubscriber`] when nobody is listening; the
    /// payload is dropped and the sender stays usable.
    pub async fn send(&self, payload: impl Into<Payload>) -> Result<(), SendError> {
        match self.timeout {
            Some(after) => self.send_timeout(payload, after).await,
            None => self.deliver(payload.into()).await,
        }
    }

    /// Like [`send`](Self::send), giving up after `after`.
    pub async fn send_timeout(
        &self,
        payload: impl Into<Payload>,
        after: Duration,
    ) -> Result<(), SendError> {
        match tokio::time::timeout(after, self.deliver(payload.into())).await {
            Ok(result) => result,
            Err(_) => {
                let error = SendError::Timeout {
                    topic: self.route.topic.clone(),
                    after,
                };
                SendFailed {
                    topic: &self.route.topic,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }

    async fn deliver(&self, payload: Payload) -> Result<(), SendError> {
        let result = if payload.len() > self.max_payload {
            Err(SendError::PayloadTooLarge {
                size: payload.len(),
                limit: self.max_payload,
            })
        } else {
            self.transport
                .publish(&self.route.topic, payload)
                .await
                .map_err(SendError::from)
        };

        if let Err(error) = &result {
            SendFailed {
                topic: &self.route.topic,
                error,
            }
            .log();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;
    use crate::transport::LocalBus;
    use bytes::Bytes;

    fn sender(bus: Arc<LocalBus>, max_payload: usize) -> Sender {
        let route = Route {
            topic: Topic::new("ns", "x"),
            kind: TransportKind::Local,
        };
        Sender::new(route, bus, max_payload, None)
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected_before_transport() {
        let bus = Arc::new(LocalBus::new(4));
        let sender = sender(bus, 4);

        let err = sender.send(vec![0u8; 5]).await.unwrap_err();
        assert!(matches!(err, SendError::PayloadTooLarge { size: 5, limit: 4 }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn no_subscriber_is_retryable() {
        let bus = Arc::new(LocalBus::new(4));
        let sender = sender(bus, 64);

        let err = sender.send(Bytes::from_static(b"a")).await.unwrap_err();
        assert!(matches!(err, SendError::NoSubscriber { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn blocked_send_times_out() {
        let bus = Arc::new(LocalBus::new(1));
        let sender = sender(Arc::clone(&bus), 64);
        let _subscription = bus.subscribe(sender.topic()).await.unwrap();

        sender.send(Bytes::from_static(b"1")).await.unwrap();
        let err = sender
            .send_timeout(Bytes::from_static(b"2"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Timeout { .. }));

        let sender = sender.with_timeout(Some(Duration::from_millis(20)));
        assert!(matches!(
            sender.send(Bytes::from_static(b"3")).await,
            Err(SendError::Timeout { .. })
        ));
    }
}

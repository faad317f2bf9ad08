// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::TransportKind;
use crate::errors::TransportError;
use crate::observability::messages::transport::{SubscriptionOpened, SubscriptionReleased};
use crate::observability::messages::StructuredLog;
use crate::router::{SubscriptionRegistry, Topic};
use crate::traits::{Payload, Subscription, Transport};

/// In-process transport.
///
/// Each subscription owns a bounded channel of `capacity` payloads. A publish
/// clones the payload handle into every subscriber's channel and waits while
/// any of them is full.
pub struct LocalBus {
    registry: Arc<SubscriptionRegistry<mpsc::Sender<Payload>>>,
    capacity: usize,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Arc::new(SubscriptionRegistry::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.registry.subscriber_count(topic)
    }
}

#[async_trait]
impl Transport for LocalBus {
    fn kind(&self) -> TransportKind {
        TransportKind::Local
    }

    fn name(&self) -> &'static str {
        "local_bus"
    }

    async fn publish(&self, topic: &Topic, payload: Payload) -> Result<(), TransportError> {
        let targets = self.registry.targets(topic);
        let mut delivered = 0usize;
        let mut closed = Vec::new();

        for (id, sink) in targets {
            match sink.send(payload.clone()).await {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(id),
            }
        }
        self.registry.prune(topic, &closed);

        if delivered == 0 {
            return Err(TransportError::NoSubscriber {
                topic: topic.clone(),
            });
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription, TransportError> {
        let (sink, receiver) = mpsc::channel(self.capacity);
        let id = self.registry.register(topic, sink);

        SubscriptionOpened {
            topic,
            kind: TransportKind::Local,
            endpoint: "in-process",
        }
        .log();

        let registry = Arc::clone(&self.registry);
        let released = topic.clone();
        Ok(
            Subscription::new(topic.clone(), receiver).with_release(move || {
                registry.unregister(&released, id);
                SubscriptionReleased {
                    topic: &released,
                    kind: TransportKind::Local,
                }
                .log();
            }),
        )
    }
}

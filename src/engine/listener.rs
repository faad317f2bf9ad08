// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Listener and its dispatch loop.
//!
//! Each listener owns one spawned task that pulls payloads from its
//! [`Subscription`] and runs the handler on them, one at a time and in
//! arrival order. Cancellation is cooperative: the loop checks the token
//! before taking the next payload, so a callback already running finishes
//! and nothing is dispatched after it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::engine::ListenerState;
use crate::errors::{DispatchError, TransportError};
use crate::observability::messages::dispatch::{CallbackFailed, ListenerStarted, ListenerStopped};
use crate::observability::messages::StructuredLog;
use crate::router::{Route, Topic};
use crate::traits::{MessageHandler, Subscription, Transport};

/// Counters for one listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Payloads handed to the handler.
    pub delivered: u64,
    /// Deliveries whose callback returned an error or panicked.
    pub failed: u64,
}

struct Shared {
    state: watch::Sender<ListenerState>,
    cancel: CancellationToken,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn advance(&self, next: ListenerState) {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                false
            }
        });
    }
}

/// Subscription endpoint bound to one topic and one handler.
///
/// Dropping the listener requests cancellation; the dispatch task finishes
/// any in-flight callback and closes on its own.
pub struct Listener {
    topic: Topic,
    shared: Arc<Shared>,
}

impl Listener {
    /// Subscribe to `route` and start dispatching into `handler`.
    ///
    /// Returns once the subscription is registered with the transport, so
    /// messages published after this returns are delivered.
    pub(crate) async fn start<H: MessageHandler>(
        route: Route,
        transport: Arc<dyn Transport>,
        handler: H,
    ) -> Result<Self, TransportError> {
        let (state, _) = watch::channel(ListenerState::Created);
        let shared = Arc::new(Shared {
            state,
            cancel: CancellationToken::new(),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        shared.advance(ListenerState::Subscribing);
        let subscription = match transport.subscribe(&route.topic).await {
            Ok(subscription) => subscription,
            Err(err) => {
                shared.advance(ListenerState::Closed);
                return Err(err);
            }
        };
        shared.advance(ListenerState::Active);

        ListenerStarted {
            topic: &route.topic,
            handler: handler.name(),
        }
        .log();

        tokio::spawn(dispatch(subscription, handler, Arc::clone(&shared)));

        Ok(Self {
            topic: route.topic,
            shared,
        })
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn state(&self) -> ListenerState {
        *self.shared.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_terminal()
    }

    /// Request cancellation. Idempotent; returns immediately.
    pub fn cancel(&self) {
        self.shared.advance(ListenerState::Cancelling);
        self.shared.cancel.cancel();
    }

    /// Wait until the dispatch task has finished.
    pub async fn wait(&self) {
        let mut state = self.shared.state.subscribe();
        let _ = state.wait_for(|state| state.is_terminal()).await;
    }

    pub fn stats(&self) -> ListenerStats {
        ListenerStats {
            delivered: self.shared.delivered.load(Ordering::Acquire),
            failed: self.shared.failed.load(Ordering::Acquire),
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Moves the listener to `Closed` however the dispatch task ends, panics in
/// user hooks included.
struct CloseOnExit(Arc<Shared>);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        self.0.advance(ListenerState::Closed);
    }
}

async fn dispatch<H: MessageHandler>(mut subscription: Subscription, handler: H, shared: Arc<Shared>) {
    let topic = subscription.topic().clone();
    let _closed = CloseOnExit(Arc::clone(&shared));

    loop {
        let payload = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            next = subscription.recv() => match next {
                Some(payload) => payload,
                None => break,
            },
        };

        let outcome = AssertUnwindSafe(handler.on_message(payload))
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(source)) => Some(DispatchError::Callback {
                topic: topic.clone(),
                source,
            }),
            Err(panic) => Some(DispatchError::Panicked {
                topic: topic.clone(),
                message: panic_message(panic),
            }),
        };

        shared.delivered.fetch_add(1, Ordering::AcqRel);
        if let Some(error) = error {
            shared.failed.fetch_add(1, Ordering::AcqRel);
            run_hook(&topic, || handler.on_error(&error));
        }
    }

    shared.advance(ListenerState::Cancelling);
    subscription.close();
    run_hook(&topic, || handler.on_close());

    ListenerStopped {
        topic: &topic,
        delivered: shared.delivered.load(Ordering::Acquire),
        failed: shared.failed.load(Ordering::Acquire),
    }
    .log();
}

/// Run a synchronous handler hook; a panic in it is logged, not propagated.
fn run_hook(topic: &Topic, hook: impl FnOnce()) {
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(hook)) {
        CallbackFailed {
            error: &DispatchError::Panicked {
                topic: topic.clone(),
                message: panic_message(panic),
            },
        }
        .log();
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;
    use crate::traits::handler_fn;
    use crate::transport::LocalBus;
    use bytes::Bytes;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    fn route() -> Route {
        Route {
            topic: Topic::new("ns", "x"),
            kind: TransportKind::Local,
        }
    }

    async fn wait_for_delivered(listener: &Listener, expected: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while listener.stats().delivered < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn delivers_in_order() {
        let bus = Arc::new(LocalBus::new(8));
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let listener = Listener::start(
            route(),
            bus.clone(),
            handler_fn(move |payload| {
                sink.lock().unwrap().push(payload);
                Ok(())
            }),
        )
        .await
        .unwrap();
        assert_eq!(listener.state(), ListenerState::Active);

        for i in 0u8..20 {
            bus.publish(&route().topic, Bytes::copy_from_slice(&[i])).await.unwrap();
        }
        wait_for_delivered(&listener, 20).await;

        let received = received.lock().unwrap();
        let expected: Vec<Bytes> = (0u8..20).map(|i| Bytes::copy_from_slice(&[i])).collect();
        assert_eq!(*received, expected);
    }

    #[tokio::test]
    async fn errors_and_panics_do_not_stop_dispatch() {
        let bus = Arc::new(LocalBus::new(8));
        let listener = Listener::start(
            route(),
            bus.clone(),
            handler_fn(|payload| match payload.as_ref() {
                b"err" => Err(anyhow::anyhow!("rejected")),
                b"panic" => panic!("boom"),
                _ => Ok(()),
            }),
        )
        .await
        .unwrap();

        for body in [b"ok".as_slice(), b"err", b"panic", b"ok"] {
            bus.publish(&route().topic, Bytes::copy_from_slice(body)).await.unwrap();
        }
        wait_for_delivered(&listener, 4).await;

        assert_eq!(
            listener.stats(),
            ListenerStats {
                delivered: 4,
                failed: 2
            }
        );
        assert!(!listener.is_closed());
    }

    #[tokio::test]
    async fn cancel_closes_and_releases_subscription() {
        let bus = Arc::new(LocalBus::new(8));
        let closes = Arc::new(AtomicUsize::new(0));

        struct CountClose(Arc<AtomicUsize>);

        #[async_trait::async_trait]
        impl MessageHandler for CountClose {
            async fn on_message(&self, _: crate::traits::Payload) -> Result<(), crate::errors::HandlerError> {
                Ok(())
            }

            fn on_close(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let listener = Listener::start(route(), bus.clone(), CountClose(Arc::clone(&closes)))
            .await
            .unwrap();
        assert_eq!(bus.subscriber_count(&route().topic), 1);

        listener.cancel();
        listener.cancel();
        listener.wait().await;

        assert!(listener.is_closed());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(&route().topic), 0);
    }

    #[tokio::test]
    async fn dropping_listener_cancels() {
        let bus = Arc::new(LocalBus::new(8));
        let listener = Listener::start(route(), bus.clone(), handler_fn(|_| Ok(())))
            .await
            .unwrap();
        drop(listener);

        tokio::time::timeout(Duration::from_secs(5), async {
            while bus.subscriber_count(&route().topic) > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn panicking_hooks_still_reach_closed() {
        struct Fragile;

        #[async_trait::async_trait]
        impl MessageHandler for Fragile {
            async fn on_message(&self, _: crate::traits::Payload) -> Result<(), crate::errors::HandlerError> {
                Err(anyhow::anyhow!("rejected").into())
            }

            fn on_error(&self, _: &DispatchError) {
                panic!("on_error blew up");
            }

            fn on_close(&self) {
                panic!("on_close blew up");
            }
        }

        let bus = Arc::new(LocalBus::new(8));
        let listener = Listener::start(route(), bus.clone(), Fragile).await.unwrap();

        bus.publish(&route().topic, Bytes::from_static(b"a")).await.unwrap();
        bus.publish(&route().topic, Bytes::from_static(b"b")).await.unwrap();
        wait_for_delivered(&listener, 2).await;
        assert_eq!(listener.state(), ListenerState::Active);

        listener.cancel();
        tokio::time::timeout(Duration::from_secs(5), listener.wait())
            .await
            .unwrap();
        assert!(listener.is_closed());
    }

    #[test]
    fn panic_payloads_are_rendered() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7u8)), "unknown panic");
    }
}

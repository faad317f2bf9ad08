// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for listener dispatch.

use crate::errors::{DispatchError, SendError};
use crate::observability::messages::StructuredLog;
use crate::router::Topic;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Listener subscribed and dispatching.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ListenerStarted<'a> {
    pub topic: &'a Topic,
    pub handler: &'a str,
}

impl Display for ListenerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Listener on topic '{}' started with handler '{}'",
            self.topic, self.handler
        )
    }
}

impl StructuredLog for ListenerStarted<'_> {
    fn log(&self) {
        tracing::info!(
            topic = %self.topic,
            handler = self.handler,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "listener",
            span_name = name,
            topic = %self.topic,
            handler = self.handler,
        )
    }
}

/// Listener finished; no further callbacks will run.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use easyflow::observability::messages::dispatch::ListenerStopped;
/// use easyflow::router::Topic;
///
/// let topic = Topic::new("pubsub", "counter");
/// let msg = ListenerStopped {
///     topic: &topic,
///     delivered: 10,
///     failed: 1,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Listener on topic 'pubsub/counter' stopped after 10 deliveries (1 failed)"
/// );
/// ```
pub struct ListenerStopped<'a> {
    pub topic: &'a Topic,
    pub delivered: u64,
    pub failed: u64,
}

impl Display for ListenerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Listener on topic '{}' stopped after {} deliveries ({} failed)",
            self.topic, self.delivered, self.failed
        )
    }
}

impl StructuredLog for ListenerStopped<'_> {
    fn log(&self) {
        tracing::info!(
            topic = %self.topic,
            delivered = self.delivered,
            failed = self.failed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "listener",
            span_name = name,
            topic = %self.topic,
        )
    }
}

/// A callback returned an error or panicked.
///
/// # Log Level
/// `warn!` - The listener keeps dispatching
pub struct CallbackFailed<'a> {
    pub error: &'a DispatchError,
}

impl Display for CallbackFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl StructuredLog for CallbackFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            topic = %self.error.topic(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "callback_failed",
            span_name = name,
            topic = %self.error.topic(),
        )
    }
}

/// A send failed and the error was handed back to the caller.
///
/// # Log Level
/// `debug!` - The caller owns the decision to retry
pub struct SendFailed<'a> {
    pub topic: &'a Topic,
    pub error: &'a SendError,
}

impl Display for SendFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Send on topic '{}' failed: {}", self.topic, self.error)
    }
}

impl StructuredLog for SendFailed<'_> {
    fn log(&self) {
        tracing::debug!(
            topic = %self.topic,
            retryable = self.error.is_retryable(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "send",
            span_name = name,
            topic = %self.topic,
        )
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for transport events.
//!
//! This module contains message types for logging events related to:
//! * Subscription endpoints being opened and released
//! * Peer discovery and stale rendezvous entries
//! * Frame-level read and write failures

use crate::config::TransportKind;
use crate::observability::messages::StructuredLog;
use crate::router::Topic;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// A subscription endpoint opened.
///
/// `endpoint` is the socket path for unix transports and `"in-process"` for
/// the local bus.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct SubscriptionOpened<'a> {
    pub topic: &'a Topic,
    pub kind: TransportKind,
    pub endpoint: &'a str,
}

impl Display for SubscriptionOpened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Subscribed to topic '{}' over {} at {}",
            self.topic, self.kind, self.endpoint
        )
    }
}

impl StructuredLog for SubscriptionOpened<'_> {
    fn log(&self) {
        tracing::debug!(
            topic = %self.topic,
            transport = %self.kind,
            endpoint = self.endpoint,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "subscription",
            span_name = name,
            topic = %self.topic,
            transport = %self.kind,
        )
    }
}

/// A subscription endpoint released.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct SubscriptionReleased<'a> {
    pub topic: &'a Topic,
    pub kind: TransportKind,
}

impl Display for SubscriptionReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Released {} subscription on topic '{}'", self.kind, self.topic)
    }
}

impl StructuredLog for SubscriptionReleased<'_> {
    fn log(&self) {
        tracing::debug!(
            topic = %self.topic,
            transport = %self.kind,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "subscription",
            span_name = name,
            topic = %self.topic,
        )
    }
}

/// A rendezvous entry pointed at a socket nobody listens on anymore.
///
/// # Log Level
/// `debug!` - Stale entries are expected after a subscriber crash
pub struct StalePeerRemoved<'a> {
    pub topic: &'a Topic,
    pub path: &'a Path,
}

impl Display for StalePeerRemoved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Removed stale peer {} for topic '{}'",
            self.path.display(),
            self.topic
        )
    }
}

impl StructuredLog for StalePeerRemoved<'_> {
    fn log(&self) {
        tracing::debug!(
            topic = %self.topic,
            path = %self.path.display(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stale_peer",
            span_name = name,
            topic = %self.topic,
        )
    }
}

/// Reading or writing a frame on a peer connection failed.
///
/// # Log Level
/// `warn!` - The peer is dropped, other peers are unaffected
pub struct PeerIoFailed<'a> {
    pub topic: &'a Topic,
    pub peer: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for PeerIoFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Peer '{}' on topic '{}' failed: {}",
            self.peer, self.topic, self.error
        )
    }
}

impl StructuredLog for PeerIoFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            topic = %self.topic,
            peer = self.peer,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "peer_io",
            span_name = name,
            topic = %self.topic,
            peer = self.peer,
        )
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for dataflow loading and endpoint construction.
//!
//! This module contains message types for logging events related to:
//! * Loading a dataflow into a `Flow`
//! * Building senders and listeners against a resolved route
//! * Replacing a transport implementation

use crate::config::{Direction, TransportKind};
use crate::observability::messages::StructuredLog;
use crate::router::Topic;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Dataflow loaded and validated.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use easyflow::observability::messages::flow::DataflowLoaded;
///
/// let msg = DataflowLoaded {
///     origin: "configs/pubsub.yaml",
///     namespace: "pubsub",
///     node_count: 2,
///     exchange_count: 1,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Loaded dataflow 'configs/pubsub.yaml' into namespace 'pubsub': 2 nodes, 1 exchanges"
/// );
/// ```
pub struct DataflowLoaded<'a> {
    pub origin: &'a str,
    pub namespace: &'a str,
    pub node_count: usize,
    pub exchange_count: usize,
}

impl Display for DataflowLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded dataflow '{}' into namespace '{}': {} nodes, {} exchanges",
            self.origin, self.namespace, self.node_count, self.exchange_count
        )
    }
}

impl StructuredLog for DataflowLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            origin = self.origin,
            namespace = self.namespace,
            node_count = self.node_count,
            exchange_count = self.exchange_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "dataflow",
            span_name = name,
            origin = self.origin,
            namespace = self.namespace,
        )
    }
}

/// A node port resolved to a route for a sender or listener.
///
/// `port` is `None` when the node's default port was used.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct EndpointResolved<'a> {
    pub node: &'a str,
    pub port: Option<&'a str>,
    pub direction: Direction,
    pub topic: &'a Topic,
    pub kind: TransportKind,
}

impl Display for EndpointResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Resolved {} port '{}.{}' to topic '{}' over {}",
            self.direction,
            self.node,
            self.port.unwrap_or("<default>"),
            self.topic,
            self.kind
        )
    }
}

impl StructuredLog for EndpointResolved<'_> {
    fn log(&self) {
        tracing::debug!(
            node = self.node,
            port = self.port.unwrap_or("<default>"),
            direction = %self.direction,
            topic = %self.topic,
            transport = %self.kind,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "endpoint",
            span_name = name,
            node = self.node,
            topic = %self.topic,
        )
    }
}

/// A transport implementation replaced through the flow builder.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct TransportOverridden<'a> {
    pub kind: TransportKind,
    pub implementation: &'a str,
}

impl Display for TransportOverridden<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Transport '{}' served by '{}'",
            self.kind, self.implementation
        )
    }
}

impl StructuredLog for TransportOverridden<'_> {
    fn log(&self) {
        tracing::debug!(
            transport = %self.kind,
            implementation = self.implementation,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "transport_override",
            span_name = name,
            transport = %self.kind,
        )
    }
}

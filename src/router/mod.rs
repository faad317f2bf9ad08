// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topic routing.
//!
//! A [`Router`] turns (node, port, direction) into a [`Route`]: the concrete
//! [`Topic`] plus the transport that carries it. Resolution only reads the
//! [`GraphDescriptor`], so it is deterministic across processes that load the
//! same dataflow.

mod registry;
mod topic;

use std::sync::Arc;

pub use registry::{SubscriptionId, SubscriptionRegistry};
pub use topic::Topic;

use crate::config::{Direction, GraphDescriptor, TransportKind};
use crate::errors::{ResolveError, TransportError};
use crate::traits::Transport;
use crate::transport::TransportSet;

/// Where a sender writes or a listener reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub topic: Topic,
    pub kind: TransportKind,
}

pub struct Router {
    descriptor: Arc<GraphDescriptor>,
    transports: TransportSet,
}

impl Router {
    pub fn new(descriptor: Arc<GraphDescriptor>, transports: TransportSet) -> Self {
        Self {
            descriptor,
            transports,
        }
    }

    pub fn descriptor(&self) -> &Arc<GraphDescriptor> {
        &self.descriptor
    }

    pub fn route(
        &self,
        node: &str,
        port: Option<&str>,
        direction: Direction,
    ) -> Result<Route, ResolveError> {
        self.descriptor.resolve(node, port, direction)
    }

    pub fn route_exchange(&self, exchange: &str) -> Result<Route, ResolveError> {
        self.descriptor.resolve_exchange(exchange)
    }

    /// The transport carrying `route`.
    pub fn transport_for(&self, route: &Route) -> Result<Arc<dyn Transport>, TransportError> {
        self.transports.get(route.kind)
    }
}

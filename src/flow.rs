// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The per-process entry point.
//!
//! A [`Flow`] owns one loaded [`GraphDescriptor`] and the transports that
//! serve it. Every sender and listener is built through it; there is no
//! process-wide current flow.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_and_validate, Direction, GraphDescriptor, TransportSettings};
use crate::engine::{Listener, Sender};
use crate::errors::{ConfigError, FlowError, ResolveError};
use crate::observability::messages::flow::{DataflowLoaded, EndpointResolved, TransportOverridden};
use crate::observability::messages::StructuredLog;
use crate::router::{Route, Router};
use crate::traits::{MessageHandler, Transport};
use crate::transport::TransportSet;

/// Builder for a [`Flow`] with non-default transports.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use easyflow::transport::LocalBus;
/// use easyflow::FlowBuilder;
///
/// # fn main() -> Result<(), easyflow::errors::FlowError> {
/// // Two flows sharing one in-process bus.
/// let bus = Arc::new(LocalBus::new(64));
/// let producer = FlowBuilder::from_path("configs/video_lidar_merge.yaml")?
///     .with_transport(bus.clone())
///     .build();
/// let consumer = FlowBuilder::from_path("configs/video_lidar_merge.yaml")?
///     .with_transport(bus)
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct FlowBuilder {
    descriptor: GraphDescriptor,
    origin: String,
    rendezvous_dir: Option<PathBuf>,
    overrides: Vec<Arc<dyn Transport>>,
}

impl FlowBuilder {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let descriptor = load_and_validate(path)?;
        Ok(Self::from_descriptor(descriptor).origin(path.display().to_string()))
    }

    pub fn from_descriptor(descriptor: GraphDescriptor) -> Self {
        Self {
            descriptor,
            origin: "<descriptor>".to_string(),
            rendezvous_dir: None,
            overrides: Vec::new(),
        }
    }

    /// Label used in log output.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Serve the transport's kind with `transport` instead of the built-in one.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.overrides.push(transport);
        self
    }

    /// Override the configured rendezvous directory of the unix transport.
    pub fn rendezvous_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.rendezvous_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Flow {
        let mut settings: TransportSettings = self.descriptor.transport().clone();
        if let Some(dir) = self.rendezvous_dir {
            settings.rendezvous_dir = dir;
        }

        let mut transports = TransportSet::from_settings(&settings);
        for transport in self.overrides {
            TransportOverridden {
                kind: transport.kind(),
                implementation: transport.name(),
            }
            .log();
            transports.insert(transport);
        }

        DataflowLoaded {
            origin: &self.origin,
            namespace: self.descriptor.namespace(),
            node_count: self.descriptor.nodes().count(),
            exchange_count: self.descriptor.exchanges().count(),
        }
        .log();

        Flow {
            router: Router::new(Arc::new(self.descriptor), transports),
            settings,
        }
    }
}

/// A loaded dataflow: factory for senders and listeners.
pub struct Flow {
    router: Router,
    settings: TransportSettings,
}

impl Flow {
    /// Load, validate and resolve the dataflow at `path` with the built-in
    /// transports.
    pub fn load_dataflow<P: AsRef<Path>>(path: P) -> Result<Self, FlowError> {
        Ok(FlowBuilder::from_path(path)?.build())
    }

    pub fn descriptor(&self) -> &GraphDescriptor {
        self.router.descriptor()
    }

    pub fn namespace(&self) -> &str {
        self.descriptor().namespace()
    }

    pub fn resolve(
        &self,
        node: &str,
        port: Option<&str>,
        direction: Direction,
    ) -> Result<Route, ResolveError> {
        self.router.route(node, port, direction)
    }

    /// Sender on the node's default output port.
    pub fn build_sender(&self, node: &str) -> Result<Sender, FlowError> {
        self.sender_for(node, None)
    }

    /// Sender on a named output port.
    pub fn build_sender_to(&self, node: &str, port: &str) -> Result<Sender, FlowError> {
        self.sender_for(node, Some(port))
    }

    /// Sender writing straight into a declared (or template-matched) exchange.
    pub fn build_sender_exchange(&self, exchange: &str) -> Result<Sender, FlowError> {
        let route = self.router.route_exchange(exchange)?;
        self.sender_on(route)
    }

    /// Listener on the node's default input port.
    pub async fn listen<H: MessageHandler>(
        &self,
        node: &str,
        handler: H,
    ) -> Result<Listener, FlowError> {
        self.listener_for(node, None, handler).await
    }

    /// Listener on a named input port.
    pub async fn listen_from<H: MessageHandler>(
        &self,
        node: &str,
        port: &str,
        handler: H,
    ) -> Result<Listener, FlowError> {
        self.listener_for(node, Some(port), handler).await
    }

    /// Listener reading straight from a declared (or template-matched) exchange.
    pub async fn listen_exchange<H: MessageHandler>(
        &self,
        exchange: &str,
        handler: H,
    ) -> Result<Listener, FlowError> {
        let route = self.router.route_exchange(exchange)?;
        self.listener_on(route, handler).await
    }

    fn sender_for(&self, node: &str, port: Option<&str>) -> Result<Sender, FlowError> {
        let route = self.router.route(node, port, Direction::Output)?;
        EndpointResolved {
            node,
            port,
            direction: Direction::Output,
            topic: &route.topic,
            kind: route.kind,
        }
        .log();
        self.sender_on(route)
    }

    fn sender_on(&self, route: Route) -> Result<Sender, FlowError> {
        let transport = self.router.transport_for(&route)?;
        Ok(Sender::new(
            route,
            transport,
            self.settings.max_payload_bytes,
            self.settings.send_timeout,
        ))
    }

    async fn listener_for<H: MessageHandler>(
        &self,
        node: &str,
        port: Option<&str>,
        handler: H,
    ) -> Result<Listener, FlowError> {
        let route = self.router.route(node, port, Direction::Input)?;
        EndpointResolved {
            node,
            port,
            direction: Direction::Input,
            topic: &route.topic,
            kind: route.kind,
        }
        .log();
        self.listener_on(route, handler).await
    }

    async fn listener_on<H: MessageHandler>(
        &self,
        route: Route,
        handler: H,
    ) -> Result<Listener, FlowError> {
        let transport = self.router.transport_for(&route)?;
        Ok(Listener::start(route, transport, handler).await?)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::consts::DEFAULT_NAMESPACE;
use crate::config::template::ExchangeTemplate;
use crate::config::validation::{default_port, port_binding, validate_dataflow};
use crate::config::{DataflowConfig, NodeConfig, PortConfig, TransportKind, TransportOptions};
use crate::errors::{ConfigError, ResolveError, ValidationError};
use crate::observability::messages::validation::{DataflowRejected, ValidationFinding};
use crate::observability::messages::StructuredLog;
use crate::router::{Route, Topic};

/// Direction of a port, seen from the node that owns it.
#[derive(Debug, Deserialize, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// A resolved port: direction plus the concrete exchange it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    pub name: String,
    pub direction: Direction,
    pub exchange: String,
}

/// A node with its ports and per-direction defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    name: String,
    ports: BTreeMap<String, PortDescriptor>,
    default_input: Option<String>,
    default_output: Option<String>,
}

impl NodeDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self, name: &str) -> Option<&PortDescriptor> {
        self.ports.get(name)
    }

    pub fn ports(&self) -> impl Iterator<Item = &PortDescriptor> {
        self.ports.values()
    }

    pub fn default_port(&self, direction: Direction) -> Option<&PortDescriptor> {
        let name = match direction {
            Direction::Input => self.default_input.as_ref(),
            Direction::Output => self.default_output.as_ref(),
        }?;
        self.ports.get(name)
    }
}

/// Transport options with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub default_kind: TransportKind,
    pub rendezvous_dir: PathBuf,
    pub channel_capacity: usize,
    pub max_payload_bytes: usize,
    pub send_timeout: Option<Duration>,
}

impl From<&TransportOptions> for TransportSettings {
    fn from(options: &TransportOptions) -> Self {
        Self {
            default_kind: options.get_default_kind(),
            rendezvous_dir: options.get_rendezvous_dir(),
            channel_capacity: options.get_channel_capacity(),
            max_payload_bytes: options.get_max_payload_bytes(),
            send_timeout: options.get_send_timeout(),
        }
    }
}

/// The in-memory dataflow graph.
///
/// Built once from a validated [`DataflowConfig`] and read-only afterwards.
/// Resolution is a pure function of the descriptor: two processes that load
/// the same source resolve every (node, port) to the same [`Topic`], which is
/// what lets them meet without a central registry.
#[derive(Debug, Clone)]
pub struct GraphDescriptor {
    version: String,
    namespace: String,
    nodes: BTreeMap<String, NodeDescriptor>,
    literal_exchanges: BTreeMap<String, TransportKind>,
    templated_exchanges: Vec<(ExchangeTemplate, TransportKind)>,
    transport: TransportSettings,
}

impl GraphDescriptor {
    /// Validate `cfg` and build the descriptor. `origin` labels log output.
    pub fn from_config(cfg: DataflowConfig, origin: &str) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        let nodes = normalize_nodes(&cfg, &mut errors);

        if let Err(found) = validate_dataflow(&cfg, &nodes) {
            errors.extend(found);
        }

        if !errors.is_empty() {
            DataflowRejected {
                origin,
                finding_count: errors.len(),
            }
            .log();
            for finding in &errors {
                ValidationFinding { origin, finding }.log();
            }
            return Err(ConfigError::Validation(errors));
        }

        let transport = TransportSettings::from(&cfg.transport);

        let mut literal_exchanges = BTreeMap::new();
        let mut templated_exchanges = Vec::new();
        for (name, exchange) in &cfg.exchanges {
            let kind = exchange.kind.unwrap_or(transport.default_kind);
            let template = ExchangeTemplate::parse(name).map_err(|reason| {
                ConfigError::Validation(vec![ValidationError::InvalidTemplate {
                    template: name.clone(),
                    reason,
                }])
            })?;
            if template.is_templated() {
                templated_exchanges.push((template, kind));
            } else {
                literal_exchanges.insert(name.clone(), kind);
            }
        }

        let mut node_map = BTreeMap::new();
        for node in &nodes {
            let mut ports = BTreeMap::new();
            for port in &node.ports {
                let exchange = port_binding(&node.name, port)
                    .map_err(|finding| ConfigError::Validation(vec![finding]))?;
                ports.insert(
                    port.name.clone(),
                    PortDescriptor {
                        name: port.name.clone(),
                        direction: port.direction,
                        exchange,
                    },
                );
            }

            node_map.insert(
                node.name.clone(),
                NodeDescriptor {
                    name: node.name.clone(),
                    ports,
                    default_input: default_port(node, Direction::Input)
                        .map_err(ConfigError::Validation)?,
                    default_output: default_port(node, Direction::Output)
                        .map_err(ConfigError::Validation)?,
                },
            );
        }

        Ok(Self {
            version: cfg.version,
            namespace: cfg
                .namespace
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            nodes: node_map,
            literal_exchanges,
            templated_exchanges,
            transport,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn transport(&self) -> &TransportSettings {
        &self.transport
    }

    pub fn node(&self, name: &str) -> Option<&NodeDescriptor> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.values()
    }

    /// Declared exchange keys, literal ones first, templates in key order.
    pub fn exchanges(&self) -> impl Iterator<Item = &str> {
        self.literal_exchanges
            .keys()
            .map(String::as_str)
            .chain(self.templated_exchanges.iter().map(|(t, _)| t.as_str()))
    }

    /// Resolve a node's port to its route.
    ///
    /// * `port: None` uses the node's default port for `direction`
    ///   ([`ResolveError::NoDefaultPort`] when there is none).
    /// * `port: Some(name)` must be declared on the node
    ///   ([`ResolveError::UnknownPort`]) and have the requested direction.
    pub fn resolve(
        &self,
        node: &str,
        port: Option<&str>,
        direction: Direction,
    ) -> Result<Route, ResolveError> {
        let node_desc = self.nodes.get(node).ok_or_else(|| ResolveError::UnknownNode {
            node: node.to_string(),
        })?;

        let port_desc = match port {
            Some(name) => {
                let port_desc = node_desc.port(name).ok_or_else(|| ResolveError::UnknownPort {
                    node: node.to_string(),
                    port: name.to_string(),
                })?;
                if port_desc.direction != direction {
                    return Err(ResolveError::WrongDirection {
                        node: node.to_string(),
                        port: name.to_string(),
                        expected: direction,
                        actual: port_desc.direction,
                    });
                }
                port_desc
            }
            None => node_desc
                .default_port(direction)
                .ok_or_else(|| ResolveError::NoDefaultPort {
                    node: node.to_string(),
                    direction,
                })?,
        };

        self.resolve_exchange(&port_desc.exchange)
    }

    /// Route for a concrete exchange name, literal or template-matched.
    pub fn resolve_exchange(&self, exchange: &str) -> Result<Route, ResolveError> {
        let kind = self
            .exchange_kind(exchange)
            .ok_or_else(|| ResolveError::UnknownExchange {
                exchange: exchange.to_string(),
            })?;

        Ok(Route {
            topic: Topic::new(self.namespace.as_str(), exchange),
            kind,
        })
    }

    fn exchange_kind(&self, exchange: &str) -> Option<TransportKind> {
        if let Some(kind) = self.literal_exchanges.get(exchange) {
            return Some(*kind);
        }
        let is_node = |name: &str| self.nodes.contains_key(name);
        self.templated_exchanges
            .iter()
            .find(|(template, _)| template.matches(exchange, &is_node))
            .map(|(_, kind)| *kind)
    }
}

/// Fold legacy `processors` and `connections` into the node list.
///
/// Each connection becomes a port named after its exchange on every listed
/// processor: `<` entries publish into it, `>` entries subscribe from it.
fn normalize_nodes(cfg: &DataflowConfig, errors: &mut Vec<ValidationError>) -> Vec<NodeConfig> {
    let mut nodes = cfg.nodes.clone();
    nodes.extend(cfg.processors.iter().map(|name| NodeConfig {
        name: name.clone(),
        ports: Vec::new(),
        defaults: Default::default(),
    }));

    for (exchange, connection) in &cfg.connections {
        let sides = [
            (&connection.publishers, Direction::Output),
            (&connection.subscribers, Direction::Input),
        ];
        for (names, direction) in sides {
            for name in names {
                match nodes.iter_mut().find(|node| &node.name == name) {
                    Some(node) => node.ports.push(PortConfig {
                        name: exchange.clone(),
                        direction,
                        exchange: Some(exchange.clone()),
                        default: false,
                    }),
                    None => errors.push(ValidationError::UnknownProcessor {
                        exchange: exchange.clone(),
                        processor: name.clone(),
                    }),
                }
            }
        }
    }

    nodes
}

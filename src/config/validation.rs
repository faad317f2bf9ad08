// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dataflow validation.
//!
//! Every check runs over the normalized node list (legacy processor/connection
//! entries already turned into ports) and contributes its findings to a single
//! list, so a broken file reports all of its problems in one load.
//!
//! # Checks
//!
//! 1. **Version**: the `version` major component is supported
//! 2. **Transport options**: capacities, payload bound and timeout are non-zero
//! 3. **Node uniqueness**: node names are unique
//! 4. **Port uniqueness**: port names are unique within a node
//! 5. **Default ports**: `defaults` entries name declared ports of the right
//!    direction and at most one default exists per direction
//! 6. **Exchange references**: every port binding expands to an exchange that
//!    is declared literally or matched by a declared template
//!
//! Exchange reference checks need parseable templates: when a declared
//! exchange key is malformed only the port bindings themselves are checked.

use std::collections::{BTreeSet, HashSet};

use crate::config::consts::SUPPORTED_MAJOR_VERSION;
use crate::config::template::ExchangeTemplate;
use crate::config::{DataflowConfig, Direction, NodeConfig, PortConfig, TransportOptions};
use crate::errors::ValidationError;

/// Validates a dataflow description.
///
/// # Arguments
///
/// * `cfg` - The parsed description (version, transport options, exchanges)
/// * `nodes` - The normalized node list built from `cfg`
///
/// # Returns
///
/// * `Ok(())` - The description can be turned into a graph descriptor
/// * `Err(Vec<ValidationError>)` - Every finding, in check order
pub fn validate_dataflow(
    cfg: &DataflowConfig,
    nodes: &[NodeConfig],
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_version(&cfg.version));
    errors.extend(validate_transport_options(&cfg.transport));
    errors.extend(validate_unique_node_names(nodes));
    errors.extend(validate_unique_port_names(nodes));

    for node in nodes {
        for direction in [Direction::Input, Direction::Output] {
            if let Err(found) = default_port(node, direction) {
                errors.extend(found);
            }
        }
    }

    match DeclaredExchanges::from_config(cfg) {
        Ok(declared) => errors.extend(validate_exchange_references(nodes, Some(&declared))),
        Err(found) => {
            errors.extend(found);
            errors.extend(validate_exchange_references(nodes, None));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_version(version: &str) -> Option<ValidationError> {
    let major = version
        .trim()
        .split('.')
        .next()
        .and_then(|major| major.parse::<u64>().ok());

    match major {
        Some(SUPPORTED_MAJOR_VERSION) => None,
        _ => Some(ValidationError::UnsupportedVersion {
            version: version.to_string(),
        }),
    }
}

fn validate_transport_options(options: &TransportOptions) -> Vec<ValidationError> {
    let checks: [(&'static str, Option<u64>); 3] = [
        ("channel_capacity", options.channel_capacity.map(|v| v as u64)),
        ("max_payload_bytes", options.max_payload_bytes.map(|v| v as u64)),
        ("send_timeout_ms", options.send_timeout_ms),
    ];

    checks
        .into_iter()
        .filter(|(_, value)| *value == Some(0))
        .map(|(option, _)| ValidationError::InvalidTransportOption {
            option,
            reason: "must be greater than zero".to_string(),
        })
        .collect()
}

fn validate_unique_node_names(nodes: &[NodeConfig]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut errors = Vec::new();

    for node in nodes {
        if !seen.insert(node.name.as_str()) && reported.insert(node.name.as_str()) {
            errors.push(ValidationError::DuplicateNode {
                node: node.name.clone(),
            });
        }
    }

    errors
}

fn validate_unique_port_names(nodes: &[NodeConfig]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for node in nodes {
        let mut seen = HashSet::new();
        for port in &node.ports {
            if !seen.insert(port.name.as_str()) {
                errors.push(ValidationError::DuplicatePort {
                    node: node.name.clone(),
                    port: port.name.clone(),
                });
            }
        }
    }

    errors
}

/// Determines the default port of `node` for `direction`.
///
/// An explicit choice (`defaults.<direction>` or `default: true` on a port)
/// wins; otherwise a node with exactly one port of that direction uses it.
pub(crate) fn default_port(
    node: &NodeConfig,
    direction: Direction,
) -> Result<Option<String>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut explicit = BTreeSet::new();

    let named = match direction {
        Direction::Input => node.defaults.input.as_ref(),
        Direction::Output => node.defaults.output.as_ref(),
    };

    if let Some(name) = named {
        match node.ports.iter().find(|port| &port.name == name) {
            None => errors.push(ValidationError::UndeclaredPort {
                node: node.name.clone(),
                port: name.clone(),
            }),
            Some(port) if port.direction != direction => {
                errors.push(ValidationError::DefaultDirectionMismatch {
                    node: node.name.clone(),
                    port: name.clone(),
                    expected: direction,
                })
            }
            Some(port) => {
                explicit.insert(port.name.clone());
            }
        }
    }

    for port in node.ports.iter().filter(|port| port.default) {
        if port.direction == direction {
            explicit.insert(port.name.clone());
        }
    }

    if explicit.len() > 1 {
        errors.push(ValidationError::MultipleDefaultPorts {
            node: node.name.clone(),
            direction,
            ports: explicit.iter().cloned().collect(),
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    if let Some(name) = explicit.into_iter().next() {
        return Ok(Some(name));
    }

    let mut candidates = node.ports.iter().filter(|port| port.direction == direction);
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Ok(Some(only.name.clone())),
        _ => Ok(None),
    }
}

/// Exchange names declared in `exchanges`, split into literal names and templates.
pub(crate) struct DeclaredExchanges {
    pub(crate) literals: HashSet<String>,
    pub(crate) templates: Vec<ExchangeTemplate>,
}

impl DeclaredExchanges {
    pub(crate) fn from_config(cfg: &DataflowConfig) -> Result<Self, Vec<ValidationError>> {
        let mut literals = HashSet::new();
        let mut templates = Vec::new();
        let mut errors = Vec::new();

        for name in cfg.exchanges.keys() {
            match ExchangeTemplate::parse(name) {
                Ok(template) if template.is_templated() => templates.push(template),
                Ok(_) => {
                    literals.insert(name.clone());
                }
                Err(reason) => errors.push(ValidationError::InvalidTemplate {
                    template: name.clone(),
                    reason,
                }),
            }
        }

        if errors.is_empty() {
            Ok(Self { literals, templates })
        } else {
            Err(errors)
        }
    }

    /// The declared exchange key `concrete` falls under, if any. Literal
    /// declarations win over templates; templates are tried in key order.
    pub(crate) fn lookup<'a>(
        &'a self,
        concrete: &'a str,
        is_node: &dyn Fn(&str) -> bool,
    ) -> Option<&'a str> {
        if let Some(literal) = self.literals.get(concrete) {
            return Some(literal.as_str());
        }
        self.templates
            .iter()
            .find(|template| template.matches(concrete, is_node))
            .map(|template| template.as_str())
    }
}

/// Concrete exchange name a port is bound to.
pub(crate) fn port_binding(node: &str, port: &PortConfig) -> Result<String, ValidationError> {
    let raw = port.exchange.as_deref().unwrap_or(&port.name);
    ExchangeTemplate::parse(raw)
        .map(|template| template.expand(node, &port.name))
        .map_err(|reason| ValidationError::InvalidTemplate {
            template: raw.to_string(),
            reason,
        })
}

fn validate_exchange_references(
    nodes: &[NodeConfig],
    declared: Option<&DeclaredExchanges>,
) -> Vec<ValidationError> {
    let node_names: HashSet<&str> = nodes.iter().map(|node| node.name.as_str()).collect();
    let is_node = |name: &str| node_names.contains(name);
    let mut errors = Vec::new();

    for node in nodes {
        for port in &node.ports {
            match port_binding(&node.name, port) {
                Ok(exchange) => {
                    let Some(declared) = declared else {
                        continue;
                    };
                    if declared.lookup(&exchange, &is_node).is_none() {
                        errors.push(ValidationError::DanglingExchange {
                            node: node.name.clone(),
                            port: port.name.clone(),
                            exchange,
                        });
                    }
                }
                Err(err) => errors.push(err),
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, DataflowFormat};

    fn findings(yaml: &str) -> Vec<ValidationError> {
        let cfg = parse_config(yaml, DataflowFormat::Yaml, "test").unwrap();
        let nodes = cfg.nodes.clone();
        validate_dataflow(&cfg, &nodes).err().unwrap_or_default()
    }

    #[test]
    fn valid_dataflow_has_no_findings() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: publisher
    ports: [{ name: OUTPUT, direction: output, exchange: ticks }]
  - name: subscriber
    ports: [{ name: INPUT, direction: input, exchange: ticks }]
exchanges:
  ticks: {}
"#,
        );
        assert!(errors.is_empty(), "unexpected findings: {:?}", errors);
    }

    #[test]
    fn unsupported_version_is_reported() {
        let errors = findings("version: \"2.0\"\n");
        assert_eq!(
            errors,
            vec![ValidationError::UnsupportedVersion {
                version: "2.0".to_string()
            }]
        );
    }

    #[test]
    fn zero_transport_options_are_reported() {
        let errors = findings(
            r#"
version: "0.1"
transport: { channel_capacity: 0, send_timeout_ms: 0 }
"#,
        );
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::InvalidTransportOption { .. })));
    }

    #[test]
    fn duplicate_nodes_and_ports_are_reported_once() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: a
    ports:
      - { name: OUT, direction: output, exchange: x }
      - { name: OUT, direction: output, exchange: x }
  - name: a
  - name: a
exchanges:
  x: {}
"#,
        );
        assert!(errors.contains(&ValidationError::DuplicateNode { node: "a".into() }));
        assert!(errors.contains(&ValidationError::DuplicatePort {
            node: "a".into(),
            port: "OUT".into()
        }));
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, ValidationError::DuplicateNode { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn default_referencing_undeclared_port_is_reported() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: merger
    defaults: { output: OUTPUT }
    ports:
      - { name: VIDEO, direction: input, exchange: video }
exchanges:
  video: {}
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::UndeclaredPort {
                node: "merger".into(),
                port: "OUTPUT".into()
            }]
        );
    }

    #[test]
    fn default_with_wrong_direction_is_reported() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: merger
    defaults: { input: OUTPUT }
    ports:
      - { name: OUTPUT, direction: output, exchange: merged }
exchanges:
  merged: {}
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::DefaultDirectionMismatch {
                node: "merger".into(),
                port: "OUTPUT".into(),
                expected: Direction::Input,
            }]
        );
    }

    #[test]
    fn multiple_default_ports_are_reported() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: loader
    ports:
      - { name: A, direction: output, exchange: x, default: true }
      - { name: B, direction: output, exchange: x, default: true }
exchanges:
  x: {}
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::MultipleDefaultPorts {
                node: "loader".into(),
                direction: Direction::Output,
                ports: vec!["A".into(), "B".into()],
            }]
        );
    }

    #[test]
    fn dangling_exchange_is_reported() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: loader
    ports: [{ name: OUTPUT, direction: output, exchange: nowhere }]
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::DanglingExchange {
                node: "loader".into(),
                port: "OUTPUT".into(),
                exchange: "nowhere".into(),
            }]
        );
    }

    #[test]
    fn templated_exchange_satisfies_references() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: video-capture
    ports: [{ name: OUTPUT, direction: output, exchange: "exchange-{node}" }]
  - name: matcher
    ports: [{ name: exchange-video-capture, direction: input }]
  - name: stray
    ports: [{ name: exchange-radar, direction: input }]
exchanges:
  "exchange-{node}": {}
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::DanglingExchange {
                node: "stray".into(),
                port: "exchange-radar".into(),
                exchange: "exchange-radar".into(),
            }]
        );
    }

    #[test]
    fn malformed_templates_are_reported() {
        let errors = findings(
            r#"
version: "0.1.0"
nodes:
  - name: loader
    ports: [{ name: OUTPUT, direction: output, exchange: "{host}" }]
exchanges:
  "broken-{node": {}
"#,
        );
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::InvalidTemplate { .. })));
    }

    #[test]
    fn single_port_is_implicit_default() {
        let cfg = parse_config(
            r#"
version: "0.1.0"
nodes:
  - name: loader
    ports:
      - { name: OUTPUT, direction: output, exchange: x }
      - { name: IN1, direction: input, exchange: x }
      - { name: IN2, direction: input, exchange: x }
exchanges:
  x: {}
"#,
            DataflowFormat::Yaml,
            "test",
        )
        .unwrap();

        let node = &cfg.nodes[0];
        assert_eq!(default_port(node, Direction::Output).unwrap(), Some("OUTPUT".into()));
        assert_eq!(default_port(node, Direction::Input).unwrap(), None);
    }
}

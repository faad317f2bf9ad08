// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Direction;

/// Errors found while validating a dataflow description.
///
/// Validation accumulates every finding instead of stopping at the first one,
/// so a single load reports all of them at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The `version` field is not a version this runtime understands
    UnsupportedVersion {
        version: String,
    },
    /// Two nodes (or a node and a legacy processor) share a name
    DuplicateNode {
        node: String,
    },
    /// A node declares the same port name twice
    DuplicatePort {
        node: String,
        port: String,
    },
    /// A node's `defaults` entry names a port the node never declares
    UndeclaredPort {
        node: String,
        port: String,
    },
    /// A node's `defaults` entry names a port of the other direction
    DefaultDirectionMismatch {
        node: String,
        port: String,
        expected: Direction,
    },
    /// More than one port is flagged as default for the same direction
    MultipleDefaultPorts {
        node: String,
        direction: Direction,
        ports: Vec<String>,
    },
    /// A port is bound to an exchange that is neither declared nor matched by a template
    DanglingExchange {
        node: String,
        port: String,
        exchange: String,
    },
    /// A legacy `connections` entry lists a processor that is not declared
    UnknownProcessor {
        exchange: String,
        processor: String,
    },
    /// An exchange name contains a malformed or unknown placeholder
    InvalidTemplate {
        template: String,
        reason: String,
    },
    /// A transport option is out of range
    InvalidTransportOption {
        option: &'static str,
        reason: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnsupportedVersion { version } => {
                write!(f, "Unsupported dataflow version '{}'", version)
            }
            ValidationError::DuplicateNode { node } => {
                write!(f, "Duplicate node name: '{}'", node)
            }
            ValidationError::DuplicatePort { node, port } => {
                write!(f, "Node '{}' declares port '{}' more than once", node, port)
            }
            ValidationError::UndeclaredPort { node, port } => {
                write!(
                    f,
                    "Node '{}' references port '{}' which is not declared",
                    node, port
                )
            }
            ValidationError::DefaultDirectionMismatch {
                node,
                port,
                expected,
            } => {
                write!(
                    f,
                    "Node '{}' uses port '{}' as default {} port but it is not an {} port",
                    node, port, expected, expected
                )
            }
            ValidationError::MultipleDefaultPorts {
                node,
                direction,
                ports,
            } => {
                write!(
                    f,
                    "Node '{}' has more than one default {} port: [{}]",
                    node,
                    direction,
                    ports.join(", ")
                )
            }
            ValidationError::DanglingExchange {
                node,
                port,
                exchange,
            } => {
                write!(
                    f,
                    "Port '{}' on node '{}' is bound to exchange '{}' which does not exist",
                    port, node, exchange
                )
            }
            ValidationError::UnknownProcessor {
                exchange,
                processor,
            } => {
                write!(
                    f,
                    "Exchange '{}' connects processor '{}' which is not declared",
                    exchange, processor
                )
            }
            ValidationError::InvalidTemplate { template, reason } => {
                write!(f, "Invalid exchange template '{}': {}", template, reason)
            }
            ValidationError::InvalidTransportOption { option, reason } => {
                write!(f, "Invalid transport option '{}': {}", option, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a dataflow description.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read dataflow file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported dataflow format '{extension}' for '{}' (expected yaml, yml, json or toml)", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Unable to parse dataflow '{origin}': {message}")]
    Parse { origin: String, message: String },

    #[error("Dataflow validation failed:\n{}", join_findings(.0))]
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// Validation findings, if this error came from validation.
    pub fn findings(&self) -> &[ValidationError] {
        match self {
            ConfigError::Validation(findings) => findings,
            _ => &[],
        }
    }
}

fn join_findings(findings: &[ValidationError]) -> String {
    findings
        .iter()
        .map(|finding| finding.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

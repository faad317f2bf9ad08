// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::config::Direction;

/// A node/port/exchange lookup that the loaded graph cannot satisfy.
///
/// These are recoverable: they are returned by the factory call that asked
/// for the missing coordinate and leave the `Flow` untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Node '{node}' is not declared in the dataflow")]
    UnknownNode { node: String },

    #[error("Port '{port}' is not declared on node '{node}'")]
    UnknownPort { node: String, port: String },

    #[error("Node '{node}' declares no default {direction} port")]
    NoDefaultPort { node: String, direction: Direction },

    #[error("Port '{port}' on node '{node}' is an {actual} port, expected an {expected} port")]
    WrongDirection {
        node: String,
        port: String,
        expected: Direction,
        actual: Direction,
    },

    #[error("Exchange '{exchange}' is not declared in the dataflow")]
    UnknownExchange { exchange: String },
}

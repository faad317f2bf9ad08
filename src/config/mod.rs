// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod descriptor;
mod loader;
mod template;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use descriptor::{Direction, GraphDescriptor, NodeDescriptor, PortDescriptor, TransportSettings};
pub use loader::{
    load_and_validate, load_config, parse_and_validate, parse_config, ConnectionConfig,
    DataflowConfig, DataflowFormat, DefaultPorts, ExchangeConfig, NodeConfig, PortConfig,
    TransportKind, TransportOptions,
};
pub use template::ExchangeTemplate;
pub use validation::validate_dataflow;

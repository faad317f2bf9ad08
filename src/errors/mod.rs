// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod dispatch;
mod flow;
mod resolve;
mod send;

pub use config::{ConfigError, ValidationError};
pub use dispatch::{DispatchError, HandlerError};
pub use flow::FlowError;
pub use resolve::ResolveError;
pub use send::{SendError, TransportError};

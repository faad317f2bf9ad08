// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Transport implementations.
//!
//! * [`LocalBus`] - in-process delivery over bounded channels
//! * [`UnixSocketTransport`] - cross-process delivery over unix domain sockets
//!   discovered through a shared rendezvous directory (unix targets only)

mod factory;
mod local;
#[cfg(unix)]
mod unix;

pub use factory::TransportSet;
pub use local::LocalBus;
#[cfg(unix)]
pub use unix::UnixSocketTransport;

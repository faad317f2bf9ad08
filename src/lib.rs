// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative pub/sub dataflow runtime.
//!
//! Processes load a shared dataflow description, build [`Sender`]s and
//! [`Listener`]s on named node ports, and exchange opaque byte payloads
//! without knowing about each other. Two processes that load the same
//! description resolve every node port to the same topic.
//!
//! ```no_run
//! use easyflow::traits::handler_fn;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let flow = easyflow::load_dataflow("configs/pubsub.yaml")?;
//!
//! let listener = flow
//!     .listen("subscriber", handler_fn(|payload| {
//!         tracing::info!(len = payload.len(), "got payload");
//!         Ok(())
//!     }))
//!     .await?;
//!
//! let sender = flow.build_sender("publisher")?;
//! sender.send(1u32.to_le_bytes().to_vec()).await?;
//!
//! listener.cancel();
//! listener.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod config;        // dataflow description, validation, resolution
pub mod engine;        // senders, listeners, dispatch
pub mod errors;        // error handling
pub mod flow;          // per-process entry point
pub mod observability;
pub mod router;        // topics and subscriber registry
pub mod traits;        // transport and handler seams
pub mod transport;     // transport implementations

use std::path::Path;

pub use config::Direction;
pub use engine::{Listener, ListenerState, ListenerStats, PairJoin, Sender};
pub use errors::FlowError;
pub use flow::{Flow, FlowBuilder};
pub use router::Topic;
pub use traits::{async_handler_fn, handler_fn, MessageHandler, Payload};

/// Load the dataflow at `path` with the built-in transports.
pub fn load_dataflow<P: AsRef<Path>>(path: P) -> Result<Flow, FlowError> {
    Flow::load_dataflow(path)
}

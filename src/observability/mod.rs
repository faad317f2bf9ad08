// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic and operational log line emitted by easyflow goes through
//! a message type from [`messages`]. Each type implements `Display` for the
//! human-readable line and [`messages::StructuredLog`] to attach the same data
//! as structured `tracing` fields, so log text and field names stay in one
//! place instead of being scattered across call sites.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::flow` - Dataflow loading, sender and listener construction
//! * `messages::dispatch` - Listener lifecycle and callback failures
//! * `messages::transport` - Socket binding, peer discovery and frame errors
//! * `messages::validation` - Configuration findings
//!
//! # Usage
//!
//! ```rust
//! use easyflow::observability::messages::flow::DataflowLoaded;
//! use easyflow::observability::messages::StructuredLog;
//!
//! DataflowLoaded {
//!     origin: "configs/pubsub.yaml",
//!     namespace: "pubsub",
//!     node_count: 2,
//!     exchange_count: 1,
//! }
//! .log();
//! ```
//!
//! Installing a subscriber is left to the application; the demos use
//! `tracing_subscriber::fmt` with an `EnvFilter` read from `RUST_LOG`.

pub mod messages;

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `flow` - Dataflow loading and endpoint construction
//! * `dispatch` - Listener lifecycle and callback failures
//! * `transport` - Transport-level events
//! * `validation` - Configuration findings

use std::fmt::Display;

use tracing::Span;

pub mod dispatch;
pub mod flow;
pub mod transport;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog: Display {
    /// Emit the message at its level with its fields attached.
    fn log(&self);

    /// A span carrying the same fields, for wrapping the work the message describes.
    fn span(&self, name: &str) -> Span;
}

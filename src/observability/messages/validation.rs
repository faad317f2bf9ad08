// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration validation.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A single validation finding.
///
/// # Log Level
/// `warn!` - Every finding is logged before the load fails as a whole
///
/// # Example
/// ```
/// use easyflow::errors::ValidationError;
/// use easyflow::observability::messages::validation::ValidationFinding;
///
/// let finding = ValidationError::DuplicateNode { node: "merger".into() };
/// let msg = ValidationFinding {
///     origin: "configs/video_lidar_merge.yaml",
///     finding: &finding,
/// };
///
/// assert!(msg.to_string().contains("merger"));
/// ```
pub struct ValidationFinding<'a> {
    pub origin: &'a str,
    pub finding: &'a ValidationError,
}

impl Display for ValidationFinding<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Invalid dataflow '{}': {}", self.origin, self.finding)
    }
}

impl StructuredLog for ValidationFinding<'_> {
    fn log(&self) {
        tracing::warn!(
            origin = self.origin,
            finding = %self.finding,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "validation_finding",
            span_name = name,
            origin = self.origin,
            finding = %self.finding,
        )
    }
}

/// Dataflow rejected after validation.
///
/// # Log Level
/// `error!` - The dataflow cannot be used
pub struct DataflowRejected<'a> {
    pub origin: &'a str,
    pub finding_count: usize,
}

impl Display for DataflowRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dataflow '{}' rejected with {} finding(s)",
            self.origin, self.finding_count
        )
    }
}

impl StructuredLog for DataflowRejected<'_> {
    fn log(&self) {
        tracing::error!(
            origin = self.origin,
            finding_count = self.finding_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "dataflow_rejected",
            span_name = name,
            origin = self.origin,
            finding_count = self.finding_count,
        )
    }
}

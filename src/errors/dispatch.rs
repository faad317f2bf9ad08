// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::router::Topic;

/// Error type returned by message handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single failed callback invocation, reported at the dispatch boundary.
///
/// The dispatch loop keeps running after reporting one of these.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Callback on topic '{topic}' failed: {source}")]
    Callback {
        topic: Topic,
        #[source]
        source: HandlerError,
    },

    #[error("Callback on topic '{topic}' panicked: {message}")]
    Panicked { topic: Topic, message: String },
}

impl DispatchError {
    pub fn topic(&self) -> &Topic {
        match self {
            DispatchError::Callback { topic, .. } | DispatchError::Panicked { topic, .. } => topic,
        }
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use thiserror::Error;

use crate::config::TransportKind;
use crate::router::Topic;

/// Channel-level failures reported by a [`Transport`](crate::traits::Transport).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No live subscriber on topic '{topic}'")]
    NoSubscriber { topic: Topic },

    #[error("Channel for topic '{topic}' is not ready: {reason}")]
    NotReady { topic: Topic, reason: String },

    #[error("Transport '{kind}' is not available in this process")]
    Unsupported { kind: TransportKind },

    #[error("Frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("I/O error on topic '{topic}': {source}")]
    Io {
        topic: Topic,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a failed [`Sender::send`](crate::engine::Sender::send).
///
/// Every variant is returned to the caller; none of them is fatal to the
/// process, so publishers keep running while subscribers come and go.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Topic '{topic}' cannot accept writes yet: {reason}")]
    NotReady { topic: Topic, reason: String },

    #[error("No subscriber is listening on topic '{topic}'; payload dropped")]
    NoSubscriber { topic: Topic },

    #[error("Send on topic '{topic}' timed out after {after:?}")]
    Timeout { topic: Topic, after: Duration },

    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Transport(TransportError),
}

impl SendError {
    /// Whether retrying the same send later can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SendError::NotReady { .. } | SendError::NoSubscriber { .. } | SendError::Timeout { .. } => {
                true
            }
            SendError::PayloadTooLarge { .. } => false,
            SendError::Transport(TransportError::Unsupported { .. }) => false,
            SendError::Transport(_) => true,
        }
    }
}

impl From<TransportError> for SendError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NoSubscriber { topic } => SendError::NoSubscriber { topic },
            TransportError::NotReady { topic, reason } => SendError::NotReady { topic, reason },
            TransportError::FrameTooLarge { size, limit } => SendError::PayloadTooLarge { size, limit },
            other => SendError::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_map_to_send_variants() {
        let topic = Topic::new("ns", "video");

        let err = SendError::from(TransportError::NoSubscriber { topic: topic.clone() });
        assert!(matches!(err, SendError::NoSubscriber { .. }));
        assert!(err.is_retryable());

        let err = SendError::from(TransportError::FrameTooLarge { size: 10, limit: 4 });
        assert!(matches!(err, SendError::PayloadTooLarge { size: 10, limit: 4 }));
        assert!(!err.is_retryable());

        let err = SendError::from(TransportError::Unsupported {
            kind: TransportKind::Unix,
        });
        assert!(!err.is_retryable());
    }
}

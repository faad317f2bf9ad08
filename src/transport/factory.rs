// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{TransportKind, TransportSettings};
use crate::errors::TransportError;
use crate::traits::Transport;
use crate::transport::LocalBus;

/// Transport implementations available to a flow, one per [`TransportKind`].
#[derive(Clone, Default)]
pub struct TransportSet {
    transports: HashMap<TransportKind, Arc<dyn Transport>>,
}

impl TransportSet {
    /// The built-in transports configured from `settings`.
    ///
    /// The unix transport is only present on unix targets; elsewhere routes
    /// to `type: unix` exchanges fail with [`TransportError::Unsupported`].
    pub fn from_settings(settings: &TransportSettings) -> Self {
        let mut set = Self::default();
        set.insert(Arc::new(LocalBus::new(settings.channel_capacity)));

        #[cfg(unix)]
        set.insert(Arc::new(crate::transport::UnixSocketTransport::new(
            settings.rendezvous_dir.clone(),
            settings.channel_capacity,
            settings.max_payload_bytes,
        )));

        set
    }

    /// Install `transport` for its kind, returning the one it replaces.
    pub fn insert(&mut self, transport: Arc<dyn Transport>) -> Option<Arc<dyn Transport>> {
        self.transports.insert(transport.kind(), transport)
    }

    pub fn get(&self, kind: TransportKind) -> Result<Arc<dyn Transport>, TransportError> {
        self.transports
            .get(&kind)
            .cloned()
            .ok_or(TransportError::Unsupported { kind })
    }

    pub fn contains(&self, kind: TransportKind) -> bool {
        self.transports.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportOptions;

    #[test]
    fn settings_install_builtin_transports() {
        let settings = TransportSettings::from(&TransportOptions::default());
        let set = TransportSet::from_settings(&settings);

        assert_eq!(set.get(TransportKind::Local).unwrap().name(), "local_bus");
        #[cfg(unix)]
        assert_eq!(set.get(TransportKind::Unix).unwrap().name(), "unix_socket");
    }

    #[test]
    fn missing_transport_is_unsupported() {
        let set = TransportSet::default();
        assert!(matches!(
            set.get(TransportKind::Unix),
            Err(TransportError::Unsupported {
                kind: TransportKind::Unix
            })
        ));
    }

    #[test]
    fn insert_replaces_by_kind() {
        let mut set = TransportSet::default();
        assert!(set.insert(Arc::new(LocalBus::new(1))).is_none());
        assert!(set.insert(Arc::new(LocalBus::new(2))).is_some());
        assert!(set.contains(TransportKind::Local));
    }
}

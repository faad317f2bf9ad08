use crate::config::TransportKind;

/// Namespace used when a dataflow does not declare one
pub const DEFAULT_NAMESPACE: &str = "default";
/// Bounded queue depth per subscription (messages)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
/// Largest payload accepted by a sender (16 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;
/// Directory name under the system temp dir holding unix socket rendezvous points
pub const RENDEZVOUS_DIR_NAME: &str = "easyflow";
/// Only `0.x` dataflow descriptions are understood
pub const SUPPORTED_MAJOR_VERSION: u64 = 0;
/// Transport for exchanges that name none: cross-process where the platform allows it
#[cfg(unix)]
pub const DEFAULT_TRANSPORT_KIND: TransportKind = TransportKind::Unix;
/// Transport for exchanges that name none: cross-process where the platform allows it
#[cfg(not(unix))]
pub const DEFAULT_TRANSPORT_KIND: TransportKind = TransportKind::Local;

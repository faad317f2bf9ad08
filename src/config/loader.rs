// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::consts::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_TRANSPORT_KIND,
    RENDEZVOUS_DIR_NAME,
};
use crate::config::GraphDescriptor;
use crate::errors::ConfigError;

/// Top-level dataflow description as written in the configuration file.
///
/// Two shapes are accepted and may be combined:
///
/// * the node-centric form, where each entry of `nodes` declares its ports and
///   the exchange each port is bound to;
/// * the processor/connection form, where `processors` lists bare names and
///   `connections` attaches them to exchanges with `<` (publish into) and
///   `>` (subscribe from).
///
/// # Example
/// ```yaml
/// version: "0.1.0"
/// namespace: pubsub
/// transport:
///   default: unix
/// nodes:
///   - name: publisher
///     ports:
///       - { name: OUTPUT, direction: output, exchange: ticks }
///   - name: subscriber
///     ports:
///       - { name: INPUT, direction: input, exchange: ticks }
/// exchanges:
///   ticks: {}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DataflowConfig {
    pub version: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub transport: TransportOptions,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub processors: Vec<String>,
    #[serde(default)]
    pub exchanges: BTreeMap<String, ExchangeConfig>,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

/// Transport implementation backing an exchange.
///
/// # Variants
/// * `Local` - In-process bus, delivery only between senders and listeners of the same process
/// * `Unix` - Unix domain sockets discovered through a shared rendezvous directory
#[derive(Debug, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Local,
    Unix,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Local => write!(f, "local"),
            TransportKind::Unix => write!(f, "unix"),
        }
    }
}

/// Transport tuning shared by every exchange of the dataflow.
///
/// All fields are optional; the getters fall back to the built-in defaults.
///
/// # Example
/// ```yaml
/// transport:
///   default: unix
///   rendezvous_dir: /run/easyflow
///   channel_capacity: 128
///   max_payload_bytes: 1048576
///   send_timeout_ms: 2000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportOptions {
    pub default: Option<TransportKind>,
    pub rendezvous_dir: Option<PathBuf>,
    pub channel_capacity: Option<usize>,
    pub max_payload_bytes: Option<usize>,
    pub send_timeout_ms: Option<u64>,
}

impl TransportOptions {
    /// Transport used by exchanges that do not name one; `unix` on unix targets.
    pub fn get_default_kind(&self) -> TransportKind {
        self.default.unwrap_or(DEFAULT_TRANSPORT_KIND)
    }

    /// Rendezvous directory, `<temp>/easyflow` when not configured.
    pub fn get_rendezvous_dir(&self) -> PathBuf {
        self.rendezvous_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(RENDEZVOUS_DIR_NAME))
    }

    pub fn get_channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn get_max_payload_bytes(&self) -> usize {
        self.max_payload_bytes.unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES)
    }

    pub fn get_send_timeout(&self) -> Option<Duration> {
        self.send_timeout_ms.map(Duration::from_millis)
    }
}

/// A node and its ports.
///
/// # Example
/// ```yaml
/// name: merger
/// defaults: { output: OUTPUT }
/// ports:
///   - { name: VIDEO,  direction: input,  exchange: video }
///   - { name: LIDAR,  direction: input,  exchange: lidar }
///   - { name: OUTPUT, direction: output, exchange: merged }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    #[serde(default)]
    pub ports: Vec<PortConfig>,
    #[serde(default)]
    pub defaults: DefaultPorts,
}

/// Default port names per direction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultPorts {
    pub input: Option<String>,
    pub output: Option<String>,
}

/// A named, directional port. `exchange` defaults to the port name and may
/// use the `{node}` and `{port}` placeholders.
#[derive(Debug, Clone, Deserialize)]
pub struct PortConfig {
    pub name: String,
    pub direction: super::Direction,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub default: bool,
}

/// Per-exchange parameters. The key in `exchanges` is the exchange name,
/// optionally templated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeConfig {
    #[serde(rename = "type", default)]
    pub kind: Option<TransportKind>,
}

/// Processor/connection form: which processors publish into (`<`) and
/// subscribe from (`>`) an exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionConfig {
    #[serde(rename = "<", default)]
    pub publishers: Vec<String>,
    #[serde(rename = ">", default)]
    pub subscribers: Vec<String>,
}

/// Serialization format of a dataflow file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataflowFormat {
    Yaml,
    Json,
    Toml,
}

impl DataflowFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "yaml" | "yml" => Ok(DataflowFormat::Yaml),
            "json" => Ok(DataflowFormat::Json),
            "toml" => Ok(DataflowFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Parse a dataflow description from text. `origin` only labels errors.
pub fn parse_config(
    content: &str,
    format: DataflowFormat,
    origin: &str,
) -> Result<DataflowConfig, ConfigError> {
    let parsed = match format {
        DataflowFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        DataflowFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DataflowFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| ConfigError::Parse {
        origin: origin.to_string(),
        message,
    })
}

/// Load a dataflow description from a file without validating it.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DataflowConfig, ConfigError> {
    let path = path.as_ref();
    let format = DataflowFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, format, &path.display().to_string())
}

/// Load, validate and resolve a dataflow file into a [`GraphDescriptor`].
///
/// Fails with [`ConfigError::Validation`] listing every finding when the
/// graph is inconsistent.
pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<GraphDescriptor, ConfigError> {
    let path = path.as_ref();
    let cfg = load_config(path)?;
    GraphDescriptor::from_config(cfg, &path.display().to_string())
}

/// Same as [`load_and_validate`] for in-memory text.
pub fn parse_and_validate(
    content: &str,
    format: DataflowFormat,
) -> Result<GraphDescriptor, ConfigError> {
    let origin = "<inline>";
    let cfg = parse_config(content, format, origin)?;
    GraphDescriptor::from_config(cfg, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;

    #[test]
    fn parse_node_centric_config() {
        let yaml = r#"
version: "0.1.0"
namespace: video-lidar
transport:
  default: unix
  channel_capacity: 8
nodes:
  - name: merger
    defaults: { output: OUTPUT }
    ports:
      - { name: VIDEO, direction: input, exchange: video }
      - { name: OUTPUT, direction: output, exchange: merged }
exchanges:
  video: { type: unix }
  merged: {}
"#;

        let cfg = parse_config(yaml, DataflowFormat::Yaml, "test").unwrap();
        assert_eq!(cfg.version, "0.1.0");
        assert_eq!(cfg.namespace.as_deref(), Some("video-lidar"));
        assert_eq!(cfg.transport.get_default_kind(), TransportKind::Unix);
        assert_eq!(cfg.transport.get_channel_capacity(), 8);
        assert_eq!(cfg.nodes[0].ports[0].direction, Direction::Input);
        assert_eq!(cfg.nodes[0].defaults.output.as_deref(), Some("OUTPUT"));
        assert_eq!(cfg.exchanges["video"].kind, Some(TransportKind::Unix));
        assert_eq!(cfg.exchanges["merged"].kind, None);
    }

    #[test]
    fn parse_legacy_json_config() {
        let json = r#"{
            "version": "0.1.0",
            "processors": ["video-capture", "message-matcher"],
            "exchanges": { "exchange-video-capture": { "type": "local" } },
            "connections": {
                "exchange-video-capture": {
                    "<": ["video-capture"],
                    ">": ["message-matcher"]
                }
            }
        }"#;

        let cfg = parse_config(json, DataflowFormat::Json, "test").unwrap();
        let connection = &cfg.connections["exchange-video-capture"];
        assert_eq!(connection.publishers, vec!["video-capture"]);
        assert_eq!(connection.subscribers, vec!["message-matcher"]);
    }

    #[test]
    fn parse_toml_config() {
        let text = r#"
version = "0.1.0"

[[nodes]]
name = "publisher"
ports = [{ name = "OUTPUT", direction = "output", exchange = "ticks" }]

[exchanges.ticks]
type = "local"
"#;

        let cfg = parse_config(text, DataflowFormat::Toml, "test").unwrap();
        assert_eq!(cfg.nodes[0].name, "publisher");
        assert_eq!(cfg.exchanges["ticks"].kind, Some(TransportKind::Local));
    }

    #[test]
    fn transport_option_defaults() {
        let options = TransportOptions::default();

        assert_eq!(options.get_default_kind(), DEFAULT_TRANSPORT_KIND);
        #[cfg(unix)]
        assert_eq!(options.get_default_kind(), TransportKind::Unix);
        assert_eq!(options.get_channel_capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(options.get_max_payload_bytes(), DEFAULT_MAX_PAYLOAD_BYTES);
        assert_eq!(options.get_send_timeout(), None);
        assert!(options.get_rendezvous_dir().ends_with(RENDEZVOUS_DIR_NAME));
    }

    #[test]
    fn unknown_exchange_type_is_a_parse_error() {
        let yaml = r#"
version: "0.1.0"
exchanges:
  video: { type: file }
"#;

        let err = parse_config(yaml, DataflowFormat::Yaml, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(
            DataflowFormat::from_path(Path::new("flow.yml")).unwrap(),
            DataflowFormat::Yaml
        );
        assert_eq!(
            DataflowFormat::from_path(Path::new("flow.JSON")).unwrap(),
            DataflowFormat::Json
        );
        assert!(matches!(
            DataflowFormat::from_path(Path::new("flow.json5")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{load_and_validate, Direction, TransportKind};
use crate::errors::{ConfigError, ValidationError};

/// The pubsub sample resolves both ends onto the same unix topic.
#[test]
fn test_pubsub_yaml_loading() {
    let graph = load_and_validate("configs/pubsub.yaml").unwrap();

    assert_eq!(graph.namespace(), "pubsub");
    assert_eq!(graph.transport().default_kind, TransportKind::Unix);
    assert_eq!(graph.transport().send_timeout, Some(std::time::Duration::from_secs(1)));

    let sender = graph.resolve("publisher", None, Direction::Output).unwrap();
    let listener = graph.resolve("subscriber", None, Direction::Input).unwrap();
    assert_eq!(sender, listener);
    assert_eq!(sender.topic.to_string(), "pubsub/counter");
}

/// The merger keeps its two inputs on distinct exchanges.
#[test]
fn test_video_lidar_merge_yaml_loading() {
    let graph = load_and_validate("configs/video_lidar_merge.yaml").unwrap();

    assert_eq!(graph.nodes().count(), 4);
    assert_eq!(graph.transport().channel_capacity, 16);

    let video = graph.resolve("merger", Some("VIDEO"), Direction::Input).unwrap();
    let lidar = graph.resolve("merger", Some("LIDAR"), Direction::Input).unwrap();
    assert_ne!(video.topic, lidar.topic);

    // Only the output has a default; two inputs leave the input side open.
    let merged = graph.resolve("merger", None, Direction::Output).unwrap();
    let sink = graph.resolve("sink", None, Direction::Input).unwrap();
    assert_eq!(merged.topic, sink.topic);
    assert!(graph.resolve("merger", None, Direction::Input).is_err());
}

/// Processor/connection files keep working.
#[test]
fn test_legacy_json_loading() {
    let graph = load_and_validate("configs/legacy_exchange.json").unwrap();

    assert_eq!(graph.namespace(), "default");
    assert_eq!(graph.exchanges().collect::<Vec<_>>(), vec!["exchange-{node}"]);

    let capture = graph.resolve("video-capture", None, Direction::Output).unwrap();
    let matcher = graph
        .resolve("message-matcher", Some("exchange-video-capture"), Direction::Input)
        .unwrap();
    assert_eq!(capture.topic, matcher.topic);
    assert_eq!(capture.kind, TransportKind::Local);

    // object-detection both subscribes and publishes, so it has one default each way.
    let detection_in = graph.resolve("object-detection", None, Direction::Input).unwrap();
    let detection_out = graph.resolve("object-detection", None, Direction::Output).unwrap();
    assert_eq!(detection_in.topic.exchange(), "exchange-video-capture");
    assert_eq!(detection_out.topic.exchange(), "exchange-object-detection");
}

/// A broken file reports every finding in one error.
#[test]
fn test_broken_yaml_reports_all_findings() {
    let err = load_and_validate("configs/broken.yaml").unwrap_err();

    assert!(matches!(err, ConfigError::Validation(_)));
    assert_eq!(
        err.findings(),
        &[
            ValidationError::UndeclaredPort {
                node: "merger".into(),
                port: "OUTPUT".into()
            },
            ValidationError::DanglingExchange {
                node: "loader".into(),
                port: "OUTPUT".into(),
                exchange: "nowhere".into()
            },
        ]
    );
    assert!(err.to_string().contains("nowhere"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_and_validate("configs/does-not-exist.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

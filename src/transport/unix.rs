// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Unix domain socket transport with filesystem rendezvous.
//!
//! # Layout
//!
//! ```text
//! <rendezvous_dir>/<b64(namespace)>/<b64(exchange)>/<pid>-<seq>.sock
//! ```
//!
//! Every subscription binds its own socket in the topic directory. A publisher
//! lists that directory on each publish, connects to sockets it has not seen
//! yet, and drops connections whose socket file disappeared. Sockets that
//! refuse connections belong to dead processes and are removed. A socket that
//! is present but cannot take a connection right now makes the publish fail
//! with [`TransportError::NotReady`] when no other peer received the payload.
//!
//! Each topic has its own writer set behind its own lock, so a subscriber
//! that stops reading only stalls publishers of that topic.
//!
//! Names are base64 (URL-safe, unpadded) so any namespace or exchange string
//! maps to a single valid path component.
//!
//! Frames are length-delimited; one frame carries one payload.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;

use crate::config::TransportKind;
use crate::errors::TransportError;
use crate::observability::messages::transport::{
    PeerIoFailed, StalePeerRemoved, SubscriptionOpened, SubscriptionReleased,
};
use crate::observability::messages::StructuredLog;
use crate::router::Topic;
use crate::traits::{Payload, Subscription, Transport};

const SOCKET_EXTENSION: &str = "sock";

// Shared by every transport in the process so socket names never collide.
static NEXT_SOCKET: AtomicU64 = AtomicU64::new(0);

type PeerConnection = FramedWrite<UnixStream, LengthDelimitedCodec>;
type PeerSet = Arc<Mutex<BTreeMap<PathBuf, PeerConnection>>>;

pub struct UnixSocketTransport {
    root: PathBuf,
    capacity: usize,
    max_frame: usize,
    peers: Mutex<HashMap<Topic, PeerSet>>,
}

impl UnixSocketTransport {
    pub fn new(root: impl Into<PathBuf>, capacity: usize, max_frame: usize) -> Self {
        Self {
            root: root.into(),
            capacity: capacity.max(1),
            max_frame,
            peers: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the subscriber sockets of `topic`.
    pub fn topic_dir(&self, topic: &Topic) -> PathBuf {
        self.root
            .join(URL_SAFE_NO_PAD.encode(topic.namespace()))
            .join(URL_SAFE_NO_PAD.encode(topic.exchange()))
    }

    fn codec(&self) -> LengthDelimitedCodec {
        LengthDelimitedCodec::builder()
            .max_frame_length(self.max_frame)
            .new_codec()
    }

    async fn peer_set(&self, topic: &Topic) -> PeerSet {
        let mut peers = self.peers.lock().await;
        Arc::clone(peers.entry(topic.clone()).or_default())
    }

    /// Bring `connections` in line with the sockets currently present for `topic`.
    ///
    /// Returns the last connect failure of a socket that is still present.
    async fn refresh_peers(
        &self,
        topic: &Topic,
        connections: &mut BTreeMap<PathBuf, PeerConnection>,
    ) -> Result<Option<String>, TransportError> {
        let dir = self.topic_dir(topic);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                connections.clear();
                return Ok(None);
            }
            Err(source) => {
                return Err(TransportError::Io {
                    topic: topic.clone(),
                    source,
                })
            }
        };

        let mut present = HashSet::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| TransportError::Io {
            topic: topic.clone(),
            source,
        })? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(SOCKET_EXTENSION) {
                present.insert(path);
            }
        }

        connections.retain(|path, _| present.contains(path));

        let mut unreachable = None;
        for path in present {
            if connections.contains_key(&path) {
                continue;
            }
            match UnixStream::connect(&path).await {
                Ok(stream) => {
                    connections.insert(path, FramedWrite::new(stream, self.codec()));
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                    ) =>
                {
                    let _ = tokio::fs::remove_file(&path).await;
                    StalePeerRemoved { topic, path: &path }.log();
                }
                Err(err) => {
                    PeerIoFailed {
                        topic,
                        peer: &path.display().to_string(),
                        error: &err,
                    }
                    .log();
                    unreachable = Some(format!("{}: {}", path.display(), err));
                }
            }
        }

        Ok(unreachable)
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Unix
    }

    fn name(&self) -> &'static str {
        "unix_socket"
    }

    async fn publish(&self, topic: &Topic, payload: Payload) -> Result<(), TransportError> {
        if payload.len() > self.max_frame {
            return Err(TransportError::FrameTooLarge {
                size: payload.len(),
                limit: self.max_frame,
            });
        }

        let peer_set = self.peer_set(topic).await;
        let mut connections = peer_set.lock().await;
        let unreachable = self.refresh_peers(topic, &mut connections).await?;

        let mut delivered = 0usize;
        let mut broken = Vec::new();
        for (path, connection) in connections.iter_mut() {
            match connection.send(payload.clone()).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    PeerIoFailed {
                        topic,
                        peer: &path.display().to_string(),
                        error: &err,
                    }
                    .log();
                    broken.push(path.clone());
                }
            }
        }
        for path in broken {
            connections.remove(&path);
        }

        if delivered == 0 {
            return Err(match unreachable {
                Some(reason) => TransportError::NotReady {
                    topic: topic.clone(),
                    reason,
                },
                None => TransportError::NoSubscriber {
                    topic: topic.clone(),
                },
            });
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription, TransportError> {
        let io_error = |source: io::Error| TransportError::Io {
            topic: topic.clone(),
            source,
        };

        let dir = self.topic_dir(topic);
        tokio::fs::create_dir_all(&dir).await.map_err(io_error)?;

        let socket = dir.join(format!(
            "{}-{}.{}",
            std::process::id(),
            NEXT_SOCKET.fetch_add(1, Ordering::Relaxed),
            SOCKET_EXTENSION
        ));
        // A leftover from an earlier process with the same pid.
        let _ = tokio::fs::remove_file(&socket).await;
        let listener = UnixListener::bind(&socket).map_err(io_error)?;

        SubscriptionOpened {
            topic,
            kind: TransportKind::Unix,
            endpoint: &socket.display().to_string(),
        }
        .log();

        let (sink, receiver) = mpsc::channel(self.capacity);
        let cancel = CancellationToken::new();
        tokio::spawn(accept_loop(
            listener,
            sink,
            cancel.clone(),
            topic.clone(),
            self.codec(),
        ));

        let released = topic.clone();
        Ok(
            Subscription::new(topic.clone(), receiver).with_release(move || {
                cancel.cancel();
                let _ = std::fs::remove_file(&socket);
                SubscriptionReleased {
                    topic: &released,
                    kind: TransportKind::Unix,
                }
                .log();
            }),
        )
    }
}

async fn accept_loop(
    listener: UnixListener,
    sink: mpsc::Sender<Payload>,
    cancel: CancellationToken,
    topic: Topic,
    codec: LengthDelimitedCodec,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    tokio::spawn(read_peer(
                        FramedRead::new(stream, codec.clone()),
                        sink.clone(),
                        cancel.clone(),
                        topic.clone(),
                    ));
                }
                Err(err) => {
                    PeerIoFailed { topic: &topic, peer: "listener", error: &err }.log();
                    break;
                }
            },
        }
    }
}

async fn read_peer(
    mut frames: FramedRead<UnixStream, LengthDelimitedCodec>,
    sink: mpsc::Sender<Payload>,
    cancel: CancellationToken,
    topic: Topic,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.next() => frame,
        };
        match frame {
            Some(Ok(bytes)) => {
                if sink.send(bytes.freeze()).await.is_err() {
                    break;
                }
            }
            Some(Err(err)) => {
                PeerIoFailed { topic: &topic, peer: "publisher", error: &err }.log();
                break;
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    fn transport(dir: &Path) -> UnixSocketTransport {
        UnixSocketTransport::new(dir, 8, 1024)
    }

    #[tokio::test]
    async fn topic_dir_is_base64_encoded() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = transport(tmp.path());

        let dir = transport.topic_dir(&Topic::new("video/lidar", "merged"));
        assert_eq!(dir, tmp.path().join("dmlkZW8vbGlkYXI").join("bWVyZ2Vk"));
    }

    #[tokio::test]
    async fn publish_reaches_subscriber_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = transport(tmp.path());
        let subscriber = transport(tmp.path());
        let topic = Topic::new("ns", "counter");

        let mut subscription = subscriber.subscribe(&topic).await.unwrap();
        for i in 0u32..10 {
            publisher
                .publish(&topic, Bytes::copy_from_slice(&i.to_le_bytes()))
                .await
                .unwrap();
        }

        for i in 0u32..10 {
            let payload = subscription.recv().await.unwrap();
            assert_eq!(payload.as_ref(), &i.to_le_bytes());
        }
    }

    #[tokio::test]
    async fn no_subscriber_then_released_subscriber() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = transport(tmp.path());
        let topic = Topic::new("ns", "x");

        let err = transport.publish(&topic, Bytes::from_static(b"a")).await.unwrap_err();
        assert!(matches!(err, TransportError::NoSubscriber { .. }));

        let subscription = transport.subscribe(&topic).await.unwrap();
        transport.publish(&topic, Bytes::from_static(b"a")).await.unwrap();

        drop(subscription);
        let err = transport.publish(&topic, Bytes::from_static(b"b")).await.unwrap_err();
        assert!(matches!(err, TransportError::NoSubscriber { .. }));
    }

    #[tokio::test]
    async fn stale_socket_is_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = transport(tmp.path());
        let topic = Topic::new("ns", "x");

        let dir = transport.topic_dir(&topic);
        std::fs::create_dir_all(&dir).unwrap();
        let stale = dir.join("1-0.sock");
        drop(std::os::unix::net::UnixListener::bind(&stale).unwrap());
        assert!(stale.exists());

        let err = transport.publish(&topic, Bytes::from_static(b"a")).await.unwrap_err();
        assert!(matches!(err, TransportError::NoSubscriber { .. }));
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn every_subscription_receives_each_payload_once() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = transport(tmp.path());
        let first = transport(tmp.path());
        let second = transport(tmp.path());
        let topic = Topic::new("ns", "fanout");

        let mut subscriptions = vec![
            first.subscribe(&topic).await.unwrap(),
            second.subscribe(&topic).await.unwrap(),
        ];
        for body in [b"a".as_slice(), b"b", b"c"] {
            publisher.publish(&topic, Bytes::copy_from_slice(body)).await.unwrap();
        }

        for subscription in subscriptions.iter_mut() {
            for body in [b"a".as_slice(), b"b", b"c"] {
                assert_eq!(subscription.recv().await.unwrap().as_ref(), body);
            }
            let extra = tokio::time::timeout(Duration::from_millis(50), subscription.recv()).await;
            assert!(extra.is_err(), "payload delivered twice");
        }
    }

    #[tokio::test]
    async fn stalled_topic_does_not_block_other_topics() {
        let frame_limit = 512 * 1024;
        let tmp = tempfile::tempdir().unwrap();
        let publisher = Arc::new(UnixSocketTransport::new(tmp.path(), 8, frame_limit));
        let subscriber = UnixSocketTransport::new(tmp.path(), 8, frame_limit);
        let slow = Topic::new("ns", "slow");
        let fast = Topic::new("ns", "fast");

        // Never read, so its socket and channel fill up.
        let _stalled = subscriber.subscribe(&slow).await.unwrap();
        let mut active = subscriber.subscribe(&fast).await.unwrap();

        let flooding = Arc::clone(&publisher);
        let flood = tokio::spawn(async move {
            let frame = Bytes::from(vec![0u8; frame_limit]);
            while flooding.publish(&slow, frame.clone()).await.is_ok() {}
        });
        tokio::time::sleep(Duration::from_millis(300)).await;

        tokio::time::timeout(
            Duration::from_secs(2),
            publisher.publish(&fast, Bytes::from_static(b"y")),
        )
        .await
        .expect("publish on an unrelated topic was blocked")
        .unwrap();
        assert_eq!(active.recv().await.unwrap().as_ref(), b"y");

        flood.abort();
    }

    #[tokio::test]
    async fn present_but_unconnectable_socket_is_not_ready() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = transport(tmp.path());
        let topic = Topic::new("ns", "x");

        let dir = transport.topic_dir(&topic);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("1-0.sock");
        // A datagram socket accepts no stream connections but is not stale.
        let _datagram = std::os::unix::net::UnixDatagram::bind(&path).unwrap();

        let err = transport.publish(&topic, Bytes::from_static(b"a")).await.unwrap_err();
        assert!(matches!(err, TransportError::NotReady { .. }));
        assert!(path.exists());

        let err = crate::errors::SendError::from(err);
        assert!(matches!(err, crate::errors::SendError::NotReady { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let transport = transport(tmp.path());

        let err = transport
            .publish(&Topic::new("ns", "x"), Bytes::from(vec![0u8; 2048]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { size: 2048, limit: 1024 }));
    }
}

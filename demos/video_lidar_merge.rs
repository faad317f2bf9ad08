// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Two loaders feed a merger that pairs one video frame with one lidar scan.
//!
//! ```text
//! cargo run --example video_lidar_merge -- [rounds]
//! ```
//!
//! Every node runs in this process over the local bus. The merger emits an
//! 8-byte packet (video tick, lidar tick; both little-endian u32) once it has
//! one value from each side.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use easyflow::{async_handler_fn, handler_fn, Flow, PairJoin, Sender};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = "configs/video_lidar_merge.yaml";

fn decode_tick(payload: &[u8]) -> anyhow::Result<u32> {
    let bytes: [u8; 4] = payload.try_into().context("expected a 4-byte tick")?;
    Ok(u32::from_le_bytes(bytes))
}

async fn emit(pair: Option<(u32, u32)>, output: Sender) -> anyhow::Result<()> {
    if let Some((video, lidar)) = pair {
        let mut packet = Vec::with_capacity(8);
        packet.extend_from_slice(&video.to_le_bytes());
        packet.extend_from_slice(&lidar.to_le_bytes());
        output.send(packet).await?;
        tracing::info!(video, lidar, "sent a merged packet");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rounds: u32 = match env::args().nth(1) {
        Some(arg) => arg.parse().context("rounds must be a number")?,
        None => 5,
    };

    let flow = Flow::load_dataflow(CONFIG)?;

    let sink = flow
        .listen(
            "sink",
            handler_fn(|payload: Bytes| {
                anyhow::ensure!(payload.len() == 8, "expected an 8-byte merged packet");
                let video = decode_tick(&payload[..4])?;
                let lidar = decode_tick(&payload[4..])?;
                tracing::info!(video, lidar, "received merged packet");
                Ok(())
            }),
        )
        .await?;

    let join = Arc::new(PairJoin::<u32, u32>::new());
    let output = flow.build_sender("merger")?;

    let video_listener = {
        let join = Arc::clone(&join);
        let output = output.clone();
        flow.listen_from(
            "merger",
            "VIDEO",
            async_handler_fn(move |payload| {
                let pair = decode_tick(&payload).map(|tick| join.offer_left(tick));
                let output = output.clone();
                async move { emit(pair?, output).await }
            }),
        )
        .await?
    };
    let lidar_listener = {
        let join = Arc::clone(&join);
        let output = output.clone();
        flow.listen_from(
            "merger",
            "LIDAR",
            async_handler_fn(move |payload| {
                let pair = decode_tick(&payload).map(|tick| join.offer_right(tick));
                let output = output.clone();
                async move { emit(pair?, output).await }
            }),
        )
        .await?
    };

    let video = flow.build_sender("video_loader")?;
    let lidar = flow.build_sender("lidar_loader")?;
    for round in 0..rounds {
        video.send(round.to_le_bytes().to_vec()).await?;
        lidar.send((1000 + round).to_le_bytes().to_vec()).await?;
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    for listener in [&video_listener, &lidar_listener, &sink] {
        listener.cancel();
        listener.wait().await;
    }
    tracing::info!(delivered = sink.stats().delivered, "merge demo finished");
    Ok(())
}

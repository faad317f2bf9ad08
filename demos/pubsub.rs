// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Publisher and subscriber as two separate processes.
//!
//! ```text
//! cargo run --example pubsub -- sub
//! cargo run --example pubsub -- pub
//! ```
//!
//! Both load `configs/pubsub.yaml` (or the path given as second argument)
//! and meet on the unix transport. The publisher sends the current unix time
//! as a 4-byte little-endian integer once per second.

use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context};
use easyflow::errors::SendError;
use easyflow::{handler_fn, Flow};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "configs/pubsub.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("Usage: {} <pub|sub> [dataflow.yaml]", args[0]);
    }
    let config = args.get(2).map(String::as_str).unwrap_or(DEFAULT_CONFIG);
    let flow = Flow::load_dataflow(config).with_context(|| format!("loading {config}"))?;

    match args[1].as_str() {
        "pub" => publish(&flow).await,
        "sub" => subscribe(&flow).await,
        other => bail!("Unknown role '{other}', expected 'pub' or 'sub'"),
    }
}

async fn publish(flow: &Flow) -> anyhow::Result<()> {
    let sender = flow.build_sender("publisher")?;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let tick = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as u32;
        match sender.send(tick.to_le_bytes().to_vec()).await {
            Ok(()) => tracing::info!(tick, "sent"),
            Err(err @ SendError::NoSubscriber { .. }) => tracing::info!(%err, "waiting for a subscriber"),
            Err(err) if err.is_retryable() => tracing::warn!(%err, "send failed, retrying"),
            Err(err) => return Err(err.into()),
        }
    }
}

async fn subscribe(flow: &Flow) -> anyhow::Result<()> {
    let listener = flow
        .listen(
            "subscriber",
            handler_fn(|payload| {
                let bytes: [u8; 4] = payload
                    .as_ref()
                    .try_into()
                    .context("expected a 4-byte tick")?;
                tracing::info!(tick = u32::from_le_bytes(bytes), "received");
                Ok(())
            }),
        )
        .await?;

    tokio::signal::ctrl_c().await?;
    listener.cancel();
    listener.wait().await;

    let stats = listener.stats();
    tracing::info!(delivered = stats.delivered, failed = stats.failed, "subscriber stopped");
    Ok(())
}

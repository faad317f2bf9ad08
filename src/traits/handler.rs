// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;

use async_trait::async_trait;

use crate::errors::{DispatchError, HandlerError};
use crate::observability::messages::dispatch::CallbackFailed;
use crate::observability::messages::StructuredLog;
use crate::traits::Payload;

/// User callback driven by a [`Listener`](crate::engine::Listener).
///
/// `on_message` runs once per delivered payload, never concurrently with
/// itself for the same listener. Errors and panics are reported through
/// `on_error` and do not stop the listener. `on_close` runs once after the
/// last callback.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use easyflow::errors::HandlerError;
/// use easyflow::traits::{MessageHandler, Payload};
///
/// struct Printer;
///
/// #[async_trait]
/// impl MessageHandler for Printer {
///     async fn on_message(&self, payload: Payload) -> Result<(), HandlerError> {
///         tracing::info!(len = payload.len(), "received");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn on_message(&self, payload: Payload) -> Result<(), HandlerError>;

    fn on_error(&self, error: &DispatchError) {
        CallbackFailed { error }.log();
    }

    fn on_close(&self) {}

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handler backed by a synchronous closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> MessageHandler for FnHandler<F>
where
    F: Fn(Payload) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn on_message(&self, payload: Payload) -> Result<(), HandlerError> {
        (self.0)(payload).map_err(Into::into)
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}

/// Handler backed by a closure returning a future. See [`async_handler_fn`].
pub struct AsyncFnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for AsyncFnHandler<F>
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_message(&self, payload: Payload) -> Result<(), HandlerError> {
        (self.0)(payload).await.map_err(Into::into)
    }

    fn name(&self) -> &'static str {
        "async_fn"
    }
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Payload) -> anyhow::Result<()> + Send + Sync + 'static,
{
    FnHandler(f)
}

pub fn async_handler_fn<F, Fut>(f: F) -> AsyncFnHandler<F>
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    AsyncFnHandler(f)
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod handler;
pub mod transport;

pub use handler::{async_handler_fn, handler_fn, AsyncFnHandler, FnHandler, MessageHandler};
pub use transport::{Payload, Subscription, Transport};

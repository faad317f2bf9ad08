// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod join;
pub mod listener;
pub mod sender;
pub mod state;

pub use join::PairJoin;
pub use listener::{Listener, ListenerStats};
pub use sender::Sender;
pub use state::ListenerState;

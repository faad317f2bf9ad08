// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Lifecycle of a [`Listener`](crate::engine::Listener).
///
/// ```text
/// Created -> Subscribing -> Active -> Cancelling -> Closed
///                  \                                  ^
///                   `---------- (subscribe fails) ----'
/// ```
///
/// States only move forward. `Closed` is terminal: no callback runs after it
/// is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListenerState {
    Created,
    Subscribing,
    Active,
    Cancelling,
    Closed,
}

impl ListenerState {
    pub fn can_transition_to(self, next: ListenerState) -> bool {
        use ListenerState::*;
        matches!(
            (self, next),
            (Created, Subscribing)
                | (Subscribing, Active)
                | (Subscribing, Closed)
                | (Active, Cancelling)
                | (Active, Closed)
                | (Cancelling, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ListenerState::Closed
    }
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerState::Created => "created",
            ListenerState::Subscribing => "subscribing",
            ListenerState::Active => "active",
            ListenerState::Cancelling => "cancelling",
            ListenerState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

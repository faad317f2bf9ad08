// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
enum Slot<L, R> {
    Empty,
    HaveLeft(L),
    HaveRight(R),
}

/// Pairs values arriving independently on two inputs.
///
/// ```text
/// Empty --left--> HaveLeft  --right--> emit (left, right), Empty
/// Empty --right-> HaveRight --left---> emit (left, right), Empty
/// ```
///
/// A value offered on the side that is already pending replaces it, so a
/// pair always holds the newest value of each side. Safe to share between
/// listeners through an `Arc`.
///
/// # Example
/// ```
/// use easyflow::engine::PairJoin;
///
/// let join = PairJoin::new();
/// assert_eq!(join.offer_left(1u32), None);
/// assert_eq!(join.offer_left(2u32), None);
/// assert_eq!(join.offer_right("scan"), Some((2, "scan")));
/// ```
#[derive(Debug)]
pub struct PairJoin<L, R> {
    slot: Mutex<Slot<L, R>>,
}

impl<L, R> PairJoin<L, R> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
        }
    }

    pub fn offer_left(&self, left: L) -> Option<(L, R)> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *slot, Slot::Empty) {
            Slot::HaveRight(right) => Some((left, right)),
            Slot::Empty | Slot::HaveLeft(_) => {
                *slot = Slot::HaveLeft(left);
                None
            }
        }
    }

    pub fn offer_right(&self, right: R) -> Option<(L, R)> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *slot, Slot::Empty) {
            Slot::HaveLeft(left) => Some((left, right)),
            Slot::Empty | Slot::HaveRight(_) => {
                *slot = Slot::HaveRight(right);
                None
            }
        }
    }

    /// Whether a value is waiting for its partner.
    pub fn is_pending(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        !matches!(*slot, Slot::Empty)
    }
}

impl<L, R> Default for PairJoin<L, R> {
    fn default() -> Self {
        Self::new()
    }
}

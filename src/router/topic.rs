// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

/// Addressable channel: a namespace plus a concrete exchange name.
///
/// Routing is exact match on both parts. Cloning is cheap; the strings are
/// shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic {
    namespace: Arc<str>,
    exchange: Arc<str>,
}

impl Topic {
    pub fn new(namespace: impl Into<Arc<str>>, exchange: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: namespace.into(),
            exchange: exchange.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.exchange)
    }
}

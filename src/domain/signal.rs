//! Emitted trade events.

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SignalKind {
    Buy,
    Sell,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "Buy"),
            SignalKind::Sell => write!(f, "Sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    pub price: f64,
    pub time: DateTime<Utc>,
    pub bar_index: usize,
}

impl Signal {
    pub fn is_buy(&self) -> bool {
        self.kind == SignalKind::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.kind == SignalKind::Sell
    }
}

/// Per-bar annotation, positionally aligned with the input bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalFlags {
    pub is_buy: bool,
    pub is_sell: bool,
}

/// Number of (buy, sell) signals in a list.
pub fn count_by_kind(signals: &[Signal]) -> (usize, usize) {
    let buys = signals.iter().filter(|s| s.is_buy()).count();
    (buys, signals.len() - buys)
}

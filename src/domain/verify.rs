//! Signal placement checks against hand-marked date windows.
//!
//! Buys inside a bad-buy zone are counted; each expected-sell window is
//! FOUND when at least one Sell falls inside it.

use chrono::NaiveDate;

use crate::domain::signal::{Signal, SignalKind};
use crate::domain::strategy::DateWindow;

/// Tops the Daily sell rules are expected to catch.
pub fn default_expected_sells() -> Vec<DateWindow> {
    [
        ((2021, 11, 3), (2021, 11, 11)),
        ((2024, 5, 21), (2024, 5, 28)),
        ((2024, 12, 5), (2024, 12, 16)),
        ((2025, 8, 13), (2025, 8, 26)),
        ((2025, 10, 4), (2025, 10, 9)),
    ]
    .into_iter()
    .filter_map(|((sy, sm, sd), (ey, em, ed))| {
        Some(DateWindow {
            start: NaiveDate::from_ymd_opt(sy, sm, sd)?,
            end: NaiveDate::from_ymd_opt(ey, em, ed)?,
        })
    })
    .collect()
}

/// Signals of one kind that landed inside one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowHits {
    pub window: DateWindow,
    pub signals: Vec<Signal>,
}

impl WindowHits {
    fn collect(signals: &[Signal], kind: SignalKind, window: DateWindow) -> Self {
        let signals = signals
            .iter()
            .filter(|s| s.kind == kind && window.contains(s.time.date_naive()))
            .cloned()
            .collect();
        Self { window, signals }
    }

    pub fn found(&self) -> bool {
        !self.signals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    pub bad_buys: Vec<WindowHits>,
    pub expected_sells: Vec<WindowHits>,
}

impl VerifyReport {
    pub fn bad_buy_count(&self) -> usize {
        self.bad_buys.iter().map(|h| h.signals.len()).sum()
    }

    pub fn missing_sells(&self) -> usize {
        self.expected_sells.iter().filter(|h| !h.found()).count()
    }
}

pub fn verify(
    signals: &[Signal],
    bad_buy_zones: &[DateWindow],
    expected_sells: &[DateWindow],
) -> VerifyReport {
    VerifyReport {
        bad_buys: bad_buy_zones
            .iter()
            .map(|w| WindowHits::collect(signals, SignalKind::Buy, *w))
            .collect(),
        expected_sells: expected_sells
            .iter()
            .map(|w| WindowHits::collect(signals, SignalKind::Sell, *w))
            .collect(),
    }
}

//! Bar representations: the raw exported row and the enriched detector input.

use chrono::{DateTime, NaiveDate, Utc};

/// One row of the exported price file, before local indicators are derived.
///
/// Indicator columns are optional because exports leave them blank (or NaN)
/// until the indicator has warmed up.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketBar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub rsi: Option<f64>,
    pub ema21: Option<f64>,
    pub ema200: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
}

impl MarketBar {
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

/// A bar with every column the signal detector reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Position in the ascending series.
    pub index: usize,
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub rsi: Option<f64>,
    pub ema21: Option<f64>,
    pub ema100: f64,
    pub ema200: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    /// 18-bar %K computed from high/low/close.
    pub stoch_k_18: Option<f64>,
    /// (close - EMA200) / EMA200 * 100
    pub ema_ext_pct: Option<f64>,
    pub bull_cross: bool,
    pub bear_cross: bool,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }

    /// EMA200 when it has warmed up, otherwise EMA100.
    pub fn long_ema(&self) -> f64 {
        self.ema200.unwrap_or(self.ema100)
    }
}

/// Build a UTC timestamp from UNIX seconds.
pub fn timestamp_from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

//! Per-run detector configuration.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Rule set selector. Daily uses the lagged oversold/cross state machine,
/// Weekly uses single-bar extremes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Daily,
    Weekly,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Daily => write!(f, "Daily"),
            Timeframe::Weekly => write!(f, "Weekly"),
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "1d" | "d" => Ok(Timeframe::Daily),
            "weekly" | "1w" | "w" => Ok(Timeframe::Weekly),
            other => Err(format!("unknown timeframe '{other}' (expected daily or weekly)")),
        }
    }
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Parse `YYYY-MM-DD..YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let (start, end) = s
            .trim()
            .split_once("..")
            .ok_or_else(|| format!("expected START..END, got '{}'", s.trim()))?;
        let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")
            .map_err(|_| format!("invalid start date '{}'", start.trim()))?;
        let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d")
            .map_err(|_| format!("invalid end date '{}'", end.trim()))?;
        if start > end {
            return Err(format!("window start {start} is after end {end}"));
        }
        Ok(Self { start, end })
    }

    /// Parse a comma-separated list of windows.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        s.split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// The two hand-picked bad-buy zones (late 2021 top, turn of 2024/2025).
pub fn default_exclusions() -> Vec<DateWindow> {
    [
        ((2021, 11, 24), (2021, 12, 30)),
        ((2024, 12, 24), (2025, 1, 20)),
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

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub timeframe: Timeframe,
    /// Oversold level swept by the grid search. Only read when
    /// `oversold_uses_rsi_buy` is set.
    pub rsi_buy_threshold: f64,
    /// Mark Daily oversold at `rsi_buy_threshold` instead of the fixed RSI 35.
    pub oversold_uses_rsi_buy: bool,
    /// Daily strong overbought marker.
    pub rsi_sell_threshold: f64,
    /// Fractional profit over the ledger average required to sell into a position.
    pub min_profit_pct: f64,
    /// EMA200 extension (%) required by the strong sell.
    pub strong_sell_ext_pct: f64,
    /// EMA200 extension (%) required by the blow-off sell.
    pub extreme_sell_ext_pct: f64,
    /// Additionally require close > EMA21 on Daily buys.
    pub require_ema21_confirmation: bool,
    /// Daily buys never fire inside these windows.
    pub exclusions: Vec<DateWindow>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            timeframe: Timeframe::Daily,
            rsi_buy_threshold: 35.0,
            oversold_uses_rsi_buy: false,
            rsi_sell_threshold: 70.0,
            min_profit_pct: 0.25,
            strong_sell_ext_pct: 50.0,
            extreme_sell_ext_pct: 45.0,
            require_ema21_confirmation: false,
            exclusions: default_exclusions(),
        }
    }
}

impl StrategyConfig {
    pub fn weekly() -> Self {
        StrategyConfig {
            timeframe: Timeframe::Weekly,
            rsi_sell_threshold: 75.0,
            ..Self::default()
        }
    }

    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        self.exclusions.iter().any(|w| w.contains(date))
    }
}

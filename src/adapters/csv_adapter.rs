//! CSV bar loader for chart-platform exports.
//!
//! Columns are located by header name, so column order and extra columns do
//! not matter. `time` is UNIX seconds (a plain `YYYY-MM-DD` date is also
//! accepted).

use crate::domain::bar::{MarketBar, timestamp_from_unix};
use crate::domain::error::LongtraderError;
use crate::ports::data_port::BarSource;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 10] = [
    "time", "open", "high", "low", "close", "RSI", "EMA21", "EMA200", "%K", "%D",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Parse CSV text. `origin` names the source in error messages.
    pub fn parse_str(
        &self,
        content: &str,
        origin: &str,
    ) -> Result<Vec<MarketBar>, LongtraderError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| LongtraderError::InvalidInput {
                reason: format!("{origin}: unreadable header: {e}"),
            })?
            .clone();

        let mut columns = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LongtraderError::MissingInput {
                    what: format!("column '{name}' in {origin}"),
                })?;
        }
        let [time, open, high, low, close, rsi, ema21, ema200, k, d] = columns;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let line = row + 2;
            let record = result.map_err(|e| LongtraderError::InvalidInput {
                reason: format!("{origin}:{line}: {e}"),
            })?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            bars.push(MarketBar {
                time: parse_time(field(time)).ok_or_else(|| LongtraderError::InvalidInput {
                    reason: format!("{origin}:{line}: invalid time '{}'", field(time)),
                })?,
                open: parse_price(field(open), "open", origin, line)?,
                high: parse_price(field(high), "high", origin, line)?,
                low: parse_price(field(low), "low", origin, line)?,
                close: parse_price(field(close), "close", origin, line)?,
                rsi: parse_indicator(field(rsi), "RSI", origin, line)?,
                ema21: parse_indicator(field(ema21), "EMA21", origin, line)?,
                ema200: parse_indicator(field(ema200), "EMA200", origin, line)?,
                stoch_k: parse_indicator(field(k), "%K", origin, line)?,
                stoch_d: parse_indicator(field(d), "%D", origin, line)?,
            });
        }

        if bars.is_empty() {
            return Err(LongtraderError::NoData {
                path: origin.to_string(),
            });
        }

        bars.sort_by_key(|b| b.time);
        debug!("loaded {} bars from {origin}", bars.len());
        Ok(bars)
    }
}

impl BarSource for CsvAdapter {
    fn load_bars(&self, path: &Path) -> Result<Vec<MarketBar>, LongtraderError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LongtraderError::MissingInput {
                what: format!("{}: {e}", path.display()),
            },
            ErrorKind::InvalidData => LongtraderError::InvalidInput {
                reason: format!("{}: not UTF-8 text", path.display()),
            },
            _ => LongtraderError::Io(e),
        })?;
        self.parse_str(&content, &path.display().to_string())
    }
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = value.parse::<i64>() {
        return timestamp_from_unix(secs);
    }
    if let Ok(secs) = value.parse::<f64>() {
        if secs.is_finite() {
            return timestamp_from_unix(secs as i64);
        }
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_price(
    value: &str,
    column: &str,
    origin: &str,
    line: usize,
) -> Result<f64, LongtraderError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LongtraderError::InvalidInput {
            reason: format!("{origin}:{line}: invalid {column} value '{value}'"),
        }),
    }
}

/// Blank and NaN cells are warm-up gaps, not errors.
fn parse_indicator(
    value: &str,
    column: &str,
    origin: &str,
    line: usize,
) -> Result<Option<f64>, LongtraderError> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(LongtraderError::InvalidInput {
            reason: format!("{origin}:{line}: invalid {column} value '{value}'"),
        }),
    }
}

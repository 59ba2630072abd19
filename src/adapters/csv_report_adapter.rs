//! CSV report adapter implementing SignalReportPort.

use crate::domain::bar::Bar;
use crate::domain::error::LongtraderError;
use crate::domain::signal::{Signal, SignalFlags, SignalKind};
use crate::ports::report_port::SignalReportPort;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct SignalRow {
    #[serde(rename = "type")]
    kind: SignalKind,
    date: String,
    timestamp: i64,
    bar_index: usize,
    price: f64,
}

impl From<&Signal> for SignalRow {
    fn from(s: &Signal) -> Self {
        SignalRow {
            kind: s.kind,
            date: s.time.format("%Y-%m-%d").to_string(),
            timestamp: s.time.timestamp(),
            bar_index: s.bar_index,
            price: s.price,
        }
    }
}

#[derive(Serialize)]
struct BarRow {
    time: i64,
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(rename = "RSI")]
    rsi: Option<f64>,
    #[serde(rename = "EMA21")]
    ema21: Option<f64>,
    #[serde(rename = "EMA100")]
    ema100: f64,
    #[serde(rename = "EMA200")]
    ema200: Option<f64>,
    #[serde(rename = "%K")]
    stoch_k: Option<f64>,
    #[serde(rename = "%D")]
    stoch_d: Option<f64>,
    #[serde(rename = "Stoch_K_18")]
    stoch_k_18: Option<f64>,
    ema_ext_pct: Option<f64>,
    bull_cross: bool,
    bear_cross: bool,
    buy_signal: bool,
    sell_signal: bool,
}

impl BarRow {
    fn new(bar: &Bar, flags: SignalFlags) -> Self {
        BarRow {
            time: bar.time.timestamp(),
            date: bar.date().to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            rsi: bar.rsi,
            ema21: bar.ema21,
            ema100: bar.ema100,
            ema200: bar.ema200,
            stoch_k: bar.stoch_k,
            stoch_d: bar.stoch_d,
            stoch_k_18: bar.stoch_k_18,
            ema_ext_pct: bar.ema_ext_pct,
            bull_cross: bar.bull_cross,
            bear_cross: bar.bear_cross,
            buy_signal: flags.is_buy,
            sell_signal: flags.is_sell,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn writer(output_path: &str) -> Result<csv::Writer<fs::File>, LongtraderError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        csv::Writer::from_path(path).map_err(|e| report_error(output_path, e))
    }
}

fn report_error(output_path: &str, e: csv::Error) -> LongtraderError {
    LongtraderError::Report {
        reason: format!("{output_path}: {e}"),
    }
}

impl SignalReportPort for CsvReportAdapter {
    fn write_signals(&self, signals: &[Signal], output_path: &str) -> Result<(), LongtraderError> {
        let mut wtr = Self::writer(output_path)?;
        if signals.is_empty() {
            wtr.write_record(["type", "date", "timestamp", "bar_index", "price"])
                .map_err(|e| report_error(output_path, e))?;
        }
        for signal in signals {
            wtr.serialize(SignalRow::from(signal))
                .map_err(|e| report_error(output_path, e))?;
        }
        wtr.flush()?;
        info!("wrote {} signals to {output_path}", signals.len());
        Ok(())
    }

    fn write_bars(
        &self,
        bars: &[Bar],
        flags: &[SignalFlags],
        output_path: &str,
    ) -> Result<(), LongtraderError> {
        if bars.len() != flags.len() {
            return Err(LongtraderError::Report {
                reason: format!(
                    "{} bars but {} signal flags",
                    bars.len(),
                    flags.len()
                ),
            });
        }
        let mut wtr = Self::writer(output_path)?;
        for (bar, f) in bars.iter().zip(flags) {
            wtr.serialize(BarRow::new(bar, *f))
                .map_err(|e| report_error(output_path, e))?;
        }
        wtr.flush()?;
        info!("wrote {} annotated bars to {output_path}", bars.len());
        Ok(())
    }
}

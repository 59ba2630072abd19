#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use longtrader::domain::bar::{Bar, MarketBar};
use longtrader::domain::error::LongtraderError;
use longtrader::domain::indicator::ema_extension_pct;
use longtrader::ports::data_port::BarSource;
use std::path::Path;

pub const CSV_HEADER: &str = "time,open,high,low,close,RSI,EMA21,EMA200,%K,%D";

/// Bar builder for detector tests.
///
/// Every bar starts neutral: close 100 under an EMA200 of 200, close equal to
/// EMA21, RSI 50, no crosses, one bar per day from `start`.
pub struct SeriesBuilder {
    bars: Vec<Bar>,
}

impl SeriesBuilder {
    pub fn new(len: usize) -> Self {
        Self::starting(len, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
    }

    pub fn starting(len: usize, start: NaiveDate) -> Self {
        let t0 = start.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let bars = (0..len)
            .map(|i| Bar {
                index: i,
                time: t0 + Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                rsi: Some(50.0),
                ema21: Some(100.0),
                ema100: 100.0,
                ema200: Some(200.0),
                stoch_k: None,
                stoch_d: None,
                stoch_k_18: None,
                ema_ext_pct: None,
                bull_cross: false,
                bear_cross: false,
            })
            .collect();
        Self { bars }
    }

    pub fn rsi(mut self, i: usize, rsi: f64) -> Self {
        self.bars[i].rsi = Some(rsi);
        self
    }

    pub fn close(mut self, i: usize, close: f64) -> Self {
        self.bars[i].close = close;
        self
    }

    pub fn ema200(mut self, i: usize, ema200: Option<f64>) -> Self {
        self.bars[i].ema200 = ema200;
        self
    }

    pub fn ema21(mut self, i: usize, ema21: f64) -> Self {
        self.bars[i].ema21 = Some(ema21);
        self
    }

    pub fn stoch_k_18(mut self, i: usize, k: f64) -> Self {
        self.bars[i].stoch_k_18 = Some(k);
        self
    }

    pub fn bull_cross(mut self, i: usize) -> Self {
        self.bars[i].bull_cross = true;
        self
    }

    pub fn bear_cross(mut self, i: usize) -> Self {
        self.bars[i].bear_cross = true;
        self
    }

    pub fn build(mut self) -> Vec<Bar> {
        for b in &mut self.bars {
            b.ema_ext_pct = ema_extension_pct(b.close, b.ema200);
        }
        self.bars
    }
}

/// CSV text for `rows` daily rows from 2023-01-01, close 100 under EMA200 200.
/// `row_fn` may override (RSI, %K, %D) per row.
pub fn csv_content(rows: usize, row_fn: impl Fn(usize) -> (f64, f64, f64)) -> String {
    let t0 = 1_672_531_200i64;
    let mut out = format!("{CSV_HEADER}\n");
    for i in 0..rows {
        let (rsi, k, d) = row_fn(i);
        out.push_str(&format!(
            "{},100,101,99,100,{rsi},100,200,{k},{d}\n",
            t0 + i as i64 * 86_400
        ));
    }
    out
}

/// One oversold reading at row 5 and a %K/%D bull cross at row 10.
pub fn single_buy_csv() -> String {
    csv_content(40, |i| {
        let rsi = if i == 5 { 20.0 } else { 50.0 };
        let (k, d) = if i < 10 { (10.0, 20.0) } else { (30.0, 20.0) };
        (rsi, k, d)
    })
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub struct MockBarSource {
    pub bars: Vec<MarketBar>,
}

impl BarSource for MockBarSource {
    fn load_bars(&self, path: &Path) -> Result<Vec<MarketBar>, LongtraderError> {
        if self.bars.is_empty() {
            return Err(LongtraderError::NoData {
                path: path.display().to_string(),
            });
        }
        Ok(self.bars.clone())
    }
}

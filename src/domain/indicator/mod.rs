//! Locally derived indicators.
//!
//! The exported price file already carries RSI, EMA21, EMA200 and the %K/%D
//! stochastic lines. The detector additionally needs:
//! - EMA100, the fallback reference while EMA200 is still warming up
//! - an 18-bar %K computed from raw high/low/close
//! - the percentage extension of close above EMA200
//! - %K/%D crossing flags

pub mod cross;
pub mod ema;
pub mod stochastic;

use crate::domain::bar::{Bar, MarketBar};

pub const EMA100_PERIOD: usize = 100;
pub const STOCH_K_PERIOD: usize = 18;

/// (close - EMA200) / EMA200 * 100, undefined until EMA200 is.
pub fn ema_extension_pct(close: f64, ema200: Option<f64>) -> Option<f64> {
    ema200
        .filter(|e| *e != 0.0)
        .map(|e| (close - e) / e * 100.0)
}

/// Attach every derived column to the exported rows, producing detector input.
pub fn supplement(bars: &[MarketBar]) -> Vec<Bar> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema100 = ema::calculate_ema(&closes, EMA100_PERIOD);
    let stoch_k_18 = stochastic::calculate_stoch_k(bars, STOCH_K_PERIOD);

    let k: Vec<Option<f64>> = bars.iter().map(|b| b.stoch_k).collect();
    let d: Vec<Option<f64>> = bars.iter().map(|b| b.stoch_d).collect();
    let bull = cross::crosses_above(&k, &d);
    let bear = cross::crosses_below(&k, &d);

    bars.iter()
        .enumerate()
        .map(|(i, b)| Bar {
            index: i,
            time: b.time,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            rsi: b.rsi,
            ema21: b.ema21,
            ema100: ema100[i],
            ema200: b.ema200,
            stoch_k: b.stoch_k,
            stoch_d: b.stoch_d,
            stoch_k_18: stoch_k_18[i],
            ema_ext_pct: ema_extension_pct(b.close, b.ema200),
            bull_cross: bull[i],
            bear_cross: bear[i],
        })
        .collect()
}

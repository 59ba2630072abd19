//! Rolling stochastic %K from raw high/low/close.
//!
//! %K = 100 * (C - LL(n)) / (HH(n) - LL(n))
//! Warmup: first (n-1) bars are undefined. A flat window (HH == LL) is also
//! undefined rather than 0 or infinite.

use crate::domain::bar::MarketBar;

pub fn calculate_stoch_k(bars: &[MarketBar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; bars.len()];
    }

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < period {
                return None;
            }
            let window = &bars[i + 1 - period..=i];
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let highest = window
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            if range == 0.0 || !range.is_finite() {
                None
            } else {
                Some(100.0 * (bar.close - lowest) / range)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::timestamp_from_unix;
    use approx::assert_relative_eq;

    fn make_bar(i: usize, high: f64, low: f64, close: f64) -> MarketBar {
        MarketBar {
            time: timestamp_from_unix(1_600_000_000 + i as i64 * 86_400).unwrap(),
            open: close,
            high,
            low,
            close,
            rsi: None,
            ema21: None,
            ema200: None,
            stoch_k: None,
            stoch_d: None,
        }
    }

    #[test]
    fn warmup_is_period_minus_one() {
        let bars: Vec<MarketBar> = (0..20).map(|i| make_bar(i, 110.0, 90.0, 100.0)).collect();
        let k = calculate_stoch_k(&bars, 18);
        assert_eq!(k.len(), 20);
        for v in &k[..17] {
            assert!(v.is_none());
        }
        assert!(k[17].is_some());
    }

    #[test]
    fn known_value() {
        let bars = vec![
            make_bar(0, 12.0, 8.0, 10.0),
            make_bar(1, 15.0, 9.0, 14.0),
            make_bar(2, 13.0, 10.0, 11.0),
        ];
        let k = calculate_stoch_k(&bars, 3);
        // LL = 8, HH = 15, close = 11 -> 100 * 3 / 7
        assert_relative_eq!(k[2].unwrap(), 300.0 / 7.0);
    }

    #[test]
    fn close_at_high_is_100() {
        let bars = vec![make_bar(0, 10.0, 5.0, 7.0), make_bar(1, 12.0, 6.0, 12.0)];
        let k = calculate_stoch_k(&bars, 2);
        assert_relative_eq!(k[1].unwrap(), 100.0);
    }

    #[test]
    fn flat_window_is_undefined() {
        let bars: Vec<MarketBar> = (0..5).map(|i| make_bar(i, 100.0, 100.0, 100.0)).collect();
        let k = calculate_stoch_k(&bars, 3);
        assert!(k.iter().all(|v| v.is_none()));
    }

    #[test]
    fn period_zero_is_all_undefined() {
        let bars = vec![make_bar(0, 10.0, 5.0, 7.0)];
        assert_eq!(calculate_stoch_k(&bars, 0), vec![None]);
    }
}

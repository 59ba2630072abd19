//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Every bar gets a value; there is no SMA warm-up window.

pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(closes.len());
    let mut ema = closes[0];
    values.push(ema);

    for &close in &closes[1..] {
        ema = close * k + ema * (1.0 - k);
        values.push(ema);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ema_seed_is_first_close() {
        let values = calculate_ema(&[10.0, 20.0, 30.0], 100);
        assert_relative_eq!(values[0], 10.0);
    }

    #[test]
    fn ema_recursive_calculation() {
        let values = calculate_ema(&[10.0, 20.0, 30.0], 3);
        let k = 2.0 / 4.0;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        assert_relative_eq!(values[1], e1);
        assert_relative_eq!(values[2], e2);
    }

    #[test]
    fn ema100_smoothing_factor() {
        let values = calculate_ema(&[100.0, 201.0], 100);
        // k = 2/101, so EMA moves 2/101 of the 101-point gap
        assert_relative_eq!(values[1], 102.0, epsilon = 1e-12);
    }

    #[test]
    fn ema_equal_prices() {
        let values = calculate_ema(&[100.0; 10], 100);
        for v in values {
            assert_relative_eq!(v, 100.0);
        }
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let values = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_empty_closes() {
        assert!(calculate_ema(&[], 100).is_empty());
    }

    #[test]
    fn ema_period_0() {
        assert!(calculate_ema(&[10.0, 20.0], 0).is_empty());
    }
}

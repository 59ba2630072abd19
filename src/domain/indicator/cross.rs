//! %K/%D crossing flags.
//!
//! Bull cross at t: K[t] > D[t] and K[t-1] <= D[t-1].
//! Bear cross at t: K[t] < D[t] and K[t-1] >= D[t-1].
//! The first bar never crosses, and any undefined value suppresses the cross.

pub fn crosses_above(k: &[Option<f64>], d: &[Option<f64>]) -> Vec<bool> {
    crossing(k, d, |kt, dt| kt > dt, |kp, dp| kp <= dp)
}

pub fn crosses_below(k: &[Option<f64>], d: &[Option<f64>]) -> Vec<bool> {
    crossing(k, d, |kt, dt| kt < dt, |kp, dp| kp >= dp)
}

fn crossing(
    k: &[Option<f64>],
    d: &[Option<f64>],
    now: impl Fn(f64, f64) -> bool,
    before: impl Fn(f64, f64) -> bool,
) -> Vec<bool> {
    let n = k.len().min(d.len());
    let mut flags = vec![false; n];
    for i in 1..n {
        if let (Some(kt), Some(dt), Some(kp), Some(dp)) = (k[i], d[i], k[i - 1], d[i - 1]) {
            flags[i] = now(kt, dt) && before(kp, dp);
        }
    }
    flags
}

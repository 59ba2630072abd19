//! Round-trip cycle statistics.
//!
//! Buys accumulate; a Sell closes every open buy at once. A cycle's entry is
//! the mean of its buy prices. Sells with nothing open are naked and close no
//! cycle.

use chrono::{DateTime, Utc};

use super::signal::{Signal, SignalKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub first_entry: DateTime<Utc>,
    pub exit: DateTime<Utc>,
    pub avg_entry: f64,
    pub exit_price: f64,
    /// (exit - entry) / entry
    pub profit_pct: f64,
    pub num_buys: usize,
}

/// Pair accumulated buys with the sell that closes them.
pub fn extract_cycles(signals: &[Signal]) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    let mut open: Vec<&Signal> = Vec::new();

    for signal in signals {
        match signal.kind {
            SignalKind::Buy => open.push(signal),
            SignalKind::Sell => {
                let Some(first) = open.first() else {
                    continue;
                };
                let avg_entry = open.iter().map(|s| s.price).sum::<f64>() / open.len() as f64;
                cycles.push(Cycle {
                    first_entry: first.time,
                    exit: signal.time,
                    avg_entry,
                    exit_price: signal.price,
                    profit_pct: (signal.price - avg_entry) / avg_entry,
                    num_buys: open.len(),
                });
                open.clear();
            }
        }
    }

    cycles
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    pub cycles: usize,
    pub naked_sells: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_profit: f64,
    /// Simple sum of cycle profits.
    pub total_return: f64,
    pub compounded_return: f64,
    pub best: f64,
    pub worst: f64,
    pub profit_factor: f64,
}

impl CycleStats {
    pub fn compute(signals: &[Signal]) -> Self {
        let cycles = extract_cycles(signals);
        let sells = signals.iter().filter(|s| s.is_sell()).count();
        Self::from_cycles(&cycles, sells - cycles.len())
    }

    pub fn from_cycles(cycles: &[Cycle], naked_sells: usize) -> Self {
        let profits: Vec<f64> = cycles.iter().map(|c| c.profit_pct).collect();

        if profits.is_empty() {
            return CycleStats {
                cycles: 0,
                naked_sells,
                wins: 0,
                losses: 0,
                win_rate: 0.0,
                avg_profit: 0.0,
                total_return: 0.0,
                compounded_return: 0.0,
                best: 0.0,
                worst: 0.0,
                profit_factor: 0.0,
            };
        }

        let n = profits.len() as f64;
        let wins = profits.iter().filter(|&&p| p > 0.0).count();
        let losses = profits.len() - wins;

        let total_return: f64 = profits.iter().sum();
        let compounded_return = profits.iter().fold(1.0, |acc, p| acc * (1.0 + p)) - 1.0;
        let best = profits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = profits.iter().copied().fold(f64::INFINITY, f64::min);

        let gross_win: f64 = profits.iter().filter(|&&p| p > 0.0).sum();
        let gross_loss: f64 = profits.iter().filter(|&&p| p <= 0.0).sum::<f64>().abs();
        let profit_factor = if gross_loss > 0.0 {
            gross_win / gross_loss
        } else {
            f64::INFINITY
        };

        CycleStats {
            cycles: profits.len(),
            naked_sells,
            wins,
            losses,
            win_rate: wins as f64 / n,
            avg_profit: total_return / n,
            total_return,
            compounded_return,
            best,
            worst,
            profit_factor,
        }
    }
}

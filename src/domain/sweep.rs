//! Grid search over the Daily strategy thresholds.

use log::info;
use rayon::prelude::*;

use crate::domain::bar::Bar;
use crate::domain::cycles::CycleStats;
use crate::domain::detector::detect;
use crate::domain::signal::count_by_kind;
use crate::domain::strategy::{StrategyConfig, Timeframe};

/// Values to try for each swept parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub rsi_buy: Vec<f64>,
    pub rsi_sell: Vec<f64>,
    /// Drives the blow-off sell extension only.
    pub ema_ext_sell: Vec<f64>,
    pub min_profit: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            rsi_buy: vec![30.0, 35.0, 40.0, 45.0],
            rsi_sell: vec![70.0, 75.0, 80.0],
            ema_ext_sell: vec![40.0, 45.0, 50.0, 60.0],
            min_profit: vec![0.15, 0.20, 0.25, 0.30],
        }
    }
}

impl ParamGrid {
    pub fn size(&self) -> usize {
        self.rsi_buy.len() * self.rsi_sell.len() * self.ema_ext_sell.len() * self.min_profit.len()
    }

    /// Every combination applied on top of `base`, always in Daily mode with
    /// the oversold level taken from `rsi_buy`.
    pub fn generate_configs(&self, base: &StrategyConfig) -> Vec<StrategyConfig> {
        let mut configs = Vec::with_capacity(self.size());

        for &rsi_buy in &self.rsi_buy {
            for &rsi_sell in &self.rsi_sell {
                for &ext in &self.ema_ext_sell {
                    for &min_profit in &self.min_profit {
                        configs.push(StrategyConfig {
                            timeframe: Timeframe::Daily,
                            rsi_buy_threshold: rsi_buy,
                            oversold_uses_rsi_buy: true,
                            rsi_sell_threshold: rsi_sell,
                            extreme_sell_ext_pct: ext,
                            min_profit_pct: min_profit,
                            ..base.clone()
                        });
                    }
                }
            }
        }

        configs
    }
}

/// Summary of one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub rsi_buy: f64,
    pub rsi_sell: f64,
    pub ema_ext_sell: f64,
    pub min_profit: f64,
    pub num_buys: usize,
    pub num_sells: usize,
    pub cycles: usize,
    pub avg_profit: f64,
    /// Simple sum of cycle profits.
    pub total_return: f64,
    pub win_rate: f64,
}

/// Run the detector once and summarise.
pub fn evaluate(bars: &[Bar], config: &StrategyConfig) -> SweepOutcome {
    let detection = detect(bars, config);
    let (num_buys, num_sells) = count_by_kind(&detection.signals);
    let stats = CycleStats::compute(&detection.signals);

    SweepOutcome {
        rsi_buy: config.rsi_buy_threshold,
        rsi_sell: config.rsi_sell_threshold,
        ema_ext_sell: config.extreme_sell_ext_pct,
        min_profit: config.min_profit_pct,
        num_buys,
        num_sells,
        cycles: stats.cycles,
        avg_profit: stats.avg_profit,
        total_return: stats.total_return,
        win_rate: stats.win_rate,
    }
}

/// Evaluate every grid point. Results are ordered best total return first.
pub fn run_sweep(
    bars: &[Bar],
    grid: &ParamGrid,
    base: &StrategyConfig,
    parallel: bool,
) -> Vec<SweepOutcome> {
    let configs = grid.generate_configs(base);
    info!(
        "sweeping {} combinations over {} bars ({})",
        configs.len(),
        bars.len(),
        if parallel { "parallel" } else { "sequential" }
    );

    let mut outcomes: Vec<SweepOutcome> = if parallel {
        configs.par_iter().map(|c| evaluate(bars, c)).collect()
    } else {
        configs.iter().map(|c| evaluate(bars, c)).collect()
    };

    outcomes.sort_by(|a, b| b.total_return.total_cmp(&a.total_return));
    outcomes
}

//! Sequential Buy/Sell signal detector.
//!
//! One forward pass over ascending bars. Daily mode arms buys from an RSI
//! oversold reading followed by a stochastic bull cross, and arms sells from
//! three independent overbought conditions. Weekly mode looks only at the
//! current bar. Both modes share the debounce rules and the position-aware
//! profit gate.
//!
//! Every comparison against an undefined indicator value is false.

use log::debug;

use crate::domain::bar::Bar;
use crate::domain::ledger::PositionLedger;
use crate::domain::signal::{Signal, SignalFlags, SignalKind};
use crate::domain::strategy::{StrategyConfig, Timeframe};
use crate::domain::tracker::BarTracker;

/// A Buy needs more than this many bars since the previous signal of either kind.
pub const BUY_DEBOUNCE_BARS: usize = 5;
/// A Sell needs more than this many bars since the previous Sell.
pub const SELL_DEBOUNCE_BARS: usize = 20;

const OVERSOLD_LOOKBACK_BARS: usize = 20;
const BUY_SETUP_BARS: usize = 20;
const STRONG_SELL_LOOKBACK_BARS: usize = 10;
const WEAK_SELL_LOOKBACK_BARS: usize = 20;

const DAILY_OVERSOLD_RSI: f64 = 35.0;
const WEAK_OVERBOUGHT_RSI: f64 = 65.0;
const EXTREME_OVERBOUGHT_RSI: f64 = 70.0;

const WEEKLY_OVERSOLD_RSI: f64 = 35.0;
const WEEKLY_BUY_STOCH_K: f64 = 9.0;
const WEEKLY_SELL_STOCH_K: f64 = 82.0;
const WEEKLY_SELL_RSI: f64 = 78.0;
const WEEKLY_SELL_EMA200_MULT: f64 = 1.80;
const WEEKLY_SELL_EMA100_MULT: f64 = 2.20;

fn below(value: Option<f64>, limit: f64) -> bool {
    matches!(value, Some(v) if v < limit)
}

fn above(value: Option<f64>, limit: f64) -> bool {
    matches!(value, Some(v) if v > limit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SellCandidate {
    /// May sell with no open position.
    extreme: bool,
}

/// Read-only view of the detector's lookback state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSnapshot {
    pub oversold: Option<usize>,
    pub ext_at_oversold: Option<f64>,
    pub bull_cross: Option<usize>,
    /// Written by both RSI > sell threshold and RSI > 70.
    pub strong_overbought: Option<usize>,
    pub weak_overbought: Option<usize>,
    pub bear_cross_strong: Option<usize>,
    pub bear_cross_weak: Option<usize>,
}

/// Output of a full run: per-bar flags aligned with the input, plus the
/// ordered signal list.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub flags: Vec<SignalFlags>,
    pub signals: Vec<Signal>,
    /// Buys still open after the last bar.
    pub open_ledger: PositionLedger,
}

#[derive(Debug, Clone)]
pub struct SignalDetector {
    config: StrategyConfig,
    oversold: BarTracker,
    ext_at_oversold: Option<f64>,
    bull_cross: BarTracker,
    strong_overbought: BarTracker,
    weak_overbought: BarTracker,
    bear_cross_strong: BarTracker,
    bear_cross_weak: BarTracker,
    ledger: PositionLedger,
    signals: Vec<Signal>,
}

impl SignalDetector {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            oversold: BarTracker::new(),
            ext_at_oversold: None,
            bull_cross: BarTracker::new(),
            strong_overbought: BarTracker::new(),
            weak_overbought: BarTracker::new(),
            bear_cross_strong: BarTracker::new(),
            bear_cross_weak: BarTracker::new(),
            ledger: PositionLedger::new(),
            signals: Vec::new(),
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn trackers(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            oversold: self.oversold.last(),
            ext_at_oversold: self.ext_at_oversold,
            bull_cross: self.bull_cross.last(),
            strong_overbought: self.strong_overbought.last(),
            weak_overbought: self.weak_overbought.last(),
            bear_cross_strong: self.bear_cross_strong.last(),
            bear_cross_weak: self.bear_cross_weak.last(),
        }
    }

    /// Advance by one bar. Returns the signal emitted on this bar, if any.
    ///
    /// Bars must arrive in ascending `index` order. At most one signal is
    /// emitted per bar; a Buy takes precedence over a Sell.
    pub fn step(&mut self, bar: &Bar) -> Option<Signal> {
        let buy_setup = match self.config.timeframe {
            Timeframe::Daily => self.daily_buy_setup(bar),
            Timeframe::Weekly => weekly_buy_setup(bar),
        };
        // Sell trackers advance on every bar, including ones that buy.
        let candidate = match self.config.timeframe {
            Timeframe::Daily => self.daily_sell_candidate(bar),
            Timeframe::Weekly => weekly_sell_candidate(bar),
        };

        if buy_setup && self.buy_debounce_clear(bar.index) {
            self.ledger.add(bar.close);
            self.bull_cross.clear();
            return Some(self.emit(SignalKind::Buy, bar));
        }

        let candidate = candidate?;

        if !self.sell_allowed(bar, candidate) || !self.sell_debounce_clear(bar.index) {
            return None;
        }

        self.ledger.clear();
        self.bear_cross_weak.clear();
        Some(self.emit(SignalKind::Sell, bar))
    }

    pub fn into_signals(self) -> Vec<Signal> {
        self.signals
    }

    fn emit(&mut self, kind: SignalKind, bar: &Bar) -> Signal {
        let signal = Signal {
            kind,
            price: bar.close,
            time: bar.time,
            bar_index: bar.index,
        };
        debug!(
            "{} {} at bar {} ({}) price {:.2}",
            self.config.timeframe,
            kind,
            bar.index,
            bar.date(),
            bar.close
        );
        self.signals.push(signal.clone());
        signal
    }

    fn daily_buy_setup(&mut self, bar: &Bar) -> bool {
        let now = bar.index;

        let oversold_level = if self.config.oversold_uses_rsi_buy {
            self.config.rsi_buy_threshold
        } else {
            DAILY_OVERSOLD_RSI
        };
        if below(bar.rsi, oversold_level) {
            self.oversold.mark(now);
            self.ext_at_oversold = bar.ema_ext_pct;
        }

        if bar.bull_cross && self.oversold.within(now, OVERSOLD_LOOKBACK_BARS) {
            self.bull_cross.mark(now);
        }

        if !self.bull_cross.within(now, BUY_SETUP_BARS) {
            return false;
        }

        if self.config.is_excluded(bar.date()) {
            return false;
        }

        if !bar.ema200.is_some_and(|ema| bar.close < ema) {
            return false;
        }

        if self.config.require_ema21_confirmation && !bar.ema21.is_some_and(|ema| bar.close > ema)
        {
            return false;
        }

        true
    }

    fn daily_sell_candidate(&mut self, bar: &Bar) -> Option<SellCandidate> {
        let now = bar.index;
        let mut armed = false;
        let mut extreme = false;

        // Strong: overbought above the configured threshold, then a bear cross
        // while well extended.
        if above(bar.rsi, self.config.rsi_sell_threshold) {
            self.strong_overbought.mark(now);
        }
        if bar.bear_cross {
            self.bear_cross_strong.mark(now);
        }
        if bar.bear_cross
            && self.strong_overbought.within(now, STRONG_SELL_LOOKBACK_BARS)
            && above(bar.ema_ext_pct, self.config.strong_sell_ext_pct)
        {
            armed = true;
        }

        // Weak: a recent bear cross followed by a close under EMA21.
        if above(bar.rsi, WEAK_OVERBOUGHT_RSI) {
            self.weak_overbought.mark(now);
        }
        if bar.bear_cross {
            self.bear_cross_weak.mark(now);
        }
        if bar.ema21.is_some_and(|ema| bar.close < ema)
            && self.bear_cross_weak.within(now, WEAK_SELL_LOOKBACK_BARS)
        {
            armed = true;
        }

        // Blow-off: RSI > 70 writes the same tracker as the strong condition.
        // The strong condition on later bars sees these marks too.
        if above(bar.rsi, EXTREME_OVERBOUGHT_RSI) {
            self.strong_overbought.mark(now);
        }
        if above(bar.ema_ext_pct, self.config.extreme_sell_ext_pct)
            && self.strong_overbought.within(now, STRONG_SELL_LOOKBACK_BARS)
            && bar.bear_cross
        {
            armed = true;
            extreme = true;
        }

        armed.then_some(SellCandidate { extreme })
    }

    fn sell_allowed(&self, bar: &Bar, candidate: SellCandidate) -> bool {
        if self.ledger.is_empty() {
            return candidate.extreme;
        }
        self.ledger
            .meets_profit_target(bar.close, self.config.min_profit_pct)
            .unwrap_or(false)
    }

    fn buy_debounce_clear(&self, now: usize) -> bool {
        self.signals
            .last()
            .is_none_or(|last| now.saturating_sub(last.bar_index) > BUY_DEBOUNCE_BARS)
    }

    fn sell_debounce_clear(&self, now: usize) -> bool {
        self.signals
            .iter()
            .rev()
            .find(|s| s.is_sell())
            .is_none_or(|last| now.saturating_sub(last.bar_index) > SELL_DEBOUNCE_BARS)
    }
}

fn weekly_buy_setup(bar: &Bar) -> bool {
    bar.close < bar.long_ema()
        && below(bar.stoch_k_18, WEEKLY_BUY_STOCH_K)
        && below(bar.rsi, WEEKLY_OVERSOLD_RSI)
}

fn weekly_sell_candidate(bar: &Bar) -> Option<SellCandidate> {
    if !above(bar.stoch_k_18, WEEKLY_SELL_STOCH_K) || !above(bar.rsi, WEEKLY_SELL_RSI) {
        return None;
    }
    let stretched = match bar.ema200 {
        Some(ema200) => bar.close > ema200 * WEEKLY_SELL_EMA200_MULT,
        None => bar.close > bar.ema100 * WEEKLY_SELL_EMA100_MULT,
    };
    stretched.then_some(SellCandidate { extreme: true })
}

/// Run a fresh detector over `bars`. The input is not modified.
pub fn detect(bars: &[Bar], config: &StrategyConfig) -> Detection {
    let mut detector = SignalDetector::new(config.clone());
    let mut flags = vec![SignalFlags::default(); bars.len()];

    for (pos, bar) in bars.iter().enumerate() {
        match detector.step(bar).map(|s| s.kind) {
            Some(SignalKind::Buy) => flags[pos].is_buy = true,
            Some(SignalKind::Sell) => flags[pos].is_sell = true,
            None => {}
        }
    }

    let open_ledger = detector.ledger().clone();
    let signals = detector.into_signals();
    debug!(
        "{} run over {} bars: {} signals, {} open buys",
        config.timeframe,
        bars.len(),
        signals.len(),
        open_ledger.len()
    );

    Detection {
        flags,
        signals,
        open_ledger,
    }
}

mod common;

use chrono::NaiveDate;
use common::*;
use longtrader::domain::bar::Bar;
use longtrader::domain::cycles::CycleStats;
use longtrader::domain::detector::{detect, SignalDetector, BUY_DEBOUNCE_BARS, SELL_DEBOUNCE_BARS};
use longtrader::domain::signal::{Signal, SignalKind};
use longtrader::domain::strategy::{StrategyConfig, Timeframe};
use longtrader::domain::sweep::{run_sweep, ParamGrid};
use proptest::prelude::*;

fn buys(signals: &[Signal]) -> Vec<usize> {
    signals.iter().filter(|s| s.is_buy()).map(|s| s.bar_index).collect()
}

fn sells(signals: &[Signal]) -> Vec<usize> {
    signals.iter().filter(|s| s.is_sell()).map(|s| s.bar_index).collect()
}

mod scenarios {
    use super::*;

    #[test]
    fn oversold_then_cross_buys_once() {
        let bars = SeriesBuilder::new(30).rsi(5, 20.0).bull_cross(10).build();
        let detection = detect(&bars, &StrategyConfig::default());

        assert_eq!(buys(&detection.signals), vec![10]);
        assert!(sells(&detection.signals).is_empty());
        assert!(detection.flags[10].is_buy);
        assert_eq!(detection.flags.iter().filter(|f| f.is_buy).count(), 1);
        assert_eq!(detection.open_ledger.prices(), &[100.0]);
    }

    #[test]
    fn cross_inside_exclusion_window_never_buys() {
        // bar 10 falls on 2021-11-30
        let start = NaiveDate::from_ymd_opt(2021, 11, 20).unwrap();
        let bars = SeriesBuilder::starting(30, start)
            .rsi(5, 20.0)
            .bull_cross(10)
            .build();
        assert_eq!(bars[10].date(), NaiveDate::from_ymd_opt(2021, 11, 30).unwrap());

        let detection = detect(&bars, &StrategyConfig::default());
        assert!(buys(&detection.signals).is_empty());
    }

    #[test]
    fn same_series_buys_without_exclusions() {
        let start = NaiveDate::from_ymd_opt(2021, 11, 20).unwrap();
        let bars = SeriesBuilder::starting(30, start)
            .rsi(5, 20.0)
            .bull_cross(10)
            .build();
        let config = StrategyConfig {
            exclusions: vec![],
            ..StrategyConfig::default()
        };
        assert_eq!(buys(&detect(&bars, &config).signals), vec![10]);
    }

    #[test]
    fn weekly_extreme_bar_buys_without_lookback() {
        let bars = SeriesBuilder::new(20)
            .stoch_k_18(7, 5.0)
            .rsi(7, 30.0)
            .build();
        let detection = detect(&bars, &StrategyConfig::weekly());
        assert_eq!(buys(&detection.signals), vec![7]);
    }

    #[test]
    fn profit_gate_blocks_then_allows_sell() {
        let bars = SeriesBuilder::new(60)
            .rsi(2, 20.0)
            .bull_cross(4)
            // strong sell armed at 120: short of 125
            .rsi(28, 75.0)
            .bear_cross(30)
            .close(30, 120.0)
            .ema200(30, Some(70.0))
            // armed again at 126
            .rsi(38, 75.0)
            .bear_cross(40)
            .close(40, 126.0)
            .ema200(40, Some(70.0))
            .build();

        let mut detector = SignalDetector::new(StrategyConfig::default());
        let mut emitted = Vec::new();
        for bar in &bars {
            if let Some(s) = detector.step(bar) {
                if s.is_sell() {
                    assert!(detector.ledger().is_empty());
                }
                emitted.push(s);
            }
        }

        assert_eq!(buys(&emitted), vec![4]);
        assert_eq!(sells(&emitted), vec![40]);
        assert_eq!(emitted[1].price, 126.0);
    }

    #[test]
    fn weak_sell_without_position_is_silent() {
        let bars = SeriesBuilder::new(30)
            .bear_cross(10)
            .close(12, 90.0)
            .build();
        let detection = detect(&bars, &StrategyConfig::default());
        assert!(detection.signals.is_empty());
    }

    #[test]
    fn blow_off_sell_fires_naked() {
        let bars = SeriesBuilder::new(30)
            .rsi(8, 72.0)
            .bear_cross(10)
            .close(10, 150.0)
            .ema200(10, Some(100.0))
            .build();
        let detection = detect(&bars, &StrategyConfig::default());
        assert_eq!(sells(&detection.signals), vec![10]);

        let stats = CycleStats::compute(&detection.signals);
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.naked_sells, 1);
    }
}

mod threshold_monotonicity {
    use super::*;

    /// Three dips of decreasing depth, each followed by a bull cross.
    fn graded_dips() -> Vec<Bar> {
        SeriesBuilder::new(150)
            .rsi(10, 20.0)
            .bull_cross(12)
            .rsi(50, 28.0)
            .bull_cross(52)
            .rsi(90, 33.0)
            .bull_cross(92)
            .build()
    }

    fn buy_count(threshold: f64, tuned: bool) -> usize {
        let config = StrategyConfig {
            rsi_buy_threshold: threshold,
            oversold_uses_rsi_buy: tuned,
            ..StrategyConfig::default()
        };
        buys(&detect(&graded_dips(), &config).signals).len()
    }

    #[test]
    fn tuned_threshold_drops_shallow_dips() {
        assert_eq!(buy_count(35.0, true), 3);
        assert_eq!(buy_count(30.0, true), 2);
        assert_eq!(buy_count(25.0, true), 1);
        assert_eq!(buy_count(15.0, true), 0);
    }

    #[test]
    fn default_detector_ignores_rsi_buy() {
        for threshold in [45.0, 35.0, 25.0, 15.0] {
            assert_eq!(buy_count(threshold, false), 3);
        }
    }
}

mod sweep {
    use super::*;

    #[test]
    fn sweep_ranks_profitable_grid_points_first() {
        // buy at 4, then a strong sell at 30 with price 130 (30% over entry)
        let bars = SeriesBuilder::new(60)
            .rsi(2, 20.0)
            .bull_cross(4)
            .rsi(28, 85.0)
            .bear_cross(30)
            .close(30, 130.0)
            .ema200(30, Some(80.0))
            .build();

        let grid = ParamGrid {
            rsi_buy: vec![15.0, 35.0],
            rsi_sell: vec![70.0],
            ema_ext_sell: vec![45.0],
            min_profit: vec![0.25, 0.5],
        };
        let outcomes = run_sweep(&bars, &grid, &StrategyConfig::default(), true);
        assert_eq!(outcomes.len(), 4);

        let best = &outcomes[0];
        assert_eq!(best.rsi_buy, 35.0);
        assert_eq!(best.min_profit, 0.25);
        assert_eq!(best.num_buys, 1);
        assert_eq!(best.num_sells, 1);
        assert!((best.total_return - 0.3).abs() < 1e-9);
        assert_eq!(best.win_rate, 1.0);

        assert!(outcomes.windows(2).all(|w| w[0].total_return >= w[1].total_return));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let bars = SeriesBuilder::new(120)
            .rsi(10, 25.0)
            .bull_cross(14)
            .rsi(40, 80.0)
            .bear_cross(45)
            .close(45, 140.0)
            .ema200(45, Some(90.0))
            .build();
        let grid = ParamGrid::default();
        let base = StrategyConfig::default();
        let mut parallel = run_sweep(&bars, &grid, &base, true);
        let mut sequential = run_sweep(&bars, &grid, &base, false);
        let key = |o: &longtrader::domain::sweep::SweepOutcome| {
            (
                o.rsi_buy as i64,
                o.rsi_sell as i64,
                o.ema_ext_sell as i64,
                (o.min_profit * 100.0).round() as i64,
            )
        };
        parallel.sort_by_key(key);
        sequential.sort_by_key(key);
        assert_eq!(parallel, sequential);
    }
}

fn arb_bars(timeframe_daily: bool) -> impl Strategy<Value = Vec<Bar>> {
    let row = (
        prop::option::weighted(0.9, 0.0f64..100.0),
        50.0f64..300.0,
        prop::option::weighted(0.8, 60.0f64..250.0),
        0u8..10,
        prop::option::of(0.0f64..100.0),
    );
    prop::collection::vec(row, 30..250).prop_map(move |rows| {
        let start = if timeframe_daily {
            NaiveDate::from_ymd_opt(2021, 11, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        };
        let mut builder = SeriesBuilder::starting(rows.len(), start);
        for (i, (rsi, close, ema200, cross, k18)) in rows.into_iter().enumerate() {
            builder = builder.close(i, close).ema200(i, ema200).ema21(i, close * 1.02);
            if let Some(r) = rsi {
                builder = builder.rsi(i, r);
            }
            if let Some(k) = k18 {
                builder = builder.stoch_k_18(i, k);
            }
            builder = match cross {
                0 | 1 => builder.bull_cross(i),
                2 | 3 => builder.bear_cross(i),
                _ => builder,
            };
        }
        builder.build()
    })
}

fn check_invariants(bars: &[Bar], config: &StrategyConfig) -> Result<(), TestCaseError> {
    let mut detector = SignalDetector::new(config.clone());
    let mut signals: Vec<Signal> = Vec::new();
    for bar in bars {
        if let Some(s) = detector.step(bar) {
            if s.is_sell() {
                prop_assert!(detector.ledger().is_empty());
            }
            signals.push(s);
        }
    }

    prop_assert!(signals.windows(2).all(|w| w[0].bar_index < w[1].bar_index));

    for (i, s) in signals.iter().enumerate() {
        match s.kind {
            SignalKind::Buy => {
                if i > 0 {
                    prop_assert!(s.bar_index - signals[i - 1].bar_index > BUY_DEBOUNCE_BARS);
                }
                if config.timeframe == Timeframe::Daily {
                    prop_assert!(!config.is_excluded(s.time.date_naive()));
                }
            }
            SignalKind::Sell => {
                if let Some(prev) = signals[..i].iter().rev().find(|p| p.is_sell()) {
                    prop_assert!(s.bar_index - prev.bar_index > SELL_DEBOUNCE_BARS);
                }
            }
        }
    }

    let detection = detect(bars, config);
    prop_assert_eq!(&detection.signals, &signals);
    prop_assert_eq!(detection.flags.len(), bars.len());
    let flagged = detection.flags.iter().filter(|f| f.is_buy || f.is_sell).count();
    prop_assert_eq!(flagged, signals.len());
    Ok(())
}

/// Bars on which the oversold tracker was marked.
fn oversold_marks(bars: &[Bar], config: &StrategyConfig) -> Vec<usize> {
    let mut detector = SignalDetector::new(config.clone());
    bars.iter()
        .filter_map(|bar| {
            detector.step(bar);
            (detector.trackers().oversold == Some(bar.index)).then_some(bar.index)
        })
        .collect()
}

proptest! {
    #[test]
    fn daily_detector_invariants(
        bars in arb_bars(true),
        rsi_buy in 20.0f64..50.0,
        tuned in any::<bool>(),
        min_profit in 0.0f64..0.4,
    ) {
        let config = StrategyConfig {
            rsi_buy_threshold: rsi_buy,
            oversold_uses_rsi_buy: tuned,
            min_profit_pct: min_profit,
            ..StrategyConfig::default()
        };
        check_invariants(&bars, &config)?;
    }

    #[test]
    fn lowering_rsi_buy_never_adds_buys(
        bars in arb_bars(true),
        high in 20.0f64..60.0,
        drop in 0.0f64..20.0,
    ) {
        let config = |threshold: f64| StrategyConfig {
            rsi_buy_threshold: threshold,
            ..StrategyConfig::default()
        };
        let strict = detect(&bars, &config(high - drop)).signals;
        let loose = detect(&bars, &config(high)).signals;
        prop_assert!(buys(&strict).len() <= buys(&loose).len());
        prop_assert_eq!(strict, loose);
    }

    #[test]
    fn lowering_tuned_rsi_buy_narrows_oversold_marks(
        bars in arb_bars(true),
        high in 20.0f64..60.0,
        drop in 0.0f64..20.0,
    ) {
        let config = |threshold: f64| StrategyConfig {
            rsi_buy_threshold: threshold,
            oversold_uses_rsi_buy: true,
            ..StrategyConfig::default()
        };
        let strict = oversold_marks(&bars, &config(high - drop));
        let loose = oversold_marks(&bars, &config(high));
        prop_assert!(strict.iter().all(|i| loose.contains(i)));
    }

    #[test]
    fn weekly_detector_invariants(bars in arb_bars(false)) {
        check_invariants(&bars, &StrategyConfig::weekly())?;
    }
}

//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bar::Bar;
use crate::domain::config_validation::{
    bad_buy_windows, build_param_grid, build_strategy_config, data_path, expected_sell_windows,
    sweep_parallel, sweep_top, validate_strategy_config, validate_sweep_config,
    validate_verify_config,
};
use crate::domain::cycles::{extract_cycles, CycleStats};
use crate::domain::detector::{detect, Detection};
use crate::domain::error::LongtraderError;
use crate::domain::indicator::supplement;
use crate::domain::signal::count_by_kind;
use crate::domain::strategy::{StrategyConfig, Timeframe};
use crate::domain::sweep::{run_sweep, SweepOutcome};
use crate::domain::verify::{verify, VerifyReport};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::BarSource;
use crate::ports::report_port::SignalReportPort;

/// Crossing detection compares against the previous bar.
pub const MIN_BARS: usize = 2;

#[derive(Parser, Debug)]
#[command(name = "longtrader", about = "Buy/Sell signal detector for daily and weekly bars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect signals and write the signal list (and optionally annotated bars)
    Detect {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        timeframe: Option<Timeframe>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        bars: Option<PathBuf>,
    },
    /// Print round-trip cycle statistics
    Stats {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },
    /// Grid-search the Daily thresholds
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        sequential: bool,
    },
    /// Check signals against bad-buy zones and expected-sell windows
    Verify {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Detect {
            config,
            data,
            timeframe,
            output,
            bars,
        } => run_detect(
            &config,
            data.as_deref(),
            timeframe,
            output.as_deref(),
            bars.as_deref(),
        ),
        Command::Stats {
            config,
            data,
            timeframe,
        } => run_stats(&config, data.as_deref(), timeframe),
        Command::Sweep {
            config,
            data,
            top,
            sequential,
        } => run_sweep_command(&config, data.as_deref(), top, sequential),
        Command::Verify {
            config,
            data,
            timeframe,
        } => run_verify(&config, data.as_deref(), timeframe),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, LongtraderError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Strategy from `[strategy]`, with an optional command-line timeframe.
pub fn resolve_strategy(
    config: &dyn ConfigPort,
    timeframe: Option<Timeframe>,
) -> Result<StrategyConfig, LongtraderError> {
    let mut strategy = build_strategy_config(config)?;
    if let Some(tf) = timeframe {
        strategy.timeframe = tf;
    }
    Ok(strategy)
}

/// Load exported rows and attach derived indicators.
pub fn prepare_bars(source: &dyn BarSource, path: &Path) -> Result<Vec<Bar>, LongtraderError> {
    let raw = source.load_bars(path)?;
    if raw.len() < MIN_BARS {
        return Err(LongtraderError::InsufficientData {
            bars: raw.len(),
            minimum: MIN_BARS,
        });
    }
    let bars = supplement(&raw);
    info!(
        "{} bars from {} to {}",
        bars.len(),
        bars[0].date(),
        bars[bars.len() - 1].date()
    );
    Ok(bars)
}

fn bars_for(
    config: &dyn ConfigPort,
    data_override: Option<&Path>,
) -> Result<Vec<Bar>, LongtraderError> {
    let override_str = data_override.map(|p| p.display().to_string());
    let path = data_path(config, override_str.as_deref())?;
    prepare_bars(&CsvAdapter::new(), Path::new(&path))
}

fn default_signals_path(timeframe: Timeframe) -> String {
    format!("signals_{}.csv", timeframe.to_string().to_lowercase())
}

fn run_detect(
    config_path: &Path,
    data_override: Option<&Path>,
    timeframe: Option<Timeframe>,
    output: Option<&Path>,
    bars_output: Option<&Path>,
) -> Result<(), LongtraderError> {
    let adapter = load_config(config_path)?;
    let strategy = resolve_strategy(&adapter, timeframe)?;
    let bars = bars_for(&adapter, data_override)?;

    let detection = detect(&bars, &strategy);
    print_detection_summary(&strategy, &detection);

    let signals_path = output
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "signals_path"))
        .unwrap_or_else(|| default_signals_path(strategy.timeframe));
    let bars_path = bars_output
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "bars_path"));

    CsvReportAdapter::new().write_detection(
        &bars,
        &detection,
        &signals_path,
        bars_path.as_deref(),
    )?;
    eprintln!("\nSignals written to: {signals_path}");
    if let Some(path) = bars_path {
        eprintln!("Annotated bars written to: {path}");
    }
    Ok(())
}

fn print_detection_summary(strategy: &StrategyConfig, detection: &Detection) {
    let (buys, sells) = count_by_kind(&detection.signals);
    println!(
        "Detected {buys} Buy and {sells} Sell signals for {}",
        strategy.timeframe
    );
    for s in &detection.signals {
        println!(
            "  {:<4} {}  bar {:>5}  {:>10.2}",
            s.kind.to_string(),
            s.time.date_naive(),
            s.bar_index,
            s.price
        );
    }
    if let Ok(avg) = detection.open_ledger.average() {
        println!(
            "Open position: {} buys, average entry {avg:.2}",
            detection.open_ledger.len()
        );
    }
}

fn run_stats(
    config_path: &Path,
    data_override: Option<&Path>,
    timeframe: Option<Timeframe>,
) -> Result<(), LongtraderError> {
    let adapter = load_config(config_path)?;
    let strategy = resolve_strategy(&adapter, timeframe)?;
    let bars = bars_for(&adapter, data_override)?;

    let detection = detect(&bars, &strategy);
    let stats = CycleStats::compute(&detection.signals);
    print!("{}", format_stats(&stats));

    let cycles = extract_cycles(&detection.signals);
    if !cycles.is_empty() {
        println!("\n=== Cycle Log ===");
        for c in &cycles {
            println!(
                "  {} -> {}  {} buys  avg {:>10.2}  exit {:>10.2}  {:+.1}%",
                c.first_entry.date_naive(),
                c.exit.date_naive(),
                c.num_buys,
                c.avg_entry,
                c.exit_price,
                c.profit_pct * 100.0
            );
        }
    }
    Ok(())
}

pub fn format_stats(stats: &CycleStats) -> String {
    let profit_factor = if stats.profit_factor.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", stats.profit_factor)
    };
    format!(
        "=== Cycle Statistics ===\n\
         Cycles:           {}\n\
         Naked Sells:      {}\n\
         Win Rate:         {:.1}%\n\
         Avg Profit:       {:.2}%\n\
         Total Return:     {:.2}%\n\
         Compounded:       {:.2}%\n\
         Best:             {:.2}%\n\
         Worst:            {:.2}%\n\
         Profit Factor:    {}\n",
        stats.cycles,
        stats.naked_sells,
        stats.win_rate * 100.0,
        stats.avg_profit * 100.0,
        stats.total_return * 100.0,
        stats.compounded_return * 100.0,
        stats.best * 100.0,
        stats.worst * 100.0,
        profit_factor,
    )
}

fn run_sweep_command(
    config_path: &Path,
    data_override: Option<&Path>,
    top_override: Option<usize>,
    sequential: bool,
) -> Result<(), LongtraderError> {
    let adapter = load_config(config_path)?;
    validate_sweep_config(&adapter)?;
    let base = resolve_strategy(&adapter, Some(Timeframe::Daily))?;
    let grid = build_param_grid(&adapter)?;
    let top = sweep_top(&adapter, top_override)?;
    let parallel = !sequential && sweep_parallel(&adapter)?;

    let bars = bars_for(&adapter, data_override)?;
    let outcomes = run_sweep(&bars, &grid, &base, parallel);
    if outcomes.iter().all(|o| o.num_sells == 0) {
        warn!("no grid point produced a sell");
    }

    eprintln!("Tested {} combinations", outcomes.len());
    print!("{}", format_sweep_table(&outcomes, top));
    Ok(())
}

pub fn format_sweep_table(outcomes: &[SweepOutcome], top: usize) -> String {
    let mut out = format!("=== Top {} ===\n", top.min(outcomes.len()));
    out.push_str(
        "rsi_buy  rsi_sell  ext_sell  min_profit  buys  sells  avg_profit  total_return  win_rate\n",
    );
    for o in outcomes.iter().take(top) {
        out.push_str(&format!(
            "{:>7.0}  {:>8.0}  {:>8.0}  {:>10.2}  {:>4}  {:>5}  {:>9.2}%  {:>11.2}%  {:>7.1}%\n",
            o.rsi_buy,
            o.rsi_sell,
            o.ema_ext_sell,
            o.min_profit,
            o.num_buys,
            o.num_sells,
            o.avg_profit * 100.0,
            o.total_return * 100.0,
            o.win_rate * 100.0,
        ));
    }
    out
}

fn run_verify(
    config_path: &Path,
    data_override: Option<&Path>,
    timeframe: Option<Timeframe>,
) -> Result<(), LongtraderError> {
    let adapter = load_config(config_path)?;
    let strategy = resolve_strategy(&adapter, timeframe)?;
    let bad_buys = bad_buy_windows(&adapter, &strategy)?;
    let expected_sells = expected_sell_windows(&adapter)?;
    let bars = bars_for(&adapter, data_override)?;

    let detection = detect(&bars, &strategy);
    let (buys, sells) = count_by_kind(&detection.signals);
    println!(
        "Detected {buys} Buy and {sells} Sell signals for {}",
        strategy.timeframe
    );

    let report = verify(&detection.signals, &bad_buys, &expected_sells);
    if report.bad_buy_count() > 0 {
        warn!("{} buys inside bad-buy zones", report.bad_buy_count());
    }
    if report.missing_sells() > 0 {
        warn!("{} expected sell windows without a sell", report.missing_sells());
    }
    print!("{}", format_verify_report(&report));
    Ok(())
}

pub fn format_verify_report(report: &VerifyReport) -> String {
    let mut out = String::from("=== Bad Buys ===\n");
    for hits in &report.bad_buys {
        out.push_str(&format!("{}: {} found\n", hits.window, hits.signals.len()));
    }
    out.push_str("=== Expected Sells ===\n");
    for hits in &report.expected_sells {
        let status = if hits.found() { "FOUND" } else { "MISSING" };
        out.push_str(&format!("{}: {status}\n", hits.window));
        for s in &hits.signals {
            out.push_str(&format!(
                "   {} at {:.2} on {}\n",
                s.kind,
                s.price,
                s.time.date_naive()
            ));
        }
    }
    out
}

fn run_validate(config_path: &Path) -> Result<(), LongtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;

    validate_strategy_config(&adapter)?;
    validate_sweep_config(&adapter)?;
    validate_verify_config(&adapter)?;
    let strategy = build_strategy_config(&adapter)?;

    eprintln!("\nStrategy:");
    eprintln!("  Timeframe:        {}", strategy.timeframe);
    eprintln!(
        "  RSI buy/sell:     {} / {}",
        strategy.rsi_buy_threshold, strategy.rsi_sell_threshold
    );
    eprintln!("  Tuned oversold:   {}", strategy.oversold_uses_rsi_buy);
    eprintln!("  Min profit:       {:.0}%", strategy.min_profit_pct * 100.0);
    eprintln!(
        "  Sell extension:   strong {}%, extreme {}%",
        strategy.strong_sell_ext_pct, strategy.extreme_sell_ext_pct
    );
    eprintln!("  EMA21 confirm:    {}", strategy.require_ema21_confirmation);
    for w in &strategy.exclusions {
        eprintln!("  Exclude:          {w}");
    }

    match data_path(&adapter, None) {
        Ok(p) => eprintln!("  Data:             {p}"),
        Err(_) => eprintln!("  Data:             (none, pass --data)"),
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

//! Configuration validation and typed config assembly.
//!
//! Everything here runs before any bar data is read. Absent keys fall back to
//! the timeframe preset; present keys must parse.

use crate::domain::error::LongtraderError;
use crate::domain::strategy::{DateWindow, StrategyConfig, Timeframe};
use crate::domain::verify::default_expected_sells;
use crate::domain::sweep::ParamGrid;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SWEEP_TOP: usize = 5;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> LongtraderError {
    LongtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Present-and-numeric, absent, or an error.
fn optional_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, LongtraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(section, key, format!("'{}' is not a number", s.trim()))),
        },
    }
}

fn optional_f64_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<f64>>, LongtraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(section, key, format!("'{s}' is not a number"))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err(invalid(section, key, "grid must not be empty"));
    }
    Ok(Some(values))
}

fn optional_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<bool>, LongtraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Some(true)),
        "false" | "no" | "off" | "0" => Ok(Some(false)),
        other => Err(invalid(section, key, format!("'{other}' is not a boolean"))),
    }
}

fn timeframe(config: &dyn ConfigPort) -> Result<Timeframe, LongtraderError> {
    match config.get_string("strategy", "timeframe") {
        None => Ok(Timeframe::Daily),
        Some(s) => s
            .parse::<Timeframe>()
            .map_err(|reason| invalid("strategy", "timeframe", reason)),
    }
}

fn check_rsi(section: &str, key: &str, value: f64) -> Result<(), LongtraderError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(invalid(section, key, format!("{key} must be between 0 and 100")));
    }
    Ok(())
}

fn check_non_negative(section: &str, key: &str, value: f64) -> Result<(), LongtraderError> {
    if value < 0.0 {
        return Err(invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), LongtraderError> {
    build_strategy_config(config).map(|_| ())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), LongtraderError> {
    build_param_grid(config)?;
    sweep_top(config, None)?;
    sweep_parallel(config)?;
    Ok(())
}

pub fn validate_verify_config(config: &dyn ConfigPort) -> Result<(), LongtraderError> {
    let strategy = build_strategy_config(config)?;
    bad_buy_windows(config, &strategy)?;
    expected_sell_windows(config)?;
    Ok(())
}

/// Assemble the detector configuration from `[strategy]`.
pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, LongtraderError> {
    let mut strategy = match timeframe(config)? {
        Timeframe::Daily => StrategyConfig::default(),
        Timeframe::Weekly => StrategyConfig::weekly(),
    };

    if let Some(v) = optional_f64(config, "strategy", "rsi_buy")? {
        check_rsi("strategy", "rsi_buy", v)?;
        strategy.rsi_buy_threshold = v;
    }
    if let Some(v) = optional_f64(config, "strategy", "rsi_sell")? {
        check_rsi("strategy", "rsi_sell", v)?;
        strategy.rsi_sell_threshold = v;
    }
    if let Some(v) = optional_f64(config, "strategy", "min_profit")? {
        check_non_negative("strategy", "min_profit", v)?;
        strategy.min_profit_pct = v;
    }
    if let Some(v) = optional_f64(config, "strategy", "strong_sell_ext")? {
        check_non_negative("strategy", "strong_sell_ext", v)?;
        strategy.strong_sell_ext_pct = v;
    }
    if let Some(v) = optional_f64(config, "strategy", "extreme_sell_ext")? {
        check_non_negative("strategy", "extreme_sell_ext", v)?;
        strategy.extreme_sell_ext_pct = v;
    }

    if let Some(v) = optional_bool(config, "strategy", "oversold_uses_rsi_buy")? {
        strategy.oversold_uses_rsi_buy = v;
    }
    if let Some(v) = optional_bool(config, "strategy", "require_ema21_confirmation")? {
        strategy.require_ema21_confirmation = v;
    }

    if let Some(raw) = config.get_string("strategy", "exclude") {
        strategy.exclusions = DateWindow::parse_list(&raw)
            .map_err(|reason| invalid("strategy", "exclude", reason))?;
    }

    Ok(strategy)
}

/// Assemble the sweep grid from `[sweep]`; absent axes keep their defaults.
pub fn build_param_grid(config: &dyn ConfigPort) -> Result<ParamGrid, LongtraderError> {
    let mut grid = ParamGrid::default();

    if let Some(values) = optional_f64_list(config, "sweep", "rsi_buy")? {
        values.iter().try_for_each(|v| check_rsi("sweep", "rsi_buy", *v))?;
        grid.rsi_buy = values;
    }
    if let Some(values) = optional_f64_list(config, "sweep", "rsi_sell")? {
        values.iter().try_for_each(|v| check_rsi("sweep", "rsi_sell", *v))?;
        grid.rsi_sell = values;
    }
    if let Some(values) = optional_f64_list(config, "sweep", "ema_ext_sell")? {
        values
            .iter()
            .try_for_each(|v| check_non_negative("sweep", "ema_ext_sell", *v))?;
        grid.ema_ext_sell = values;
    }
    if let Some(values) = optional_f64_list(config, "sweep", "min_profit")? {
        values
            .iter()
            .try_for_each(|v| check_non_negative("sweep", "min_profit", *v))?;
        grid.min_profit = values;
    }

    Ok(grid)
}

/// Rows to print: the command-line value, else `[sweep] top`, else 5.
pub fn sweep_top(
    config: &dyn ConfigPort,
    override_top: Option<usize>,
) -> Result<usize, LongtraderError> {
    let top = match (override_top, config.get_string("sweep", "top")) {
        (Some(n), _) => n,
        (None, None) => DEFAULT_SWEEP_TOP,
        (None, Some(raw)) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid("sweep", "top", format!("'{}' is not a count", raw.trim())))?,
    };
    if top < 1 {
        return Err(invalid("sweep", "top", "top must be at least 1"));
    }
    Ok(top)
}

pub fn sweep_parallel(config: &dyn ConfigPort) -> Result<bool, LongtraderError> {
    Ok(optional_bool(config, "sweep", "parallel")?.unwrap_or(true))
}

/// `[verify] bad_buys`, or the strategy's exclusion windows when absent.
pub fn bad_buy_windows(
    config: &dyn ConfigPort,
    strategy: &StrategyConfig,
) -> Result<Vec<DateWindow>, LongtraderError> {
    match config.get_string("verify", "bad_buys") {
        None => Ok(strategy.exclusions.clone()),
        Some(raw) => {
            DateWindow::parse_list(&raw).map_err(|reason| invalid("verify", "bad_buys", reason))
        }
    }
}

/// `[verify] expected_sells`, or the five hand-marked tops when absent.
pub fn expected_sell_windows(
    config: &dyn ConfigPort,
) -> Result<Vec<DateWindow>, LongtraderError> {
    match config.get_string("verify", "expected_sells") {
        None => Ok(default_expected_sells()),
        Some(raw) => DateWindow::parse_list(&raw)
            .map_err(|reason| invalid("verify", "expected_sells", reason)),
    }
}

/// `[data] path`, unless overridden on the command line.
pub fn data_path(
    config: &dyn ConfigPort,
    override_path: Option<&str>,
) -> Result<String, LongtraderError> {
    if let Some(p) = override_path {
        return Ok(p.to_string());
    }
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => Ok(p.trim().to_string()),
        _ => Err(LongtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

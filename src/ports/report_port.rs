//! Report output port trait.

use crate::domain::bar::Bar;
use crate::domain::detector::Detection;
use crate::domain::error::LongtraderError;
use crate::domain::signal::{Signal, SignalFlags};

/// Port for persisting detector output.
pub trait SignalReportPort {
    fn write_signals(&self, signals: &[Signal], output_path: &str) -> Result<(), LongtraderError>;

    /// `flags` is positionally aligned with `bars`.
    fn write_bars(
        &self,
        bars: &[Bar],
        flags: &[SignalFlags],
        output_path: &str,
    ) -> Result<(), LongtraderError>;

    /// Default implementation: signal list always, bar table only when a path is given.
    fn write_detection(
        &self,
        bars: &[Bar],
        detection: &Detection,
        signals_path: &str,
        bars_path: Option<&str>,
    ) -> Result<(), LongtraderError> {
        self.write_signals(&detection.signals, signals_path)?;
        if let Some(path) = bars_path {
            self.write_bars(bars, &detection.flags, path)?;
        }
        Ok(())
    }
}

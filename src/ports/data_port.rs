//! Bar data source port trait.

use std::path::Path;

use crate::domain::bar::MarketBar;
use crate::domain::error::LongtraderError;

pub trait BarSource {
    /// Load every row from `path`, ascending by time.
    fn load_bars(&self, path: &Path) -> Result<Vec<MarketBar>, LongtraderError>;
}

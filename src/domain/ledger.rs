//! Open-position ledger: accumulated buy prices awaiting a full close.

use crate::domain::error::LongtraderError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionLedger {
    prices: Vec<f64>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, price: f64) {
        self.prices.push(price);
    }

    /// Arithmetic mean of the open buy prices.
    pub fn average(&self) -> Result<f64, LongtraderError> {
        if self.prices.is_empty() {
            return Err(LongtraderError::EmptyLedger);
        }
        Ok(self.prices.iter().sum::<f64>() / self.prices.len() as f64)
    }

    /// Close everything. There is no partial reduction.
    pub fn clear(&mut self) {
        self.prices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Whether `price` clears the average entry by at least `min_profit_pct`
    /// (a fraction, 0.25 = 25%).
    pub fn meets_profit_target(
        &self,
        price: f64,
        min_profit_pct: f64,
    ) -> Result<bool, LongtraderError> {
        let average = self.average()?;
        Ok(price >= average * (1.0 + min_profit_pct))
    }
}

//! "Last bar at which condition X held" bookkeeping.

/// Bar index of the most recent occurrence of a condition, absent until the
/// first one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarTracker(Option<usize>);

impl BarTracker {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn mark(&mut self, bar: usize) {
        self.0 = Some(bar);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn last(&self) -> Option<usize> {
        self.0
    }

    /// present and (now - last) <= bars
    pub fn within(&self, now: usize, bars: usize) -> bool {
        match self.0 {
            Some(last) => now >= last && now - last <= bars,
            None => false,
        }
    }
}

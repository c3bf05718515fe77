use serde::{Deserialize, Serialize};

/// A (short, long) moving-average window pair, in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowPair {
    pub short: usize,
    pub long: usize,
}

impl WindowPair {
    /// Returned by the optimizer when no candidate produced a defined Sharpe ratio.
    pub const SENTINEL: WindowPair = WindowPair { short: 0, long: 0 };

    pub const fn new(short: usize, long: usize) -> Self {
        Self { short, long }
    }

    /// Both windows positive and `short < long`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.short > 0 && self.short < self.long
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

impl std::fmt::Display for WindowPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.short, self.long)
    }
}

/// Inclusive arithmetic range `start, start+step, ..., <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRange {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl StepRange {
    pub const fn new(start: usize, end: usize, step: usize) -> Self {
        Self { start, end, step }
    }

    /// Values in ascending order. A zero step yields only `start`.
    pub fn values(&self) -> Vec<usize> {
        if self.start > self.end {
            return Vec::new();
        }
        if self.step == 0 {
            return vec![self.start];
        }
        (self.start..=self.end).step_by(self.step).collect()
    }
}

/// Window-pair search space: short windows outer, long windows inner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchGrid {
    pub short: StepRange,
    pub long: StepRange,
}

impl SearchGrid {
    pub const fn new(short: StepRange, long: StepRange) -> Self {
        Self { short, long }
    }

    /// Valid candidates in evaluation order (short ascending, then long ascending).
    ///
    /// Pairs with `short >= long` are skipped, never scored.
    pub fn candidates(&self) -> Vec<WindowPair> {
        let longs = self.long.values();
        self.short
            .values()
            .into_iter()
            .flat_map(|short| longs.iter().map(move |&long| WindowPair { short, long }))
            .filter(WindowPair::is_valid)
            .collect()
    }
}

impl Default for SearchGrid {
    /// Short 10..=60 step 5, long 100..=250 step 10.
    fn default() -> Self {
        Self {
            short: StepRange::new(10, 60, 5),
            long: StepRange::new(100, 250, 10),
        }
    }
}

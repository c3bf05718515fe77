use macross_core::{PriceSeries, WindowPair};

use crate::crossover::{compute_signals, StrategySeries};

/// Unique signal-model identifier.
pub type ModelId = &'static str;

/// Pure-function signal interface for backtesting.
///
/// Models turn a price series and a window pair into a per-date signal
/// series. All models must be Send + Sync so the optimizer can evaluate
/// candidates on Rayon workers.
pub trait SignalModel: Send + Sync {
    /// Derive the signal series for one window pair. Must not mutate `prices`.
    fn compute(&self, prices: &PriceSeries, pair: WindowPair) -> StrategySeries;

    /// Return the model's unique identifier.
    fn id(&self) -> ModelId;
}

/// Long-only fast/slow simple moving-average crossover.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovingAverageCrossover;

impl SignalModel for MovingAverageCrossover {
    fn compute(&self, prices: &PriceSeries, pair: WindowPair) -> StrategySeries {
        compute_signals(prices, pair.short, pair.long)
    }

    fn id(&self) -> ModelId {
        "sma_crossover"
    }
}

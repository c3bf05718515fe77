use chrono::NaiveDate;
use serde::Serialize;

use macross_core::{CrossoverEvent, PriceSeries, WindowPair};

use crate::rolling::rolling_mean;

/// Per-date signal columns derived from a price series and a window pair.
///
/// Owns its own copy of dates and closes so every evaluation is independent
/// of the caller's series and of other evaluations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySeries {
    pub pair: WindowPair,
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    /// Trailing mean over `pair.short` closes; `None` during warmup.
    pub fast_ma: Vec<Option<f64>>,
    /// Trailing mean over `pair.long` closes; `None` during warmup.
    pub slow_ma: Vec<Option<f64>>,
    /// 1.0 when fast > slow, else 0.0. Forced to 0.0 for indices below `pair.long`.
    pub signal: Vec<f64>,
    /// `signal[t] - signal[t-1]`; `None` at t = 0.
    pub crossover: Vec<Option<f64>>,
    /// `signal[t-1]`; `None` at t = 0.
    pub position: Vec<Option<f64>>,
}

impl StrategySeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Buy/sell marker at index `i`, if the signal changed there.
    pub fn event_at(&self, i: usize) -> Option<CrossoverEvent> {
        self.crossover
            .get(i)
            .copied()
            .flatten()
            .and_then(CrossoverEvent::from_crossover)
    }

    /// All crossover events in date order.
    pub fn events(&self) -> Vec<(usize, CrossoverEvent)> {
        (0..self.len())
            .filter_map(|i| self.event_at(i).map(|e| (i, e)))
            .collect()
    }
}

/// Compute fast/slow means, the crossover signal and the lagged position.
///
/// Never fails: short or empty series simply leave the means undefined and
/// the signal flat. `short_window >= long_window` is accepted and evaluated
/// as given; callers that need a valid pair must check it themselves.
pub fn compute_signals(
    prices: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> StrategySeries {
    let n = prices.len();
    let fast_ma = rolling_mean(&prices.close, short_window);
    let slow_ma = rolling_mean(&prices.close, long_window);

    let signal: Vec<f64> = (0..n)
        .map(|t| {
            if t < long_window {
                return 0.0;
            }
            match (fast_ma[t], slow_ma[t]) {
                (Some(fast), Some(slow)) if fast > slow => 1.0,
                _ => 0.0,
            }
        })
        .collect();

    let crossover = lagged(&signal, |prev, cur| cur - prev);
    let position = lagged(&signal, |prev, _| prev);

    StrategySeries {
        pair: WindowPair::new(short_window, long_window),
        dates: prices.dates.clone(),
        close: prices.close.clone(),
        fast_ma,
        slow_ma,
        signal,
        crossover,
        position,
    }
}

/// `f(x[t-1], x[t])` for t >= 1, `None` at t = 0.
fn lagged(values: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|w| Some(f(w[0], w[1]))));
    out
}

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use macross_core::{PriceSeries, SearchGrid, WindowPair};
use macross_strategy::{MovingAverageCrossover, SignalModel};

use crate::metrics::compute_metrics;

/// Sharpe ratio of one evaluated window pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub pair: WindowPair,
    pub sharpe_ratio: Option<f64>,
}

/// Outcome of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimization {
    /// Winning pair, or [`WindowPair::SENTINEL`] when no candidate had a defined Sharpe.
    pub best: WindowPair,
    pub best_sharpe: Option<f64>,
    pub evaluated: usize,
    /// Every candidate's score in evaluation order.
    pub scores: Vec<CandidateScore>,
}

impl Optimization {
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.best.is_sentinel()
    }
}

/// Brute-force window-pair search maximising the Sharpe ratio.
///
/// Candidates are evaluated independently (optionally on Rayon workers),
/// collected in grid order, then reduced sequentially: only a strictly
/// greater Sharpe replaces the incumbent, so ties keep the earlier pair and
/// the result does not depend on completion order.
pub struct GridOptimizer<M: SignalModel> {
    model: M,
    grid: SearchGrid,
    parallel: bool,
}

impl<M: SignalModel> GridOptimizer<M> {
    pub fn new(model: M, grid: SearchGrid) -> Self {
        Self {
            model,
            grid,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, prices: &PriceSeries) -> Optimization {
        let candidates = self.grid.candidates();
        info!(
            model = self.model.id(),
            candidates = candidates.len(),
            bars = prices.len(),
            parallel = self.parallel,
            "running parameter optimization"
        );

        let scores: Vec<CandidateScore> = if self.parallel {
            candidates
                .par_iter()
                .map(|&pair| self.score(prices, pair))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&pair| self.score(prices, pair))
                .collect()
        };

        let (best, best_sharpe) = select_best(&scores);
        if best.is_sentinel() {
            info!("optimization complete: no candidate produced a defined Sharpe ratio");
        } else {
            info!(short = best.short, long = best.long, sharpe = ?best_sharpe, "optimization complete");
        }

        Optimization {
            best,
            best_sharpe,
            evaluated: scores.len(),
            scores,
        }
    }

    fn score(&self, prices: &PriceSeries, pair: WindowPair) -> CandidateScore {
        let series = self.model.compute(prices, pair);
        let metrics = compute_metrics(&series);
        debug!(short = pair.short, long = pair.long, sharpe = ?metrics.sharpe_ratio, "candidate evaluated");
        CandidateScore {
            pair,
            sharpe_ratio: metrics.sharpe_ratio,
        }
    }
}

/// First strict maximum in order; undefined Sharpe ratios never win.
fn select_best(scores: &[CandidateScore]) -> (WindowPair, Option<f64>) {
    let mut best = WindowPair::SENTINEL;
    let mut best_sharpe = f64::NEG_INFINITY;

    for score in scores {
        let Some(sharpe) = score.sharpe_ratio else {
            continue;
        };
        if sharpe > best_sharpe {
            best_sharpe = sharpe;
            best = score.pair;
            info!(short = best.short, long = best.long, sharpe, "new best found");
        }
    }

    let best_sharpe = (!best.is_sentinel()).then_some(best_sharpe);
    (best, best_sharpe)
}

/// Best moving-average crossover pair over the default grid.
///
/// Returns [`WindowPair::SENTINEL`] when no candidate has a defined Sharpe
/// ratio; callers must treat that as a failure.
pub fn optimize(prices: &PriceSeries) -> WindowPair {
    GridOptimizer::new(MovingAverageCrossover, SearchGrid::default())
        .run(prices)
        .best
}

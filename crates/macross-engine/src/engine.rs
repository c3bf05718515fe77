use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use macross_core::{CrossoverEvent, PriceSeries, WindowPair};
use macross_strategy::{ModelId, MovingAverageCrossover, SignalModel, StrategySeries};

use crate::metrics::{MetricsCalculator, MetricsReport, ReturnSeries};

/// Full result of evaluating one window pair.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestRun {
    pub model_id: ModelId,
    pub pair: WindowPair,
    pub series: StrategySeries,
    pub returns: ReturnSeries,
    pub metrics: MetricsReport,
}

/// One aligned per-date row: everything a chart needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRow {
    pub date: NaiveDate,
    pub close: f64,
    pub fast_ma: Option<f64>,
    pub slow_ma: Option<f64>,
    pub signal: f64,
    pub crossover: Option<f64>,
    pub position: Option<f64>,
    pub daily_return: Option<f64>,
    pub strategy_return: Option<f64>,
    pub cumulative_benchmark: Option<f64>,
    pub cumulative_strategy: Option<f64>,
    pub drawdown: Option<f64>,
    pub marker: Option<CrossoverEvent>,
}

/// Date-aligned view over a [`BacktestRun`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestFrame {
    pub pair: WindowPair,
    pub rows: Vec<FrameRow>,
}

impl BacktestFrame {
    /// (date, close) at every buy crossover.
    pub fn buy_markers(&self) -> Vec<(NaiveDate, f64)> {
        self.markers(CrossoverEvent::Buy)
    }

    /// (date, close) at every sell crossover.
    pub fn sell_markers(&self) -> Vec<(NaiveDate, f64)> {
        self.markers(CrossoverEvent::Sell)
    }

    fn markers(&self, kind: CrossoverEvent) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .filter(|r| r.marker == Some(kind))
            .map(|r| (r.date, r.close))
            .collect()
    }
}

impl BacktestRun {
    pub fn frame(&self) -> BacktestFrame {
        let s = &self.series;
        let r = &self.returns;
        let rows = (0..s.len())
            .map(|i| FrameRow {
                date: s.dates[i],
                close: s.close[i],
                fast_ma: s.fast_ma[i],
                slow_ma: s.slow_ma[i],
                signal: s.signal[i],
                crossover: s.crossover[i],
                position: s.position[i],
                daily_return: r.daily_return[i],
                strategy_return: r.strategy_return[i],
                cumulative_benchmark: r.cumulative_benchmark[i],
                cumulative_strategy: r.cumulative_strategy[i],
                drawdown: r.drawdown[i],
                marker: s.event_at(i),
            })
            .collect();
        BacktestFrame {
            pair: self.pair,
            rows,
        }
    }
}

/// Evaluates a signal model on a price series for a single window pair.
///
///   1. Derives the signal series (fast/slow means, signal, lagged position)
///   2. Derives the return columns (daily, strategy, cumulative, drawdown)
///   3. Computes the metric set once
pub struct BacktestEngine<M: SignalModel = MovingAverageCrossover> {
    model: M,
}

impl<M: SignalModel> BacktestEngine<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn run(&self, prices: &PriceSeries, pair: WindowPair) -> BacktestRun {
        let series = self.model.compute(prices, pair);
        let returns = MetricsCalculator::returns(&series);
        let metrics = MetricsCalculator::calculate(&returns);
        debug!(
            model = self.model.id(),
            short = pair.short,
            long = pair.long,
            bars = series.len(),
            trades = series.events().len(),
            "backtest evaluated"
        );

        BacktestRun {
            model_id: self.model.id(),
            pair,
            series,
            returns,
            metrics,
        }
    }
}

impl Default for BacktestEngine<MovingAverageCrossover> {
    fn default() -> Self {
        Self::new(MovingAverageCrossover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_metrics;
    use macross_strategy::compute_signals;

    fn oscillating(n: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 / 8.0).sin() * 8.0 + i as f64 * 0.05)
            .collect();
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(), &closes)
    }

    #[test]
    fn test_engine_matches_direct_pipeline() {
        let prices = oscillating(200);
        let run = BacktestEngine::default().run(&prices, WindowPair::new(5, 20));

        assert_eq!(run.model_id, "sma_crossover");
        assert_eq!(run.series, compute_signals(&prices, 5, 20));
        assert_eq!(run.metrics, compute_metrics(&run.series));
    }

    #[test]
    fn test_frame_is_aligned_with_prices() {
        let prices = oscillating(120);
        let run = BacktestEngine::default().run(&prices, WindowPair::new(5, 20));
        let frame = run.frame();

        assert_eq!(frame.rows.len(), prices.len());
        for (row, (&date, &close)) in frame.rows.iter().zip(prices.dates.iter().zip(&prices.close)) {
            assert_eq!(row.date, date);
            assert_eq!(row.close, close);
        }
        assert_eq!(frame.rows[0].position, None);
        assert_eq!(frame.rows[0].daily_return, None);
    }

    #[test]
    fn test_markers_follow_crossovers() {
        let prices = oscillating(300);
        let run = BacktestEngine::default().run(&prices, WindowPair::new(5, 20));
        let frame = run.frame();

        let buys = frame.buy_markers();
        let sells = frame.sell_markers();
        assert!(!buys.is_empty());
        assert!(buys.len().abs_diff(sells.len()) <= 1);
        for row in &frame.rows {
            match row.marker {
                Some(CrossoverEvent::Buy) => assert_eq!(row.crossover, Some(1.0)),
                Some(CrossoverEvent::Sell) => assert_eq!(row.crossover, Some(-1.0)),
                None => assert!(row.crossover.map_or(true, |c| c == 0.0)),
            }
        }
    }

    #[test]
    fn test_empty_prices_produce_empty_frame() {
        let run = BacktestEngine::default().run(&PriceSeries::new(), WindowPair::new(5, 20));
        assert!(run.frame().rows.is_empty());
        assert_eq!(run.metrics.sharpe_ratio, None);
    }

    #[test]
    fn test_flat_prices_never_trade() {
        let prices =
            PriceSeries::from_closes(NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(), &[33.33; 400]);
        let run = BacktestEngine::default().run(&prices, WindowPair::new(50, 200));
        let frame = run.frame();

        assert!(frame.buy_markers().is_empty());
        assert!(frame.sell_markers().is_empty());
        assert_eq!(run.metrics.total_strategy_return, Some(0.0));
    }
}

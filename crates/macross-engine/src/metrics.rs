use serde::Serialize;

use macross_strategy::StrategySeries;

use crate::stats::{defined, mean, sample_covariance, sample_std, sample_variance};

/// Trading days per year used for annualisation.
pub const TRADING_DAYS: f64 = 252.0;

/// Per-date return columns derived from a [`StrategySeries`].
///
/// Every column is aligned with the strategy series; `None` marks rows where
/// the value is undefined (before the first return, or before the lagged
/// position exists).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    /// `close[t] / close[t-1] - 1`.
    pub daily_return: Vec<Option<f64>>,
    /// `daily_return[t] * position[t-1]`.
    pub strategy_return: Vec<Option<f64>>,
    pub cumulative_benchmark: Vec<Option<f64>>,
    pub cumulative_strategy: Vec<Option<f64>>,
    /// Running maximum of `cumulative_strategy`.
    pub cumulative_max: Vec<Option<f64>>,
    /// `(cumulative_max - cumulative_strategy) / cumulative_max`.
    pub drawdown: Vec<Option<f64>>,
}

/// Computed performance metrics for one (window pair, price series).
///
/// `None` means undefined: too few observations, zero volatility for the
/// Sharpe ratio, or zero drawdown for the Calmar ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsReport {
    pub total_strategy_return: Option<f64>,
    pub total_benchmark_return: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub beta: Option<f64>,
    pub annualized_alpha: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub calmar_ratio: Option<f64>,
}

impl MetricsReport {
    /// Sharpe ratio for ranking: undefined sorts below every real value.
    pub fn sharpe_rank(&self) -> f64 {
        self.sharpe_ratio.unwrap_or(f64::NEG_INFINITY)
    }
}

pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Derive the return columns. Does not touch `series`.
    pub fn returns(series: &StrategySeries) -> ReturnSeries {
        let daily_return = Self::pct_change(&series.close);

        // position is already signal[t-1]; lag it once more before attributing
        // the close-to-close move, so a signal on bar t earns bar t+2's return.
        let strategy_return: Vec<Option<f64>> = (0..series.len())
            .map(|t| {
                let prev_position = t.checked_sub(1).and_then(|p| series.position[p]);
                Some(daily_return[t]? * prev_position?)
            })
            .collect();

        let cumulative_benchmark = Self::cumulative_product(&daily_return);
        let cumulative_strategy = Self::cumulative_product(&strategy_return);
        let cumulative_max = Self::running_max(&cumulative_strategy);
        let drawdown = cumulative_strategy
            .iter()
            .zip(&cumulative_max)
            .map(|(c, m)| match (*c, *m) {
                (Some(c), Some(m)) if m != 0.0 => Some((m - c) / m),
                _ => None,
            })
            .collect();

        ReturnSeries {
            daily_return,
            strategy_return,
            cumulative_benchmark,
            cumulative_strategy,
            cumulative_max,
            drawdown,
        }
    }

    /// Calculate all performance metrics from the return columns.
    pub fn calculate(returns: &ReturnSeries) -> MetricsReport {
        let strategy = defined(&returns.strategy_return);
        let benchmark = defined(&returns.daily_return);

        let mean_strategy = mean(&strategy);
        let std_strategy = sample_std(&strategy);
        let max_drawdown = Self::max_drawdown(&returns.drawdown);

        let sharpe_ratio = Self::sharpe_ratio(mean_strategy, std_strategy);
        let beta = Self::beta(returns, &benchmark);
        let annualized_alpha = match (mean_strategy, beta, mean(&benchmark)) {
            (Some(ms), Some(b), Some(mb)) => Some((ms - b * mb) * TRADING_DAYS),
            _ => None,
        };

        MetricsReport {
            total_strategy_return: Self::total_return(&returns.cumulative_strategy),
            total_benchmark_return: Self::total_return(&returns.cumulative_benchmark),
            sharpe_ratio,
            max_drawdown,
            beta,
            annualized_alpha,
            annualized_volatility: std_strategy.map(|s| s * TRADING_DAYS.sqrt()),
            calmar_ratio: Self::calmar_ratio(mean_strategy, max_drawdown),
        }
    }

    fn pct_change(close: &[f64]) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(close.len());
        if close.is_empty() {
            return out;
        }
        out.push(None);
        out.extend(close.windows(2).map(|w| Some(w[1] / w[0] - 1.0)));
        out
    }

    /// Running product of `1 + r`, seeded at 1. Undefined rows stay undefined
    /// and do not break the product.
    fn cumulative_product(returns: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut acc = 1.0;
        returns
            .iter()
            .map(|r| {
                let r = (*r)?;
                acc *= 1.0 + r;
                Some(acc)
            })
            .collect()
    }

    fn running_max(values: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut peak = f64::NEG_INFINITY;
        values
            .iter()
            .map(|v| {
                let v = (*v)?;
                peak = peak.max(v);
                Some(peak)
            })
            .collect()
    }

    fn total_return(cumulative: &[Option<f64>]) -> Option<f64> {
        cumulative.last().copied().flatten().map(|c| c - 1.0)
    }

    fn sharpe_ratio(mean: Option<f64>, std: Option<f64>) -> Option<f64> {
        let (mean, std) = (mean?, std?);
        if std == 0.0 {
            return None;
        }
        Some((mean * TRADING_DAYS) / (std * TRADING_DAYS.sqrt()))
    }

    fn max_drawdown(drawdown: &[Option<f64>]) -> Option<f64> {
        drawdown.iter().flatten().copied().reduce(f64::max)
    }

    fn beta(returns: &ReturnSeries, benchmark: &[f64]) -> Option<f64> {
        let cov = sample_covariance(&returns.strategy_return, &returns.daily_return)?;
        let var = sample_variance(benchmark)?;
        if var == 0.0 {
            return None;
        }
        Some(cov / var)
    }

    fn calmar_ratio(mean: Option<f64>, max_drawdown: Option<f64>) -> Option<f64> {
        let max_drawdown = max_drawdown?;
        if max_drawdown == 0.0 {
            return None;
        }
        Some(mean? * TRADING_DAYS / max_drawdown)
    }
}

/// Return columns and metrics for a signal series.
pub fn compute_returns(series: &StrategySeries) -> ReturnSeries {
    MetricsCalculator::returns(series)
}

/// Metrics for a signal series.
pub fn compute_metrics(series: &StrategySeries) -> MetricsReport {
    MetricsCalculator::calculate(&MetricsCalculator::returns(series))
}

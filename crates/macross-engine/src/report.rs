use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use macross_core::WindowPair;

use crate::engine::BacktestRun;
use crate::metrics::MetricsReport;
use crate::optimizer::Optimization;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a renderer may show for one backtest.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub ticker: &'a str,
    pub run: &'a BacktestRun,
    pub optimization: Option<&'a Optimization>,
}

impl<'a> Report<'a> {
    pub fn new(ticker: &'a str, run: &'a BacktestRun) -> Self {
        Self {
            ticker,
            run,
            optimization: None,
        }
    }

    pub fn with_optimization(mut self, optimization: &'a Optimization) -> Self {
        self.optimization = Some(optimization);
        self
    }
}

pub trait ReportRenderer {
    fn render(&self, report: &Report<'_>, out: &mut dyn Write) -> Result<(), ReportError>;
}

/// Fixed console layout: one line per metric, `N/A` for undefined values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &Report<'_>, out: &mut dyn Write) -> Result<(), ReportError> {
        if let Some(opt) = report.optimization {
            writeln!(out, "--- Optimization Complete ---")?;
            writeln!(
                out,
                "Best parameters are Short={}, Long={} ({} candidates evaluated)",
                opt.best.short, opt.best.long, opt.evaluated
            )?;
            writeln!(out)?;
        }

        let pair = report.run.pair;
        writeln!(
            out,
            "{} SMA crossover (Short={}, Long={})",
            report.ticker, pair.short, pair.long
        )?;
        write_metrics(&report.run.metrics, out)?;
        Ok(())
    }
}

fn write_metrics(m: &MetricsReport, out: &mut dyn Write) -> Result<(), ReportError> {
    writeln!(out, "--- Performance Metrics ---")?;
    writeln!(out, "Total Strategy Return: {}", percent(m.total_strategy_return))?;
    writeln!(out, "Total Buy-and-Hold Return: {}", percent(m.total_benchmark_return))?;
    writeln!(out, "Sharpe Ratio: {}", fixed(m.sharpe_ratio))?;
    writeln!(out, "Maximum Drawdown: {}", percent(m.max_drawdown))?;
    writeln!(out, "Beta: {}", fixed(m.beta))?;
    writeln!(out, "Annualised Alpha: {}", fixed(m.annualized_alpha))?;
    writeln!(out, "Annualised Volatility: {}", fixed(m.annualized_volatility))?;
    writeln!(out, "Calmar Ratio: {}", fixed(m.calmar_ratio))?;
    Ok(())
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => "N/A".to_string(),
    }
}

fn fixed(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "N/A".to_string(),
    }
}

/// Pretty JSON; undefined metrics serialize as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    ticker: &'a str,
    model: &'a str,
    pair: WindowPair,
    bars: usize,
    first_date: Option<String>,
    last_date: Option<String>,
    trades: usize,
    metrics: &'a MetricsReport,
    optimization: Option<OptimizationSummary>,
}

#[derive(Debug, Serialize)]
struct OptimizationSummary {
    best: WindowPair,
    best_sharpe: Option<f64>,
    evaluated: usize,
}

impl ReportRenderer for JsonRenderer {
    fn render(&self, report: &Report<'_>, out: &mut dyn Write) -> Result<(), ReportError> {
        let series = &report.run.series;
        let json = JsonReport {
            ticker: report.ticker,
            model: report.run.model_id,
            pair: report.run.pair,
            bars: series.len(),
            first_date: series.dates.first().map(ToString::to_string),
            last_date: series.dates.last().map(ToString::to_string),
            trades: series.events().len(),
            metrics: &report.run.metrics,
            optimization: report.optimization.map(|o| OptimizationSummary {
                best: o.best,
                best_sharpe: o.best_sharpe,
                evaluated: o.evaluated,
            }),
        };
        serde_json::to_writer_pretty(&mut *out, &json)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BacktestEngine;
    use chrono::NaiveDate;
    use macross_core::PriceSeries;
    use pretty_assertions::assert_eq;

    fn scenario_run() -> BacktestRun {
        let closes = [
            100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 115.0, 120.0, 118.0, 125.0,
        ];
        let prices = PriceSeries::from_closes(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), &closes);
        BacktestEngine::default().run(&prices, WindowPair::new(2, 4))
    }

    fn render(renderer: &dyn ReportRenderer, report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        renderer.render(report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(percent(Some(0.123456)), "12.35%");
        assert_eq!(percent(Some(-0.05)), "-5.00%");
        assert_eq!(fixed(Some(1.005)), "1.00");
        assert_eq!(fixed(Some(2.0)), "2.00");
        assert_eq!(fixed(None), "N/A");
        assert_eq!(percent(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_text_layout() {
        let run = scenario_run();
        let text = render(&TextRenderer, &Report::new("TEST", &run));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "TEST SMA crossover (Short=2, Long=4)");
        assert_eq!(lines[1], "--- Performance Metrics ---");
        assert_eq!(lines[2], "Total Strategy Return: 15.74%");
        assert_eq!(lines[3], "Total Buy-and-Hold Return: 25.00%");
        assert!(lines[4].starts_with("Sharpe Ratio: "));
        assert_eq!(lines[5], "Maximum Drawdown: 1.67%");
        let labels: Vec<&str> = lines[6..].iter().map(|l| l.split(':').next().unwrap()).collect();
        assert_eq!(
            labels,
            vec!["Beta", "Annualised Alpha", "Annualised Volatility", "Calmar Ratio"]
        );
    }

    #[test]
    fn test_text_renders_undefined_as_na() {
        let prices = PriceSeries::from_closes(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), &[50.0; 20]);
        let run = BacktestEngine::default().run(&prices, WindowPair::new(2, 4));
        let text = render(&TextRenderer, &Report::new("FLAT", &run));

        assert!(text.contains("Sharpe Ratio: N/A"));
        assert!(text.contains("Calmar Ratio: N/A"));
        assert!(text.contains("Beta: N/A"));
        assert!(text.contains("Maximum Drawdown: 0.00%"));
    }

    #[test]
    fn test_text_includes_optimization_header() {
        let run = scenario_run();
        let opt = Optimization {
            best: WindowPair::new(2, 4),
            best_sharpe: Some(1.5),
            evaluated: 3,
            scores: Vec::new(),
        };
        let text = render(&TextRenderer, &Report::new("TEST", &run).with_optimization(&opt));
        assert!(text.starts_with("--- Optimization Complete ---\n"));
        assert!(text.contains("Best parameters are Short=2, Long=4"));
    }

    #[test]
    fn test_json_uses_null_for_undefined() {
        let prices = PriceSeries::from_closes(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), &[50.0; 20]);
        let run = BacktestEngine::default().run(&prices, WindowPair::new(2, 4));
        let text = render(&JsonRenderer, &Report::new("FLAT", &run));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["ticker"], "FLAT");
        assert_eq!(value["pair"]["short"], 2);
        assert_eq!(value["pair"]["long"], 4);
        assert_eq!(value["first_date"], "2020-01-01");
        assert!(value["metrics"]["sharpe_ratio"].is_null());
        assert_eq!(value["metrics"]["total_strategy_return"], 0.0);
        assert!(value["optimization"].is_null());
    }
}

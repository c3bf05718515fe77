pub mod engine;
pub mod export;
pub mod metrics;
pub mod optimizer;
pub mod report;
pub mod stats;

pub use engine::{BacktestEngine, BacktestFrame, BacktestRun, FrameRow};
pub use export::{export_frame_csv, write_frame_csv, ExportError};
pub use metrics::{compute_metrics, compute_returns, MetricsCalculator, MetricsReport, ReturnSeries};
pub use optimizer::{optimize, CandidateScore, GridOptimizer, Optimization};
pub use report::{JsonRenderer, Report, ReportError, ReportRenderer, TextRenderer};

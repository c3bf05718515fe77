//! CSV export of the aligned backtest frame.
//!
//! Columns: date, close, fast_ma, slow_ma, signal, crossover, position,
//! daily_return, strategy_return, cumulative_benchmark, cumulative_strategy,
//! drawdown, marker. Undefined cells are written empty.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use crate::engine::BacktestFrame;

pub const FRAME_COLUMNS: [&str; 13] = [
    "date",
    "close",
    "fast_ma",
    "slow_ma",
    "signal",
    "crossover",
    "position",
    "daily_return",
    "strategy_return",
    "cumulative_benchmark",
    "cumulative_strategy",
    "drawdown",
    "marker",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path}: {source}")]
    Create { path: String, source: io::Error },
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Flush(#[from] io::Error),
}

/// Write the frame as CSV to any writer.
pub fn write_frame_csv<W: Write>(frame: &BacktestFrame, out: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(FRAME_COLUMNS)?;

    for row in &frame.rows {
        wtr.write_record([
            row.date.to_string(),
            row.close.to_string(),
            cell(row.fast_ma),
            cell(row.slow_ma),
            row.signal.to_string(),
            cell(row.crossover),
            cell(row.position),
            cell(row.daily_return),
            cell(row.strategy_return),
            cell(row.cumulative_benchmark),
            cell(row.cumulative_strategy),
            cell(row.drawdown),
            row.marker.map(|m| m.as_str().to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the frame as CSV to `path`, replacing any existing file.
pub fn export_frame_csv(frame: &BacktestFrame, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.display().to_string(),
        source,
    })?;
    write_frame_csv(frame, io::BufWriter::new(file))
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

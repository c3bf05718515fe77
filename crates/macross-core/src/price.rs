use std::path::Path;

use chrono::NaiveDate;

/// Struct-of-Arrays daily price storage.
///
/// All vectors are parallel: index `i` across all fields is one trading day.
/// Dates are strictly increasing once a series has been built through
/// [`PriceSeries::parse_csv_bytes`] or [`PriceSeries::from_closes`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

/// One row of a [`PriceSeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            dates: Vec::with_capacity(cap),
            open: Vec::with_capacity(cap),
            high: Vec::with_capacity(cap),
            low: Vec::with_capacity(cap),
            close: Vec::with_capacity(cap),
            volume: Vec::with_capacity(cap),
        }
    }

    /// Build a close-only series, one bar per calendar day starting at `start`.
    ///
    /// Open/high/low are set to the close and volume to zero.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Self {
        let mut series = Self::with_capacity(closes.len());
        let mut date = start;
        for &c in closes {
            series.push(PriceBar {
                date,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 0.0,
            });
            date = date.succ_opt().unwrap_or(date);
        }
        series
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn push(&mut self, bar: PriceBar) {
        self.dates.push(bar.date);
        self.open.push(bar.open);
        self.high.push(bar.high);
        self.low.push(bar.low);
        self.close.push(bar.close);
        self.volume.push(bar.volume);
    }

    pub fn bar(&self, i: usize) -> Option<PriceBar> {
        if i >= self.len() {
            return None;
        }
        Some(PriceBar {
            date: self.dates[i],
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume[i],
        })
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Load a provider CSV export using memory-mapped I/O.
    ///
    /// The header row names the columns; `date` and `close` are required,
    /// `open`, `high`, `low` and `volume` are picked up when present.
    pub fn from_csv(path: &Path) -> Result<Self, PriceError> {
        let file = std::fs::File::open(path)?;
        // Empty files cannot be mapped on every platform.
        if file.metadata()?.len() == 0 {
            return Ok(Self::new());
        }
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        let series = Self::parse_csv_bytes(&mmap[..])?;
        tracing::debug!(path = %path.display(), bytes = mmap.len(), bars = series.len(), "parsed price csv");
        Ok(series)
    }

    /// Parse CSV from raw bytes (testable without files).
    pub fn parse_csv_bytes(data: &[u8]) -> Result<Self, PriceError> {
        let len = data.len();
        let header_end = memchr::memchr(b'\n', data).unwrap_or(len);
        let header = trim_cr(&data[..header_end]);
        if header.is_empty() {
            return Ok(Self::new());
        }
        let columns = ColumnMap::from_header(header)?;

        // ~40 bytes per daily row
        let mut series = Self::with_capacity(len / 40);
        let mut pos = header_end + 1;
        let mut line_no = 1;

        while pos < len {
            line_no += 1;
            let line_end = memchr::memchr(b'\n', &data[pos..])
                .map(|i| pos + i)
                .unwrap_or(len);
            let line = trim_cr(&data[pos..line_end]);
            if !line.iter().all(u8::is_ascii_whitespace) {
                series.push(columns.parse_row(line, line_no)?);
            }
            pos = line_end + 1;
        }

        series.sort_and_check()
    }

    fn sort_and_check(self) -> Result<Self, PriceError> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.sort_by_key(|&i| self.dates[i]);

        let mut sorted = Self::with_capacity(indices.len());
        for &i in &indices {
            let bar = PriceBar {
                date: self.dates[i],
                open: self.open[i],
                high: self.high[i],
                low: self.low[i],
                close: self.close[i],
                volume: self.volume[i],
            };
            if sorted.last_date() == Some(bar.date) {
                return Err(PriceError::DuplicateDate(bar.date));
            }
            sorted.push(bar);
        }
        Ok(sorted)
    }

    /// Copy of the bars whose date lies in `[start, end]`. Open bounds are unbounded.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> PriceSeries {
        let lo = match start {
            Some(d) => self.dates.partition_point(|&x| x < d),
            None => 0,
        };
        let hi = match end {
            Some(d) => self.dates.partition_point(|&x| x <= d),
            None => self.len(),
        };
        self.slice(lo, hi)
    }

    /// Get a sub-slice view as a new PriceSeries (copies data).
    pub fn slice(&self, start: usize, end: usize) -> PriceSeries {
        let end = end.min(self.len());
        let start = start.min(end);
        PriceSeries {
            dates: self.dates[start..end].to_vec(),
            open: self.open[start..end].to_vec(),
            high: self.high[start..end].to_vec(),
            low: self.low[start..end].to_vec(),
            close: self.close[start..end].to_vec(),
            volume: self.volume[start..end].to_vec(),
        }
    }
}

/// Resolved column positions for a provider CSV.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[u8]) -> Result<Self, PriceError> {
        let names: Vec<String> = header
            .split(|&b| b == b',')
            .map(|f| String::from_utf8_lossy(f).trim().trim_matches('"').to_ascii_lowercase())
            .collect();
        let find = |wanted: &[&str]| {
            wanted
                .iter()
                .find_map(|w| names.iter().position(|n| n == w))
        };

        let date = find(&["date", "datetime", "timestamp"])
            .ok_or(PriceError::MissingColumn("date"))?;
        let close = find(&["close", "adj close", "adj_close"])
            .ok_or(PriceError::MissingColumn("close"))?;

        Ok(Self {
            date,
            close,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            volume: find(&["volume"]),
        })
    }

    fn parse_row(&self, line: &[u8], line_no: usize) -> Result<PriceBar, PriceError> {
        let fields: Vec<&[u8]> = line.split(|&b| b == b',').collect();
        let field = |idx: usize, name: &'static str| {
            fields
                .get(idx)
                .map(|f| trim_quotes(f))
                .ok_or_else(|| PriceError::Parse {
                    line: line_no,
                    message: format!("missing {name} field"),
                })
        };
        let number = |idx: usize, name: &'static str| -> Result<f64, PriceError> {
            let raw = field(idx, name)?;
            fast_float::parse(raw).map_err(|_| PriceError::Parse {
                line: line_no,
                message: format!("bad {name}: {}", String::from_utf8_lossy(raw)),
            })
        };
        // Unused by the strategy; blank cells are tolerated.
        let optional = |idx: Option<usize>, name: &'static str| -> Result<f64, PriceError> {
            match idx {
                Some(i) if !field(i, name)?.is_empty() => number(i, name),
                _ => Ok(f64::NAN),
            }
        };

        let raw_date = field(self.date, "date")?;
        let date = parse_date(raw_date).ok_or_else(|| PriceError::Parse {
            line: line_no,
            message: format!("bad date: {}", String::from_utf8_lossy(raw_date)),
        })?;
        let close = number(self.close, "close")?;
        if !close.is_finite() || close <= 0.0 {
            return Err(PriceError::NonPositiveClose { date, close });
        }

        Ok(PriceBar {
            date,
            open: optional(self.open, "open")?,
            high: optional(self.high, "high")?,
            low: optional(self.low, "low")?,
            close,
            volume: optional(self.volume, "volume")?,
        })
    }
}

/// Parse the leading `YYYY-MM-DD` of a date or datetime field.
fn parse_date(bytes: &[u8]) -> Option<NaiveDate> {
    if bytes.len() < 10 {
        return None;
    }
    let s = std::str::from_utf8(&bytes[..10]).ok()?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[inline]
fn trim_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn trim_quotes(bytes: &[u8]) -> &[u8] {
    let bytes = trim_ascii(bytes);
    match bytes {
        [b'"', inner @ .., b'"'] => inner,
        _ => bytes,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("non-positive close {close} on {date}")]
    NonPositiveClose { date: NaiveDate, close: f64 },
    #[error("duplicate bar for {0}")]
    DuplicateDate(NaiveDate),
}

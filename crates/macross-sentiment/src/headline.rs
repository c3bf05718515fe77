use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single news headline with its publication time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub published_at: DateTime<Utc>,
    pub title: String,
}

impl Headline {
    pub fn new(published_at: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            published_at,
            title: title.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct HeadlineRecord {
    #[serde(rename = "publishedAt")]
    published_at: String,
    title: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SentimentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: bad publishedAt timestamp {value:?}")]
    Timestamp { line: u64, value: String },
}

/// Load headlines from a `publishedAt,title` CSV file.
///
/// A missing file is an error; an empty file yields no headlines.
pub fn load_headlines(path: &Path) -> Result<Vec<Headline>, SentimentError> {
    let file = File::open(path).map_err(|source| SentimentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let headlines = read_headlines(file)?;
    debug!(path = %path.display(), count = headlines.len(), "loaded headlines");
    Ok(headlines)
}

/// Read headlines from any CSV source, in file order.
pub fn read_headlines<R: Read>(source: R) -> Result<Vec<Headline>, SentimentError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(false).from_reader(source);
    let mut headlines = Vec::new();

    for result in rdr.deserialize::<HeadlineRecord>() {
        let record = result?;
        let published_at = parse_timestamp(&record.published_at).ok_or_else(|| {
            SentimentError::Timestamp {
                // Header is line 1.
                line: headlines.len() as u64 + 2,
                value: record.published_at.clone(),
            }
        })?;
        headlines.push(Headline {
            published_at,
            title: record.title,
        });
    }
    Ok(headlines)
}

/// Store headlines as a `publishedAt,title` CSV file, replacing it if present.
pub fn store_headlines(path: &Path, headlines: &[Headline]) -> Result<(), SentimentError> {
    let file = File::create(path).map_err(|source| SentimentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_headlines(file, headlines)?;
    debug!(path = %path.display(), count = headlines.len(), "stored headlines");
    Ok(())
}

pub fn write_headlines<W: Write>(out: W, headlines: &[Headline]) -> Result<(), SentimentError> {
    let mut wtr = csv::Writer::from_writer(out);
    if headlines.is_empty() {
        wtr.write_record(["publishedAt", "title"])?;
    }
    for h in headlines {
        wtr.serialize(HeadlineRecord {
            published_at: format_timestamp(&h.published_at),
            title: h.title.clone(),
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accepts RFC 3339 (`2024-01-03T14:05:00Z`), an offset with a space
/// separator (`2024-01-03 14:05:00+00:00`) or a naive timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_mixed_timestamp_formats() {
        let data = "publishedAt,title\n\
                    2024-01-03T14:05:00Z,Nvidia shares rally\n\
                    2024-01-04 09:30:00+00:00,\"Chips, again\"\n\
                    2024-01-05 16:00:00,Plain timestamp\n";
        let headlines = read_headlines(data.as_bytes()).unwrap();

        assert_eq!(headlines.len(), 3);
        assert_eq!(
            headlines[0].published_at,
            Utc.with_ymd_and_hms(2024, 1, 3, 14, 5, 0).unwrap()
        );
        assert_eq!(headlines[1].title, "Chips, again");
        assert_eq!(
            headlines[2].published_at,
            Utc.with_ymd_and_hms(2024, 1, 5, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_offset_is_normalised_to_utc() {
        let data = "publishedAt,title\n2024-01-03T23:30:00-02:00,Late news\n";
        let headlines = read_headlines(data.as_bytes()).unwrap();
        assert_eq!(
            headlines[0].published_at,
            Utc.with_ymd_and_hms(2024, 1, 4, 1, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_bad_timestamp_reports_line() {
        let data = "publishedAt,title\n2024-01-03T14:05:00Z,ok\nyesterday,bad\n";
        match read_headlines(data.as_bytes()) {
            Err(SentimentError::Timestamp { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_yields_no_headlines() {
        assert!(read_headlines("".as_bytes()).unwrap().is_empty());
        assert!(read_headlines("publishedAt,title\n".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_headlines(Path::new("/nonexistent/headlines.csv")).unwrap_err();
        assert!(matches!(err, SentimentError::Io { .. }));
    }

    #[test]
    fn test_store_then_load() {
        let headlines = vec![
            Headline::new(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap(), "Record profit"),
            Headline::new(Utc.with_ymd_and_hms(2024, 2, 2, 20, 15, 0).unwrap(), "Shares \"slide\""),
        ];
        let path = std::env::temp_dir().join(format!("macross_headlines_{}.csv", std::process::id()));
        store_headlines(&path, &headlines).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let loaded = load_headlines(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(text.starts_with("publishedAt,title\n2024-02-01T08:00:00Z,Record profit\n"));
        assert_eq!(loaded, headlines);
    }
}

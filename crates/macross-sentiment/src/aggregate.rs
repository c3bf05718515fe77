use std::io::Write;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::headline::{format_timestamp, Headline, SentimentError};
use crate::scorer::PolarityScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label by sign; undefined polarity is neutral.
    pub fn from_polarity(polarity: Option<f64>) -> Self {
        match polarity {
            Some(p) if p > 0.0 => SentimentLabel::Positive,
            Some(p) if p < 0.0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHeadline {
    pub headline: Headline,
    pub polarity: f64,
    pub label: SentimentLabel,
}

/// One calendar day (UTC) of aggregated sentiment.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySentiment {
    pub date: NaiveDate,
    /// Mean polarity; `None` on days without headlines.
    pub polarity: Option<f64>,
    pub label: SentimentLabel,
    pub count: usize,
}

pub fn score_headlines(headlines: &[Headline], scorer: &dyn PolarityScorer) -> Vec<ScoredHeadline> {
    headlines
        .iter()
        .map(|h| {
            let polarity = scorer.polarity(&h.title);
            ScoredHeadline {
                headline: h.clone(),
                polarity,
                label: SentimentLabel::from_polarity(Some(polarity)),
            }
        })
        .collect()
}

/// Resample scored headlines to calendar days.
///
/// Emits one row for every day from the earliest to the latest headline day,
/// including days with no headlines. Input order does not matter.
pub fn daily_sentiment(scored: &[ScoredHeadline]) -> Vec<DailySentiment> {
    let days = scored.iter().map(|s| s.headline.published_at.date_naive());
    let (Some(first), Some(last)) = (days.clone().min(), days.max()) else {
        return Vec::new();
    };

    let span = (last - first).num_days() as usize + 1;
    let mut sums = vec![0.0; span];
    let mut counts = vec![0usize; span];
    for s in scored {
        let idx = (s.headline.published_at.date_naive() - first).num_days() as usize;
        sums[idx] += s.polarity;
        counts[idx] += 1;
    }

    let rows: Vec<DailySentiment> = (0..span)
        .map(|i| {
            let polarity = (counts[i] > 0).then(|| sums[i] / counts[i] as f64);
            DailySentiment {
                date: first + Duration::days(i as i64),
                polarity,
                label: SentimentLabel::from_polarity(polarity),
                count: counts[i],
            }
        })
        .collect();

    info!(
        headlines = scored.len(),
        days = rows.len(),
        empty_days = rows.iter().filter(|r| r.count == 0).count(),
        "daily sentiment aggregated"
    );
    rows
}

#[derive(Serialize)]
struct ScoredRecord<'a> {
    #[serde(rename = "publishedAt")]
    published_at: String,
    title: &'a str,
    sentiment: f64,
    sentiment_label: SentimentLabel,
}

#[derive(Serialize)]
struct DailyRecord {
    date: NaiveDate,
    sentiment: Option<f64>,
    sentiment_label: SentimentLabel,
    count: usize,
}

/// Columns: publishedAt, title, sentiment, sentiment_label.
pub fn write_scored_csv<W: Write>(out: W, scored: &[ScoredHeadline]) -> Result<(), SentimentError> {
    let mut wtr = csv::Writer::from_writer(out);
    if scored.is_empty() {
        wtr.write_record(["publishedAt", "title", "sentiment", "sentiment_label"])?;
    }
    for s in scored {
        wtr.serialize(ScoredRecord {
            published_at: format_timestamp(&s.headline.published_at),
            title: &s.headline.title,
            sentiment: s.polarity,
            sentiment_label: s.label,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Columns: date, sentiment, sentiment_label, count. Empty days leave
/// `sentiment` blank.
pub fn write_daily_csv<W: Write>(out: W, daily: &[DailySentiment]) -> Result<(), SentimentError> {
    let mut wtr = csv::Writer::from_writer(out);
    if daily.is_empty() {
        wtr.write_record(["date", "sentiment", "sentiment_label", "count"])?;
    }
    for d in daily {
        wtr.serialize(DailyRecord {
            date: d.date,
            sentiment: d.polarity,
            sentiment_label: d.label,
            count: d.count,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

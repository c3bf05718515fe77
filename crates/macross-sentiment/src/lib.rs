//! Headline sentiment: stored headline files, a pluggable polarity scorer
//! and per-day aggregation.

pub mod aggregate;
pub mod headline;
pub mod scorer;

pub use aggregate::{
    daily_sentiment, score_headlines, write_daily_csv, write_scored_csv, DailySentiment,
    ScoredHeadline, SentimentLabel,
};
pub use headline::{
    load_headlines, read_headlines, store_headlines, write_headlines, Headline, SentimentError,
};
pub use scorer::{LexiconScorer, PolarityScorer};

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use macross_core::{BacktestConfig, PriceSeries, WindowPair};
use macross_engine::{
    export_frame_csv, BacktestEngine, GridOptimizer, JsonRenderer, Optimization, Report,
    ReportRenderer, TextRenderer,
};
use macross_sentiment::{
    daily_sentiment, load_headlines, score_headlines, write_daily_csv, write_scored_csv,
    LexiconScorer, SentimentLabel,
};
use macross_strategy::MovingAverageCrossover;

const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser, Debug)]
#[command(name = "macross", version, about = "Moving-average crossover backtester")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Backtest one window pair (or the optimizer's pick) and print its metrics
    Backtest(BacktestArgs),
    /// Grid-search window pairs by Sharpe ratio and report the winner
    Optimize(OptimizeArgs),
    /// Score stored headlines and optionally aggregate them per day
    Sentiment(SentimentArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Path to a daily price CSV (date + close columns)
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Path to TOML config file(s), comma-separated for merge
    #[arg(long)]
    config: Option<String>,

    /// Ticker label used in reports
    #[arg(long)]
    ticker: Option<String>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the per-date frame (closes, averages, signals, returns) as CSV
    #[arg(long)]
    frame_out: Option<PathBuf>,

    /// Evaluate grid candidates on a single thread
    #[arg(long)]
    sequential: bool,
}

#[derive(Args, Debug)]
struct BacktestArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Fast moving-average window
    #[arg(long, requires = "long", conflicts_with = "optimize")]
    short: Option<usize>,

    /// Slow moving-average window
    #[arg(long, requires = "short", conflicts_with = "optimize")]
    long: Option<usize>,

    /// Pick the windows with the grid optimizer first
    #[arg(long)]
    optimize: bool,
}

#[derive(Args, Debug)]
struct OptimizeArgs {
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Args, Debug)]
struct SentimentArgs {
    /// Headline CSV with publishedAt,title columns
    #[arg(long)]
    headlines: Option<PathBuf>,

    /// Path to TOML config file(s), comma-separated for merge
    #[arg(long)]
    config: Option<String>,

    /// Aggregate to one row per calendar day
    #[arg(long)]
    daily: bool,

    /// Write the table as CSV here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Backtest(args) => run_backtest(args),
        Command::Optimize(args) => run_optimize(args),
        Command::Sentiment(args) => run_sentiment(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(paths: Option<&str>) -> Result<BacktestConfig> {
    let paths: Vec<PathBuf> = match paths {
        Some(list) => list.split(',').map(str::trim).map(PathBuf::from).collect(),
        None if Path::new(DEFAULT_CONFIG).exists() => vec![PathBuf::from(DEFAULT_CONFIG)],
        None => return Ok(BacktestConfig::default()),
    };
    let refs: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
    BacktestConfig::from_toml_files(&refs)
        .with_context(|| format!("loading config from {:?}", paths))
}

/// Load the configured price file and cut it to the requested date range.
fn load_prices(args: &DataArgs, config: &BacktestConfig) -> Result<PriceSeries> {
    let Some(path) = args.prices.as_ref().or(config.data.prices.as_ref()) else {
        bail!("no price file given: pass --prices or set [data] prices in the config");
    };

    let load_start = Instant::now();
    let prices = PriceSeries::from_csv(path)
        .with_context(|| format!("loading prices from {}", path.display()))?;
    let start = args.start.or(config.data.start);
    let end = args.end.or(config.data.end);
    let prices = prices.between(start, end);
    info!(
        path = %path.display(),
        bars = prices.len(),
        first = ?prices.first_date(),
        last = ?prices.last_date(),
        elapsed_ms = load_start.elapsed().as_secs_f64() * 1000.0,
        "loaded prices"
    );

    if prices.is_empty() {
        warn!("price series is empty; metrics will be undefined");
    }
    Ok(prices)
}

fn run_grid(prices: &PriceSeries, config: &BacktestConfig, sequential: bool) -> Result<Optimization> {
    let optimizer = GridOptimizer::new(MovingAverageCrossover, config.optimizer.grid())
        .with_parallel(config.optimizer.parallel && !sequential);

    let run_start = Instant::now();
    let result = optimizer.run(prices);
    info!(
        evaluated = result.evaluated,
        elapsed_ms = run_start.elapsed().as_secs_f64() * 1000.0,
        "grid search finished"
    );

    if result.is_sentinel() {
        bail!("no candidate produced a defined Sharpe ratio");
    }
    Ok(result)
}

fn run_backtest(args: BacktestArgs) -> Result<()> {
    let config = load_config(args.data.config.as_deref())?;
    let prices = load_prices(&args.data, &config)?;

    let optimization = if args.optimize {
        Some(run_grid(&prices, &config, args.data.sequential)?)
    } else {
        None
    };
    let pair = select_pair(optimization.as_ref(), args.short, args.long, &config);
    report(&args.data, &config, &prices, pair, optimization.as_ref())
}

/// Optimizer pick first, then explicit flags, then the configured pair.
///
/// A pair that is not `0 < short < long` is evaluated as given.
fn select_pair(
    optimization: Option<&Optimization>,
    short: Option<usize>,
    long: Option<usize>,
    config: &BacktestConfig,
) -> WindowPair {
    let pair = match (optimization, short, long) {
        (Some(opt), _, _) => opt.best,
        (None, Some(short), Some(long)) => WindowPair::new(short, long),
        _ => config.strategy.window_pair(),
    };
    if !pair.is_valid() {
        warn!(%pair, "window pair is not 0 < short < long; evaluating as given");
    }
    pair
}

fn run_optimize(args: OptimizeArgs) -> Result<()> {
    let config = load_config(args.data.config.as_deref())?;
    let prices = load_prices(&args.data, &config)?;
    let optimization = run_grid(&prices, &config, args.data.sequential)?;
    report(&args.data, &config, &prices, optimization.best, Some(&optimization))
}

fn report(
    args: &DataArgs,
    config: &BacktestConfig,
    prices: &PriceSeries,
    pair: WindowPair,
    optimization: Option<&Optimization>,
) -> Result<()> {
    let run = BacktestEngine::new(MovingAverageCrossover).run(prices, pair);
    let ticker = args.ticker.as_deref().unwrap_or(&config.data.ticker);

    let mut report = Report::new(ticker, &run);
    if let Some(opt) = optimization {
        report = report.with_optimization(opt);
    }
    let renderer: Box<dyn ReportRenderer> = match args.format {
        Format::Text => Box::new(TextRenderer),
        Format::Json => Box::new(JsonRenderer),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    renderer
        .render(&report, &mut out)
        .context("rendering report")?;
    out.flush()?;

    if let Some(path) = &args.frame_out {
        export_frame_csv(&run.frame(), path)
            .with_context(|| format!("writing frame to {}", path.display()))?;
        info!(path = %path.display(), rows = run.series.len(), "frame written");
    }
    Ok(())
}

fn run_sentiment(args: SentimentArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let Some(path) = args.headlines.as_ref().or(config.sentiment.headlines.as_ref()) else {
        bail!("no headline file given: pass --headlines or set [sentiment] headlines in the config");
    };

    let headlines =
        load_headlines(path).with_context(|| format!("loading headlines from {}", path.display()))?;
    if headlines.is_empty() {
        bail!("no headlines found in {}", path.display());
    }

    let scored = score_headlines(&headlines, &LexiconScorer::new());
    let positive = scored.iter().filter(|s| s.label == SentimentLabel::Positive).count();
    let negative = scored.iter().filter(|s| s.label == SentimentLabel::Negative).count();
    info!(
        headlines = scored.len(),
        positive,
        negative,
        neutral = scored.len() - positive - negative,
        "headlines scored"
    );

    let out: Box<dyn Write> = match &args.out {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("creating {}", p.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    if args.daily {
        write_daily_csv(out, &daily_sentiment(&scored))?;
    } else {
        write_scored_csv(out, &scored)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_backtest_flags() {
        let cli = Cli::try_parse_from([
            "macross", "backtest", "--prices", "p.csv", "--short", "20", "--long", "100",
            "--start", "2020-01-02", "--format", "json",
        ])
        .unwrap();
        let Command::Backtest(args) = cli.command else {
            panic!("expected backtest");
        };
        assert_eq!(args.short, Some(20));
        assert_eq!(args.long, Some(100));
        assert_eq!(args.data.start, NaiveDate::from_ymd_opt(2020, 1, 2));
        assert_eq!(args.data.format, Format::Json);
    }

    #[test]
    fn test_windows_must_come_in_pairs() {
        assert!(Cli::try_parse_from(["macross", "backtest", "--short", "20"]).is_err());
        assert!(Cli::try_parse_from([
            "macross", "backtest", "--short", "5", "--long", "10", "--optimize"
        ])
        .is_err());
    }

    #[test]
    fn test_missing_price_file_is_reported() {
        let cli = Cli::try_parse_from(["macross", "optimize"]).unwrap();
        let Command::Optimize(args) = cli.command else {
            panic!("expected optimize");
        };
        let err = load_prices(&args.data, &BacktestConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no price file given"));
    }

    #[test]
    fn test_inverted_manual_pair_is_evaluated_as_given() {
        let config = BacktestConfig::default();
        let pair = select_pair(None, Some(50), Some(20), &config);
        assert_eq!(pair, WindowPair::new(50, 20));

        let prices = PriceSeries::from_closes(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            &(0..80).map(|i| 100.0 + i as f64).collect::<Vec<_>>(),
        );
        let run = BacktestEngine::new(MovingAverageCrossover).run(&prices, pair);
        assert_eq!(run.pair, pair);
        assert_eq!(run.series.len(), prices.len());
    }

    #[test]
    fn test_pair_falls_back_to_config() {
        let config = BacktestConfig::default();
        assert_eq!(select_pair(None, None, None, &config), config.strategy.window_pair());
        assert_eq!(select_pair(None, Some(5), Some(10), &config), WindowPair::new(5, 10));
    }
}

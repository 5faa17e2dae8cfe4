//! CLI argument definitions for bourse.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dashboard` | Price chart with MA50 plus fundamentals for one ticker |
//! | `fundamentals` | Market cap, trailing P/E and revenue multiple |
//! | `rank` | Rank a universe by market-cap variation |
//! | `universe` | List the tickers of a market |
//! | `range` | Show how a range tag resolves, without fetching |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--mock` | `false` | Use the offline synthetic source |
//! | `--today` | UTC date | Override "today" (YYYY-MM-DD) |
//! | `--concurrency` | `BOURSE_MAX_CONCURRENCY` | Ranker worker pool size |
//! | `--cache-ttl-secs` | `BOURSE_CACHE_TTL_SECS` | Session cache TTL, 0 disables it |
//! | `--timeout-ms` | `BOURSE_HTTP_TIMEOUT_MS` | Per-request HTTP timeout |
//! | `--verbose` | `false` | Debug logging on stderr |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "bourse",
    author,
    version,
    about = "Stock dashboard and market-cap variation ranking",
    long_about = "bourse charts a ticker over a chosen range with its 50-period moving \
average and fundamentals, and ranks CAC40 and S&P constituents by market-cap variation.\n\
\n\
Use 'bourse <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Serve deterministic synthetic data instead of calling Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Date used as "today" when resolving ranges (YYYY-MM-DD).
    #[arg(long, global = true)]
    pub today: Option<String>,

    /// Maximum number of tickers the ranker evaluates concurrently.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Session cache lifetime in seconds; 0 disables caching.
    #[arg(long, global = true)]
    pub cache_ttl_secs: Option<u64>,

    /// Per-request HTTP timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log debug events to stderr. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text tables for terminal display.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketArg {
    Cac40,
    Sp500,
    /// Union of every market.
    All,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chart one ticker over a range, with fundamentals.
    ///
    /// # Examples
    ///
    ///   bourse dashboard MC.PA --range 6m
    ///   bourse dashboard AAPL --range custom --start 2020-01-01 --end 2020-12-31 --log-scale
    Dashboard(DashboardArgs),

    /// Fetch fundamentals for one or more tickers.
    ///
    /// # Examples
    ///
    ///   bourse fundamentals AAPL MSFT --format table
    Fundamentals(FundamentalsArgs),

    /// Rank a universe by market-cap variation over a period.
    ///
    /// # Examples
    ///
    ///   bourse rank --period 1w --market cac40 --limit 10
    ///   bourse rank --universe-file watchlist.txt --progress
    Rank(RankArgs),

    /// List the tickers of a market.
    Universe(UniverseArgs),

    /// Resolve a range tag into start, end and interval.
    ///
    /// # Examples
    ///
    ///   bourse range 1w --today 2024-06-10
    Range(RangeArgs),
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Ticker, e.g. MC.PA or AAPL.
    pub symbol: String,

    /// Range tag: 1d, 1w, 1m, 6m, 1y, 5y, 25y or custom.
    #[arg(long, default_value = "1d")]
    pub range: String,

    /// Custom range start (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<String>,

    /// Custom range end (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<String>,

    /// Plot prices on a logarithmic y-axis.
    #[arg(long, default_value_t = false)]
    pub log_scale: bool,

    /// Require the ticker to belong to this market.
    #[arg(long, value_enum)]
    pub market: Option<MarketArg>,
}

#[derive(Debug, Args)]
pub struct FundamentalsArgs {
    /// One or more tickers.
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Variation period: 1d, 1w, 1m, 6m or 1y.
    #[arg(long, default_value = "1d")]
    pub period: String,

    /// Market whose constituents are ranked.
    #[arg(long, value_enum, default_value_t = MarketArg::All)]
    pub market: MarketArg,

    /// Rank the tickers listed in this file instead of a market.
    #[arg(long)]
    pub universe_file: Option<PathBuf>,

    /// Keep only the N largest moves.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Report progress on stderr.
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

#[derive(Debug, Args)]
pub struct UniverseArgs {
    #[arg(long, value_enum, default_value_t = MarketArg::All)]
    pub market: MarketArg,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Range tag: 1d, 1w, 1m, 6m, 1y, 5y, 25y or custom.
    pub tag: String,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dashboard(_) => "dashboard",
            Self::Fundamentals(_) => "fundamentals",
            Self::Rank(_) => "rank",
            Self::Universe(_) => "universe",
            Self::Range(_) => "range",
        }
    }
}

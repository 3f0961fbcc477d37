//! Command-line arguments.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use sqlmeter::config::{DEFAULT_PREFIX, DEFAULT_SLOW_QUERY_THRESHOLD_MS};
use sqlmeter::{
    CommonEngine, MetricsOptions, MiddlewareConfig, MySqlEngine, PostgresEngine, SqliteEngine,
};
use sqlmeter_core::Label;

use crate::workload::Workload;

/// SQL dialect used to render the workload query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    Postgres,
    Mysql,
    Sqlite,
    Common,
}

/// Output format for the collected metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Prometheus text exposition
    Text,
    /// JSON snapshot
    Json,
}

/// sqlmeter - run a synthetic query workload and print its metrics
#[derive(Parser, Debug)]
#[command(name = "sqlmeter")]
#[command(version, about = "Run a synthetic query workload through sqlmeter and print its metrics")]
pub struct Args {
    /// Number of queries to run concurrently
    #[arg(long, default_value_t = 11)]
    pub queries: usize,

    /// Rows returned by each query
    #[arg(long, default_value_t = 1338)]
    pub rows: usize,

    /// SQL text to run; defaults to a SELECT on `users` rendered for --engine
    #[arg(long)]
    pub sql: Option<String>,

    /// SQL dialect
    #[arg(long, value_enum, default_value_t = EngineKind::Postgres)]
    pub engine: EngineKind,

    /// Slow query threshold in milliseconds
    #[arg(long, default_value_t = DEFAULT_SLOW_QUERY_THRESHOLD_MS)]
    pub slow_ms: u64,

    /// Delay before each query's first row, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Random extra delay of up to this many milliseconds
    #[arg(long, default_value_t = 0)]
    pub jitter_ms: u64,

    /// Make every Nth query fail halfway through its rows (0 = never)
    #[arg(long, default_value_t = 0)]
    pub fail_every: usize,

    /// Metric name prefix
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Default label added to every series, as name=value (repeatable)
    #[arg(long = "label", value_parser = parse_label)]
    pub labels: Vec<Label>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Everything `run` needs, derived from [`Args`].
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub middleware: MiddlewareConfig,
    pub metrics: MetricsOptions,
    pub workload: Workload,
    pub format: OutputFormat,
}

impl Args {
    /// Convert arguments into configuration.
    pub fn into_config(self) -> CliConfig {
        let middleware = MiddlewareConfig::new()
            .with_slow_query_threshold(Duration::from_millis(self.slow_ms));
        let middleware = match self.engine {
            EngineKind::Postgres => middleware.with_engine(PostgresEngine),
            EngineKind::Mysql => middleware.with_engine(MySqlEngine),
            EngineKind::Sqlite => middleware.with_engine(SqliteEngine),
            EngineKind::Common => middleware.with_engine(CommonEngine),
        };

        let metrics = self.labels.into_iter().fold(
            MetricsOptions::new().with_prefix(self.prefix),
            |options, label| options.with_default_label(label.name(), label.value()),
        );

        let workload = Workload {
            queries: self.queries,
            rows: self.rows,
            sql: self.sql,
            delay: Duration::from_millis(self.delay_ms),
            jitter: Duration::from_millis(self.jitter_ms),
            fail_every: self.fail_every,
        };

        CliConfig {
            middleware,
            metrics,
            workload,
            format: self.format,
        }
    }
}

fn parse_label(s: &str) -> Result<Label, String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok(Label::new(name, value)),
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

//! sqlmeter command-line driver.
//!
//! Runs a synthetic query workload through the query middleware and prints
//! the resulting metrics, either as Prometheus text or as a JSON snapshot.

mod args;
mod workload;

use args::{Args, OutputFormat};
use clap::Parser;
use sqlmeter::{QueryMetrics, QueryMiddleware};
use sqlmeter_core::new_shared_registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sqlmeter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config();
    tracing::info!(
        engine = config.middleware.engine.name(),
        queries = config.workload.queries,
        rows = config.workload.rows,
        slow_ms = config.middleware.slow_query_threshold.as_millis() as u64,
        prefix = %config.metrics.prefix,
        "starting workload"
    );

    let registry = new_shared_registry();
    let metrics = QueryMetrics::create(&registry, &config.metrics)?;
    let middleware = QueryMiddleware::new(config.middleware, metrics);

    let outcome = config.workload.run(&middleware).await?;
    tracing::info!(
        rows = outcome.rows,
        failed = outcome.failed,
        "workload finished"
    );

    match config.format {
        OutputFormat::Text => print!("{}", registry.to_prometheus()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&registry.snapshot())?),
    }
    Ok(())
}

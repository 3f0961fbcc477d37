//! End-to-end behaviour checked against the exposition text.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use sqlmeter::{MetricsOptions, MiddlewareConfig, QueryMetrics, QueryMiddleware, Select};
use sqlmeter::{MySqlEngine, PostgresEngine};
use sqlmeter_core::metrics::{LabelSet, SeriesValue};
use sqlmeter_core::{new_shared_registry, ManualClock, SharedRegistry};

const ROWS_PER_QUERY: usize = 1338;

#[derive(Debug, Clone, PartialEq)]
struct DbError(String);

fn setup(config: MiddlewareConfig) -> (SharedRegistry, QueryMiddleware, ManualClock) {
    let registry = new_shared_registry();
    let options = MetricsOptions::new().with_default_label("database", "test");
    let metrics = QueryMetrics::create(&registry, &options).unwrap();
    let clock = ManualClock::new();
    let middleware = QueryMiddleware::new(config, metrics).with_clock(clock.clone());
    (registry, middleware, clock)
}

fn users_select() -> LabelSet {
    LabelSet::new()
        .with("database", "test")
        .with("type", "SELECT")
        .with("table", "users")
}

/// Eleven selects on `users`, the i-th taking i seconds to produce its first
/// row, each returning 1338 rows, against a one second threshold.
async fn run_reference_workload(middleware: &QueryMiddleware, clock: &ManualClock) {
    for delay in 0..=10u64 {
        let query = Select::new()
            .columns(["id", "username"])
            .from("users")
            .where_eq("id");
        let clock = clock.clone();

        let rows = middleware
            .query(query, move |_| async move {
                clock.advance(Duration::from_secs(delay));
                let rows: Vec<Result<usize, DbError>> = (0..ROWS_PER_QUERY).map(Ok).collect();
                Ok::<_, DbError>(stream::iter(rows))
            })
            .unwrap()
            .await
            .unwrap();

        assert_eq!(rows.count().await, ROWS_PER_QUERY);
    }
}

#[tokio::test]
async fn test_reference_workload_exposition() {
    let (registry, middleware, clock) =
        setup(MiddlewareConfig::new().with_engine(PostgresEngine));
    run_reference_workload(&middleware, &clock).await;

    let text = registry.to_prometheus();
    let labels = r#"database="test",type="SELECT",table="users""#;
    for expected in [
        format!("sqlmeter_queries_inflight{{{}}} 0", labels),
        format!("sqlmeter_rows_total{{{}}} 14718", labels),
        format!("sqlmeter_queries_total_total{{{}}} 11", labels),
        format!("sqlmeter_queries_slow_total{{{}}} 9", labels),
        format!("sqlmeter_queries_completed_total{{{}}} 11", labels),
        format!("sqlmeter_queries_errored_total{{{}}} 0", labels),
        format!(
            "sqlmeter_queries_response_times{{quantile=\"0.1\",{}}} 1",
            labels
        ),
        format!(
            "sqlmeter_queries_response_times{{quantile=\"0.5\",{}}} 5",
            labels
        ),
        format!(
            "sqlmeter_queries_response_times{{quantile=\"0.9\",{}}} 9",
            labels
        ),
        format!(
            "sqlmeter_queries_response_times{{quantile=\"0.99\",{}}} 9.9",
            labels
        ),
        format!("sqlmeter_queries_response_times_sum{{{}}} 55", labels),
        format!("sqlmeter_queries_response_times_count{{{}}} 11", labels),
        format!("sqlmeter_queries_completed_times_count{{{}}} 11", labels),
    ] {
        assert!(
            text.contains(&expected),
            "missing line `{}` in:\n{}",
            expected,
            text
        );
    }
}

#[tokio::test]
async fn test_reference_workload_is_dialect_independent() {
    let (registry, middleware, clock) = setup(MiddlewareConfig::new().with_engine(MySqlEngine));
    run_reference_workload(&middleware, &clock).await;

    let snapshot = registry.snapshot();
    let total = snapshot
        .iter()
        .find(|m| m.name == "sqlmeter_queries_total")
        .and_then(|m| m.find(&users_select()))
        .unwrap();
    assert_eq!(total.value, SeriesValue::Counter { value: 11 });
}

#[tokio::test]
async fn test_completed_plus_errored_equals_total() {
    let (_registry, middleware, _clock) = setup(MiddlewareConfig::new());

    for i in 0..20usize {
        let items: Vec<Result<usize, DbError>> = if i % 3 == 0 {
            vec![Ok(1), Err(DbError(format!("failure {}", i)))]
        } else {
            vec![Ok(1), Ok(2)]
        };
        let stream = middleware
            .query("SELECT * FROM users", move |_| async move {
                Ok::<_, DbError>(stream::iter(items))
            })
            .unwrap()
            .await
            .unwrap();
        stream.collect::<Vec<_>>().await;
    }

    let m = middleware.metrics();
    let get = |family: &sqlmeter_core::Family<sqlmeter_core::Counter>| {
        family.get(&users_select()).map(|c| c.get()).unwrap_or(0)
    };
    assert_eq!(get(m.queries_total()), 20);
    assert_eq!(get(m.queries_completed()) + get(m.queries_errored()), 20);
    assert_eq!(get(m.queries_errored()), 7);
    assert_eq!(m.inflight().get(&users_select()).unwrap().get(), 0);
}

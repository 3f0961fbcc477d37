//! sqlmeter - Prometheus-style metrics for SQL queries.
//!
//! [`QueryMiddleware`] sits in front of whatever executes queries. For every
//! query it derives a `type` and `table` label from the rendered SQL and keeps
//! eight instruments up to date while the result rows stream back:
//!
//! | metric | kind |
//! |---|---|
//! | `<prefix>_queries_inflight` | gauge, queries waiting for their first row |
//! | `<prefix>_rows` | counter |
//! | `<prefix>_queries_total` | counter |
//! | `<prefix>_queries_slow` | counter, first row later than the threshold |
//! | `<prefix>_queries_completed` | counter |
//! | `<prefix>_queries_errored` | counter |
//! | `<prefix>_queries_response_times` | summary, seconds to first row |
//! | `<prefix>_queries_completed_times` | summary, seconds to completion |
//!
//! # Usage
//!
//! ```rust
//! use futures::stream::{self, StreamExt};
//! use sqlmeter::{MetricsOptions, MiddlewareConfig, QueryMetrics, QueryMiddleware, RawSql};
//! use sqlmeter_core::new_shared_registry;
//!
//! # futures::executor::block_on(async {
//! let registry = new_shared_registry();
//! let options = MetricsOptions::new().with_default_label("database", "app");
//! let metrics = QueryMetrics::create(&registry, &options).unwrap();
//! let middleware = QueryMiddleware::new(MiddlewareConfig::new(), metrics);
//!
//! let rows = middleware
//!     .query(RawSql::new("SELECT id FROM users"), |_query| async {
//!         Ok::<_, std::io::Error>(stream::iter(vec![Ok(1), Ok(2)]))
//!     })
//!     .unwrap()
//!     .await
//!     .unwrap();
//! assert_eq!(rows.count().await, 2);
//!
//! let text = registry.to_prometheus();
//! assert!(text.contains(r#"sqlmeter_rows_total{database="app",type="SELECT",table="users"} 2"#));
//! # });
//! ```
//!
//! Middlewares compose by nesting: the `next` closure given to one
//! middleware can itself call another middleware's `query`.

pub mod config;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod middleware;
pub mod probe;
pub mod query;
pub mod stream;

pub use config::{MetricsOptions, MiddlewareConfig};
pub use error::{Error, Result};
pub use labels::QueryLabels;
pub use metrics::QueryMetrics;
pub use middleware::{QueryFuture, QueryMiddleware};
pub use probe::{Phase, QueryProbe, StreamEvent};
pub use query::{CommonEngine, Engine, MySqlEngine, PostgresEngine, Query, RawSql, Select, SqliteEngine};
pub use stream::InstrumentedStream;

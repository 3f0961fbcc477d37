//! Synthetic query workload.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::Rng;
use sqlmeter::{Engine, Query, QueryMiddleware, RawSql, Select};
use thiserror::Error;

/// Failure injected into the synthetic row stream.
#[derive(Debug, Clone, Error)]
pub enum WorkloadError {
    #[error("query {query} failed after {rows} rows")]
    Injected { query: usize, rows: usize },
}

/// Shape of the synthetic workload.
#[derive(Debug, Clone)]
pub struct Workload {
    pub queries: usize,
    pub rows: usize,
    /// Raw SQL to run; `None` renders a builder query for the configured engine.
    pub sql: Option<String>,
    pub delay: Duration,
    pub jitter: Duration,
    /// Every Nth query fails; 0 disables failures.
    pub fail_every: usize,
}

/// What the workload observed from the consumer side.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub rows: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
enum WorkloadQuery {
    Raw(RawSql),
    Builder(Select),
}

impl Query for WorkloadQuery {
    fn sql(&self, engine: &dyn Engine) -> String {
        match self {
            WorkloadQuery::Raw(raw) => raw.sql(engine),
            WorkloadQuery::Builder(select) => select.sql(engine),
        }
    }
}

impl Workload {
    fn query(&self) -> WorkloadQuery {
        match &self.sql {
            Some(sql) => WorkloadQuery::Raw(RawSql::new(sql.clone())),
            None => WorkloadQuery::Builder(
                Select::new()
                    .columns(["id", "username"])
                    .from("users")
                    .where_eq("id"),
            ),
        }
    }

    fn fails(&self, index: usize) -> bool {
        self.fail_every > 0 && (index + 1) % self.fail_every == 0
    }

    fn delay_for(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    /// Run every query concurrently through `middleware` and drain the rows.
    pub async fn run(&self, middleware: &QueryMiddleware) -> Result<Outcome, Box<dyn std::error::Error>> {
        let mut tasks = Vec::with_capacity(self.queries);

        for index in 0..self.queries {
            let rows = self.rows;
            let delay = self.delay_for();
            let fails = self.fails(index);

            let future = middleware.query(self.query(), move |_query| async move {
                tokio::time::sleep(delay).await;
                let served = if fails { rows / 2 } else { rows };
                let items = (0..served)
                    .map(Ok)
                    .chain(fails.then_some(Err(WorkloadError::Injected {
                        query: index,
                        rows: served,
                    })));
                Ok::<_, WorkloadError>(stream::iter(items))
            })?;

            tasks.push(tokio::spawn(async move {
                let mut outcome = Outcome::default();
                let mut rows = future.await?;
                while let Some(item) = rows.next().await {
                    match item {
                        Ok(_) => outcome.rows += 1,
                        Err(e) => {
                            tracing::debug!(error = %e, "query stream failed");
                            outcome.failed += 1;
                        }
                    }
                }
                Ok::<_, WorkloadError>(outcome)
            }));
        }

        let mut total = Outcome::default();
        for task in futures::future::join_all(tasks).await {
            let outcome = task??;
            total.rows += outcome.rows;
            total.failed += outcome.failed;
        }
        Ok(total)
    }
}

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::{
    aggregate::AggregateTable,
    api::fronius::{self, FetchError},
    date_range::DateRange,
    prelude::*,
};

#[must_use]
pub struct Harvest {
    pub table: AggregateTable,
    pub n_succeeded: usize,
    pub n_failed: usize,
}

/// Fetch all the ranges concurrently and merge the readings in the order the fetches complete.
///
/// A failed fetch is logged and leaves its dates out of the table; it never affects the others.
#[instrument(skip_all)]
pub async fn harvest(
    client: Arc<fronius::Client>,
    ranges: impl IntoIterator<Item = DateRange>,
) -> Harvest {
    let mut tasks = JoinSet::new();
    for range in ranges {
        let client = Arc::clone(&client);
        tasks.spawn(async move { (range, client.get_daily_production(range).await) });
    }
    info!(n_requests = tasks.len(), "spawned");

    let mut harvest = Harvest { table: AggregateTable::default(), n_succeeded: 0, n_failed: 0 };
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok((range, Ok(readings))) => {
                let n_readings = readings.len();
                let n_inserted = harvest.table.merge(readings);
                info!(%range, n_readings, n_inserted, "merged");
                harvest.n_succeeded += 1;
            }
            Ok((range, Err(error))) => {
                report_failure(range, error);
                harvest.n_failed += 1;
            }
            Err(error) => {
                error!("the fetch task has crashed: {error:#}");
                harvest.n_failed += 1;
            }
        }
    }
    harvest
}

fn report_failure(range: DateRange, error: FetchError) {
    let payload = error.payload();
    error!(%range, "{:#}", Error::from(error));
    if let Some(payload) = payload {
        error!(%range, "response payload:\n{payload}");
    }
}

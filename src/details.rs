//! Detail enrichment: fetches the full document of every harvested record.

use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use serde_json::Value;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{info_time, request::DetailFetcher, Error, Result};

/// Reads the ids out of a harvest output file.
pub async fn read_ids(path: impl AsRef<Path>, id_field: &str) -> Result<Vec<u64>> {
    let raw = tokio::fs::read(path).await?;
    let values: Vec<Value> = serde_json::from_slice(&raw)?;
    values
        .iter()
        .map(|value| {
            value
                .get(id_field)
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::MissingId {
                    field: id_field.to_string(),
                })
        })
        .collect()
}

/// Fetches the documents for `ids` with at most `workers` requests in flight.
/// The result keeps the order of `ids`. The first failure cancels the rest.
pub async fn fetch_details<F>(fetcher: Arc<F>, ids: &[u64], workers: usize) -> Result<Vec<Value>>
where
    F: DetailFetcher + 'static,
{
    let start_time = Local::now();
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut task_set = JoinSet::new();

    for (index, &id) in ids.iter().enumerate() {
        task_set.spawn({
            let fetcher = fetcher.clone();
            let permits = permits.clone();
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return Err(Error::Aborted);
                };
                fetcher.fetch(id).await.map(|doc| (index, doc))
            }
        });
    }

    let mut docs: Vec<Option<Value>> = vec![None; ids.len()];
    while let Some(task) = task_set.join_next().await {
        // Returning drops the set, which aborts the tasks still running.
        let (index, doc) = task??;
        docs[index] = Some(doc);
    }

    info_time!(start_time, "Fetched {} detail documents", ids.len());
    Ok(docs.into_iter().flatten().collect())
}

pub async fn write_details(path: impl AsRef<Path>, docs: &[Value]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(docs)?).await?;
    Ok(())
}

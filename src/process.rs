use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
    sync::{mpsc, watch, Semaphore},
    task::JoinSet,
};

use crate::config::Config;
use crate::coverage::{expand, Completeness, Plan};
use crate::dedup::{dedup, LanguageOverlap};
use crate::filter::QueryFilter;
use crate::record::{Record, Tags};
use crate::request::SearchExecutor;
use crate::{info_time, warn_time, Error, Result};

/// One independent combination of dimension values.
#[derive(Debug, Clone)]
pub struct Cell {
    pub label: String,
    pub filter: QueryFilter,
    pub plan: Plan,
    /// Attached to every record the cell returns.
    pub tags: Tags,
}

/// Special-flag cells first, then every category × language pair.
/// Special cells are trusted to be small and never partitioned.
pub fn plan_cells(config: &Config) -> Vec<Cell> {
    let specials = config.specials.iter().map(|special| Cell {
        label: format!("special:{}", special.name),
        filter: QueryFilter::special(&special.code),
        plan: Plan::trusted(config.cap),
        tags: Tags::special(&special.name),
    });

    let categories = config.categories.iter().flat_map(|category| {
        config.languages.iter().map(move |language| Cell {
            label: format!("category:{}/{}", category.name, language.code),
            filter: QueryFilter::category(category.id, language.id),
            plan: config.plan(config.allow_partial.allows(category.id)),
            tags: Tags::language(&language.code),
        })
    });

    specials.chain(categories).collect()
}

/// Manifest entry for one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSummary {
    pub label: String,
    pub special_code: Option<String>,
    pub category_id: Option<u32>,
    pub language_id: Option<u32>,
    pub completeness: Completeness,
    pub records: usize,
    pub queries: usize,
}

/// What a finished cell sends to the collector.
#[derive(Debug)]
pub struct CellReport {
    index: usize,
    summary: CellSummary,
    records: Vec<Record>,
}

/// The merged result of a whole run.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub records: Vec<Record>,
    pub cells: Vec<CellSummary>,
    pub overlap: LanguageOverlap,
}

#[derive(Serialize)]
struct Manifest<'a> {
    total: usize,
    complete: bool,
    overlap: &'a LanguageOverlap,
    cells: &'a [CellSummary],
}

impl Harvest {
    /// True when no cell settled for a best-effort result.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|c| c.completeness.is_guaranteed())
    }

    pub fn best_effort_cells(&self) -> impl Iterator<Item = &CellSummary> {
        self.cells
            .iter()
            .filter(|c| !c.completeness.is_guaranteed())
    }

    /// Writes the records as a JSON array to `path` and the per-cell
    /// manifest next to it. Returns the manifest path.
    pub async fn write_json(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let local_now = Local::now();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(path).await?;
        file.write_all(&serde_json::to_vec_pretty(&self.records)?)
            .await?;
        file.flush().await?;

        let manifest_path = manifest_path(path);
        let manifest = Manifest {
            total: self.records.len(),
            complete: self.is_complete(),
            overlap: &self.overlap,
            cells: &self.cells,
        };
        let mut file = File::create(&manifest_path).await?;
        file.write_all(&serde_json::to_vec_pretty(&manifest)?)
            .await?;
        file.flush().await?;

        info_time!(
            local_now,
            "Wrote {} records to {} and the cell manifest to {}",
            self.records.len(),
            path.display(),
            manifest_path.display()
        );
        Ok(manifest_path)
    }
}

/// `data/phs.json` -> `data/phs.json.cells.json`
pub fn manifest_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".cells.json");
    PathBuf::from(name)
}

/// Resolves every configured cell and merges the results.
///
/// With one worker the cells run strictly in order and the first failure ends
/// the run. With more, failing cells don't stop their siblings, but the run
/// still fails once they are done. Setting `stop` to `true` ends the run
/// before the next cell starts.
pub async fn harvest<E>(
    executor: Arc<E>,
    config: &Config,
    stop: watch::Receiver<bool>,
) -> Result<Harvest>
where
    E: SearchExecutor + 'static,
{
    config.validate()?;
    let start_time = Local::now();
    let cells = plan_cells(config);
    info_time!("Started harvesting {} cells", cells.len());

    let (report_tx, report_rx) = mpsc::channel(64);
    let collect_handle = tokio::spawn(async move { collect_reports(report_rx).await });

    if config.workers <= 1 {
        process_sequential(executor, cells, report_tx, stop).await?;
    } else {
        process_parallel(executor, cells, config.workers, report_tx, stop).await?;
    }

    let harvest = collect_handle.await?;
    info_time!(
        start_time,
        "Finished ALL cells: {} unique records",
        harvest.records.len()
    );
    if harvest.overlap.has_multi_language() {
        info_time!(
            "There are records with multiple languages! {} unique, {} summed per language",
            harvest.overlap.unique,
            harvest.overlap.per_language_sum
        );
    } else {
        info_time!("No multi-language records");
    }
    for cell in harvest.best_effort_cells() {
        warn_time!("{} is best effort: {:?}", cell.label, cell.completeness);
    }
    Ok(harvest)
}

async fn process_sequential<E: SearchExecutor>(
    executor: Arc<E>,
    cells: Vec<Cell>,
    report_tx: mpsc::Sender<CellReport>,
    stop: watch::Receiver<bool>,
) -> Result<()> {
    for (index, cell) in cells.into_iter().enumerate() {
        if *stop.borrow() {
            info_time!("received STOP signal");
            return Err(Error::Aborted);
        }
        let report = run_cell(&*executor, index, cell).await?;
        report_tx.send(report).await?;
    }
    Ok(())
}

async fn process_parallel<E: SearchExecutor + 'static>(
    executor: Arc<E>,
    cells: Vec<Cell>,
    workers: usize,
    report_tx: mpsc::Sender<CellReport>,
    stop: watch::Receiver<bool>,
) -> Result<()> {
    let permits = Arc::new(Semaphore::new(workers));
    let mut task_set = JoinSet::new();

    for (index, cell) in cells.into_iter().enumerate() {
        task_set.spawn({
            // Executor and channel ends are behind Arcs, cloning is cheap.
            let executor = executor.clone();
            let permits = permits.clone();
            let report_tx = report_tx.clone();
            let stop = stop.clone();
            async move {
                let label = cell.label.clone();
                let Ok(_permit) = permits.acquire_owned().await else {
                    return Err((label, Error::Aborted));
                };
                if *stop.borrow() {
                    return Err((label, Error::Aborted));
                }
                let report = run_cell(&*executor, index, cell)
                    .await
                    .map_err(|e| (label.clone(), e))?;
                report_tx
                    .send(report)
                    .await
                    .map_err(|e| (label, Error::from(e)))
            }
        });
    }
    drop(report_tx);

    let mut aborted = false;
    let mut failures = Vec::new();
    while let Some(task) = task_set.join_next().await {
        match task? {
            Ok(()) => {}
            Err((_, Error::Aborted)) => aborted = true,
            Err((label, e)) => {
                warn_time!("{label} failed: {e}");
                failures.push(format!("{label}: {e}"));
            }
        }
    }

    if !failures.is_empty() {
        return Err(Error::CellsFailed(failures));
    }
    if aborted {
        info_time!("received STOP signal");
        return Err(Error::Aborted);
    }
    Ok(())
}

async fn run_cell<E: SearchExecutor>(executor: &E, index: usize, cell: Cell) -> Result<CellReport> {
    let start_time = Local::now();
    let expansion = expand(executor, &cell.filter, &cell.plan).await?;
    let records: Vec<Record> = expansion
        .records
        .into_iter()
        .map(|record| record.tagged(&cell.tags))
        .collect();
    info_time!(
        start_time,
        "Processed {}: {} records",
        cell.label,
        records.len()
    );

    Ok(CellReport {
        index,
        summary: CellSummary {
            label: cell.label,
            special_code: cell.filter.special_code,
            category_id: cell.filter.category_id,
            language_id: cell.filter.language_id,
            completeness: expansion.completeness,
            records: records.len(),
            queries: expansion.queries,
        },
        records,
    })
}

/// Single writer for the global result. Reports are merged in cell order so
/// the output doesn't depend on which worker finished first.
async fn collect_reports(mut report_rx: mpsc::Receiver<CellReport>) -> Harvest {
    let mut reports = Vec::new();
    while let Some(report) = report_rx.recv().await {
        reports.push(report);
    }
    reports.sort_unstable_by_key(|r| r.index);

    let mut cells = Vec::with_capacity(reports.len());
    let mut found = Vec::new();
    for report in reports {
        found.extend(report.records);
        cells.push(report.summary);
    }
    let records = dedup(found);
    let overlap = LanguageOverlap::from_records(&records);
    Harvest {
        records,
        cells,
        overlap,
    }
}

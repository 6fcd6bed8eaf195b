//! Ingestion pipeline orchestration.
//!
//! Coordinates one import batch: source file → normalization → organization
//! upsert → index sync → bearer upserts → index sync. The whole batch runs in
//! one transaction; each record and each bearer runs in its own savepoint so
//! a row-level failure is rolled back alone and the batch carries on.
//!
//! Only storage errors that are not row-level constraint violations abort the
//! batch. In that case nothing from the batch is committed.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info, warn};

use crate::config::{Config, DuplicatePolicy};
use crate::error::{classify_write_error, RecordError, RegistryError};
use crate::models::{NormalizedRecord, OfficeBearer, Organization};
use crate::normalize::normalize_record;
use crate::progress::{ImportProgressEvent, ImportProgressReporter, ProgressMode};
use crate::source_fs::{self, SourceItem};
use crate::store::{self, RegistryStore, UpsertOutcome};

/// One record that could not be ingested.
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub file: String,
    pub reason: String,
}

/// Counters for one batch.
///
/// `skipped` covers records whose natural key was already stored as well as
/// records refused by validation; `rejected` is the validation share of it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub failed: u64,
    pub bearers_inserted: u64,
    pub bearers_skipped: u64,
    pub bearers_rejected: u64,
    pub bearers_failed: u64,
    pub failures: Vec<RecordFailure>,
}

impl ImportReport {
    /// Source files that did not produce a new or updated organization.
    pub fn files_skipped(&self) -> u64 {
        self.skipped + self.failed
    }

    fn record_failure(&mut self, file: &str, err: RecordError) {
        warn!(file = %file, error = %err, "record failed");
        self.failed += 1;
        self.failures.push(RecordFailure {
            file: file.to_string(),
            reason: err.to_string(),
        });
    }
}

/// Import a batch of source items into the store.
///
/// Returns the batch counters once the transaction has committed.
pub async fn import_batch<I>(
    store: &RegistryStore,
    items: I,
    policy: DuplicatePolicy,
    progress: &dyn ImportProgressReporter,
) -> Result<ImportReport, RegistryError>
where
    I: IntoIterator<Item = SourceItem>,
    I::IntoIter: ExactSizeIterator,
{
    let items = items.into_iter();
    let total = items.len() as u64;
    let mut report = ImportReport::default();
    let mut tx = store.begin().await?;

    for (n, item) in items.enumerate() {
        let file_id = item.file_id;

        match item.record {
            Err(err) => report.record_failure(&file_id, err),
            Ok(record) => match normalize_record(&record) {
                Err(rejection) => {
                    debug!(file = %file_id, reason = %rejection, "record rejected");
                    report.skipped += 1;
                    report.rejected += 1;
                }
                Ok(normalized) => {
                    import_record(&mut tx, &file_id, &normalized, policy, &mut report).await?
                }
            },
        }

        let n = n as u64 + 1;
        if n % 100 == 0 || n == total {
            progress.report(ImportProgressEvent::Importing { n, total });
        }
    }

    tx.commit().await.map_err(RegistryError::Storage)?;

    info!(
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        bearers_inserted = report.bearers_inserted,
        "import batch committed"
    );

    Ok(report)
}

/// Write one normalized record inside its own savepoint.
async fn import_record(
    conn: &mut SqliteConnection,
    file_id: &str,
    record: &NormalizedRecord,
    policy: DuplicatePolicy,
    report: &mut ImportReport,
) -> Result<(), RegistryError> {
    report.bearers_rejected += record.rejected_bearers as u64;

    let mut savepoint = conn.begin().await.map_err(RegistryError::Storage)?;

    let outcome =
        match write_organization(&mut savepoint, &record.organization, file_id, policy).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let failure = classify_write_error(err)?;
                savepoint.rollback().await.map_err(RegistryError::Storage)?;
                report.record_failure(file_id, failure);
                return Ok(());
            }
        };
    let organization_id = outcome.id();

    for bearer in &record.bearers {
        let mut bearer_savepoint = savepoint.begin().await.map_err(RegistryError::Storage)?;
        match write_bearer(&mut bearer_savepoint, organization_id, bearer).await {
            Ok(bearer_outcome) => {
                bearer_savepoint
                    .commit()
                    .await
                    .map_err(RegistryError::Storage)?;
                match bearer_outcome {
                    UpsertOutcome::Inserted(_) => report.bearers_inserted += 1,
                    _ => report.bearers_skipped += 1,
                }
            }
            Err(err) => {
                let failure = classify_write_error(err)?;
                bearer_savepoint
                    .rollback()
                    .await
                    .map_err(RegistryError::Storage)?;
                warn!(file = %file_id, bearer = %bearer.name, error = %failure, "office bearer failed");
                report.bearers_failed += 1;
            }
        }
    }

    savepoint.commit().await.map_err(RegistryError::Storage)?;

    match outcome {
        UpsertOutcome::Inserted(_) => report.inserted += 1,
        UpsertOutcome::Updated(_) => report.updated += 1,
        UpsertOutcome::AlreadyExists(_) => report.skipped += 1,
    }
    Ok(())
}

async fn write_organization(
    conn: &mut SqliteConnection,
    org: &Organization,
    file_id: &str,
    policy: DuplicatePolicy,
) -> Result<UpsertOutcome, sqlx::Error> {
    let outcome = store::upsert_organization(conn, org, Some(file_id), policy).await?;
    debug!(file = %file_id, outcome = ?outcome, "organization written");

    // An existing row keeps its stored fields; re-sync its index row from them.
    let entry = match outcome {
        UpsertOutcome::AlreadyExists(id) => store::stored_organization_entry(conn, id).await?,
        _ => Some(org.index_entry()),
    };
    if let Some(entry) = entry {
        store::sync_organization_index(conn, outcome.id(), &entry).await?;
    }
    Ok(outcome)
}

async fn write_bearer(
    conn: &mut SqliteConnection,
    organization_id: i64,
    bearer: &OfficeBearer,
) -> Result<UpsertOutcome, sqlx::Error> {
    let outcome = store::upsert_office_bearer(conn, organization_id, bearer).await?;
    debug!(organization_id, outcome = ?outcome, "office bearer written");

    let entry = match outcome {
        UpsertOutcome::AlreadyExists(id) => store::stored_bearer_entry(conn, id).await?,
        _ => Some(bearer.index_entry()),
    };
    if let Some(entry) = entry {
        store::sync_bearer_index(conn, outcome.id(), &entry).await?;
    }
    Ok(outcome)
}

/// Counters for a normalize-only pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DryRunReport {
    pub files: u64,
    pub valid: u64,
    pub rejected: u64,
    pub failed: u64,
    pub bearers: u64,
    pub bearers_rejected: u64,
}

/// Parse and normalize without touching the store.
pub fn preview_batch<I>(items: I) -> DryRunReport
where
    I: IntoIterator<Item = SourceItem>,
{
    let mut report = DryRunReport::default();
    for item in items {
        report.files += 1;
        match item.record.map(|record| normalize_record(&record)) {
            Err(err) => {
                warn!(file = %item.file_id, error = %err, "record failed");
                report.failed += 1;
            }
            Ok(Err(_)) => report.rejected += 1,
            Ok(Ok(normalized)) => {
                report.valid += 1;
                report.bearers += normalized.bearers.len() as u64;
                report.bearers_rejected += normalized.rejected_bearers as u64;
            }
        }
    }
    report
}

/// Options of the `import` command.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Overwrite stored organizations that changed in the source.
    pub force: bool,
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub progress: ProgressMode,
}

pub async fn run_import(config: &Config, dir: &Path, options: &ImportOptions) -> Result<()> {
    let policy = if options.force {
        DuplicatePolicy::Overwrite
    } else {
        config.import.on_duplicate
    };
    let reporter = options.progress.reporter();

    reporter.report(ImportProgressEvent::Scanning {
        root: dir.display().to_string(),
    });
    let mut files = source_fs::discover(dir, &config.import)?;
    if let Some(limit) = options.limit {
        files.truncate(limit);
    }
    let items = files.iter().map(|file| source_fs::load(dir, file));

    if options.dry_run {
        let report = preview_batch(items);
        println!("import {} (dry-run)", dir.display());
        println!("  files found: {}", report.files);
        println!("  records valid: {}", report.valid);
        println!("  records rejected: {}", report.rejected);
        println!("  files unreadable: {}", report.failed);
        println!("  bearers found: {}", report.bearers);
        println!("  bearers rejected: {}", report.bearers_rejected);
        return Ok(());
    }

    let store = RegistryStore::open(config)
        .await
        .context("cannot import; run `oreg init` first")?;
    let result = import_batch(&store, items, policy, reporter.as_ref()).await;
    store.close().await;
    let report = result.context("import aborted; no records were committed")?;

    println!("import {}", dir.display());
    println!("  organizations inserted: {}", report.inserted);
    if policy == DuplicatePolicy::Overwrite {
        println!("  organizations updated: {}", report.updated);
    }
    println!("  organizations skipped: {}", report.skipped);
    println!("  bearers inserted: {}", report.bearers_inserted);
    println!("  bearers skipped: {}", report.bearers_skipped);
    println!("  files skipped: {}", report.files_skipped());
    for failure in &report.failures {
        println!("  failed: {} ({})", failure.file, failure.reason);
    }
    println!("ok");

    Ok(())
}

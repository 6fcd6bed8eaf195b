//! Registry statistics and index health.
//!
//! `oreg stats` prints entity counts and a per-group breakdown computed with
//! the same rules the search filters use, so the numbers line up with what a
//! filtered search returns. `oreg verify` checks that the text-search index
//! mirrors the entity tables one-to-one.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::filter::unclassified;
use crate::store::{IndexReport, RegistryStore};
use crate::vocab::{Category, Nature, Status, Vocabulary};

/// Counts of one vocabulary group: `(label, organizations)` per value, then
/// the unclassified bucket.
pub async fn group_breakdown<V: Vocabulary>(
    store: &RegistryStore,
) -> Result<Vec<(&'static str, i64)>> {
    let mut rows = Vec::with_capacity(V::ALL.len() + 1);
    for value in V::ALL {
        rows.push((value.label(), store.count_organizations(&value.rule()).await?));
    }
    rows.push((
        "(unclassified)",
        store.count_organizations(&unclassified::<V>()).await?,
    ));
    Ok(rows)
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let store = RegistryStore::open(config).await?;
    let result = print_stats(config, &store).await;
    store.close().await;
    result
}

async fn print_stats(config: &Config, store: &RegistryStore) -> Result<()> {
    let counts = store.counts().await?;
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Organization Registry: Database Stats");
    println!("=====================================");
    println!();
    println!("  Database:       {}", config.db.path.display());
    println!("  Size:           {}", format_bytes(db_size));
    println!();
    println!("  Organizations:  {}", counts.organizations);
    println!("  Office bearers: {}", counts.office_bearers);
    println!(
        "  Index rows:     {} organizations, {} bearers",
        counts.organization_index, counts.bearer_index
    );

    print_group(Category::GROUP, &group_breakdown::<Category>(store).await?);
    print_group(Status::GROUP, &group_breakdown::<Status>(store).await?);
    print_group(Nature::GROUP, &group_breakdown::<Nature>(store).await?);

    println!();
    Ok(())
}

fn print_group(group: &str, rows: &[(&str, i64)]) {
    println!();
    println!("  By {}:", group);
    for (label, count) in rows {
        println!("    {:<20} {:>8}", label, count);
    }
}

pub async fn run_verify(config: &Config) -> Result<()> {
    let store = RegistryStore::open(config).await?;
    let report = store.index_report().await;
    store.close().await;
    let report = report?;

    print_report(&report);
    if !report.is_consistent() {
        bail!("search index is out of sync; re-run `oreg import` to repair it");
    }
    println!("ok");
    Ok(())
}

fn print_report(report: &IndexReport) {
    println!("index check");
    println!(
        "  missing:  {} organizations, {} bearers",
        report.missing_organizations, report.missing_bearers
    );
    println!(
        "  orphaned: {} organizations, {} bearers",
        report.orphaned_organizations, report.orphaned_bearers
    );
    println!(
        "  stale:    {} organizations, {} bearers",
        report.stale_organizations, report.stale_bearers
    );
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

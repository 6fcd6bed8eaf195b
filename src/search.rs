//! Organization and director search.
//!
//! Each entry point compiles its criteria, opens the store, runs one capped
//! read, and closes the store again whether or not the read succeeded.
//! An empty result is a normal outcome and prints `No results.`.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::error::RegistryError;
use crate::filter::{
    compile_bearers, compile_organizations, BearerCriteria, OrganizationCriteria,
};
use crate::models::{BearerRow, OrganizationRow};
use crate::store::RegistryStore;
use crate::vocab::Vocabulary;

pub async fn search_organizations(
    config: &Config,
    criteria: &OrganizationCriteria,
    limit: Option<i64>,
) -> Result<Vec<OrganizationRow>, RegistryError> {
    let predicate = compile_organizations(criteria);
    let limit = config.search.effective_limit(limit);

    let store = RegistryStore::open(config).await?;
    let rows = store.find_organizations(&predicate, limit).await;
    store.close().await;
    rows
}

pub async fn search_directors(
    config: &Config,
    criteria: &BearerCriteria,
    limit: Option<i64>,
) -> Result<Vec<BearerRow>, RegistryError> {
    let predicate = compile_bearers(criteria);
    let limit = config.search.effective_limit(limit);

    let store = RegistryStore::open(config).await?;
    let rows = store.find_bearers(&predicate, limit).await;
    store.close().await;
    rows
}

/// Parse CLI labels of one vocabulary group.
pub fn parse_labels<V: Vocabulary>(labels: &[String]) -> Result<Vec<V>> {
    let mut values = Vec::with_capacity(labels.len());
    for label in labels {
        match V::parse(label) {
            Some(v) if !values.contains(&v) => values.push(v),
            Some(_) => {}
            None => {
                let known: Vec<&str> = V::ALL.iter().map(|v| v.label()).collect();
                bail!(
                    "unknown {} '{}'. Use one of: {}",
                    V::GROUP,
                    label,
                    known.join(", ")
                );
            }
        }
    }
    Ok(values)
}

pub async fn run_search_organizations(
    config: &Config,
    criteria: &OrganizationCriteria,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let rows = search_organizations(config, criteria, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!(
        "{:>6}  {:<40} {:<12} {:<10} {:<10} {}",
        "ID", "NAME", "REG NO", "STATUS", "INCORP", "CATEGORY"
    );
    println!("{}", "-".repeat(100));
    for row in &rows {
        println!(
            "{:>6}  {:<40} {:<12} {:<10} {:<10} {}",
            row.id,
            truncate(&row.name, 40),
            display(&row.registration_number),
            display(&row.status_code),
            display(&row.incorporation_date),
            display(&row.category_description),
        );
        if let Some(former) = &row.former_name {
            println!("        formerly: {}", former);
        }
    }
    println!();
    println!("{} organization(s)", rows.len());
    Ok(())
}

pub async fn run_search_directors(
    config: &Config,
    criteria: &BearerCriteria,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let rows = search_directors(config, criteria, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No results.");
        return Ok(());
    }

    print_bearers(&rows);
    println!();
    println!("{} director(s)", rows.len());
    Ok(())
}

pub(crate) fn print_bearers(rows: &[BearerRow]) {
    println!(
        "{:<32} {:<14} {:<12} {:<10} {}",
        "NAME", "COUNTRY", "POSITION", "APPOINTED", "ORGANIZATION"
    );
    println!("{}", "-".repeat(100));
    for row in rows {
        println!(
            "{:<32} {:<14} {:<12} {:<10} {} (#{})",
            truncate(&row.name, 32),
            display(&row.country),
            display(&row.position),
            display(&row.appointed_date),
            row.organization_name,
            row.organization_id,
        );
    }
}

pub(crate) fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

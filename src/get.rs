//! Organization retrieval by ID.
//!
//! Fetches one organization with every stored field and all of its office
//! bearers. Used by `oreg get`.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::models::OrganizationDetail;
use crate::search::{display, print_bearers};
use crate::store::RegistryStore;

/// Core get function returning structured data.
pub async fn get_organization(config: &Config, id: i64) -> Result<OrganizationDetail> {
    let store = RegistryStore::open(config).await?;
    let detail = store
        .get_organization(id, config.search.effective_limit(None))
        .await;
    store.close().await;

    match detail? {
        Some(detail) => Ok(detail),
        None => bail!("organization not found: {}", id),
    }
}

/// CLI entry point: calls get_organization and prints to stdout.
pub async fn run_get(config: &Config, id: i64, json: bool) -> Result<()> {
    let org = get_organization(config, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&org)?);
        return Ok(());
    }

    println!("--- Organization ---");
    println!("id:                  {}", org.id);
    println!("name:                {}", org.name);
    println!("former name:         {}", display(&org.former_name));
    println!("registration number: {}", display(&org.registration_number));
    println!("file number:         {}", display(&org.file_number));
    println!("address:             {}", display(&org.address));
    println!(
        "category:            {} {}",
        display(&org.category_code),
        display(&org.category_description)
    );
    println!(
        "sub-category:        {} {}",
        display(&org.sub_category_code),
        display(&org.sub_category_description)
    );
    println!("status:              {}", display(&org.status_code));
    println!("type:                {}", display(&org.type_code));
    println!(
        "nature:              {} ({})",
        display(&org.nature_code),
        display(&org.nature_code_code)
    );
    println!("incorporated:        {}", display(&org.incorporation_date));
    println!("effective start:     {}", display(&org.effective_start_date));
    println!("defunct:             {}", display(&org.defunct_date));
    println!(
        "comprehensive income: {}",
        display(&org.total_comprehensive_income)
    );
    println!("winding up:          {}", display(&org.winding_up_status));
    println!("source file:         {}", display(&org.source_file));
    println!();

    println!("--- Office bearers ({}) ---", org.bearers.len());
    if !org.bearers.is_empty() {
        print_bearers(&org.bearers);
    }
    Ok(())
}

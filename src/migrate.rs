use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::create(config).await?;
    let result = apply(&pool).await;
    pool.close().await;
    result
}

async fn apply(pool: &SqlitePool) -> Result<()> {
    // Create organizations table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id INTEGER PRIMARY KEY,
            registration_number TEXT UNIQUE,
            file_number TEXT,
            name TEXT NOT NULL,
            former_name TEXT,
            address TEXT,
            category_code TEXT,
            category_description TEXT,
            sub_category_code TEXT,
            sub_category_description TEXT,
            status_code TEXT,
            type_code TEXT,
            nature_code TEXT,
            nature_code_code TEXT,
            incorporation_date TEXT,
            effective_start_date TEXT,
            defunct_date TEXT,
            total_comprehensive_income TEXT,
            winding_up_status TEXT,
            source_file TEXT,
            source_hash TEXT NOT NULL,
            CHECK (registration_number IS NOT NULL OR file_number IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create office bearers table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS office_bearers (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            country TEXT,
            position TEXT,
            address TEXT,
            appointed_date TEXT,
            FOREIGN KEY (organization_id) REFERENCES organizations(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first.
    // rowid of each index row is the owning entity's id; values are case-folded.
    for (table, columns) in [
        ("organizations_fts", "name, former_name, address"),
        ("office_bearers_fts", "name, country, position, address"),
    ] {
        let exists: bool = sqlx::query_scalar(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name = ?",
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            sqlx::query(&format!(
                "CREATE VIRTUAL TABLE {} USING fts5({}, tokenize = 'trigram')",
                table, columns
            ))
            .execute(pool)
            .await?;
        }
    }

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_organizations_file_number ON organizations(file_number)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_organizations_name ON organizations(name)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_office_bearers_natural \
         ON office_bearers(organization_id, name, IFNULL(position, ''))",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_office_bearers_name ON office_bearers(name)")
        .execute(pool)
        .await?;

    Ok(())
}

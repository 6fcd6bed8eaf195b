//! SQLite-backed registry store.
//!
//! Reads go through [`RegistryStore`], which wraps the pool and evaluates a
//! compiled [`Predicate`]. Writes are free functions over a
//! `&mut SqliteConnection` so the ingestion pipeline can run them inside
//! its batch transaction and per-record savepoints.
//!
//! Every entity write is followed by the matching index write
//! ([`sync_organization_index`], [`sync_bearer_index`]); the index row's
//! rowid is always the entity id.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::config::{Config, DuplicatePolicy};
use crate::db;
use crate::error::RegistryError;
use crate::filter::Predicate;
use crate::models::{
    BearerIndexEntry, BearerRow, OfficeBearer, Organization, OrganizationDetail,
    OrganizationIndexEntry, OrganizationRow,
};

/// Result of an insert-or-lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    AlreadyExists(i64),
    /// Existing row replaced under [`DuplicatePolicy::Overwrite`].
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match *self {
            UpsertOutcome::Inserted(id)
            | UpsertOutcome::AlreadyExists(id)
            | UpsertOutcome::Updated(id) => id,
        }
    }
}

/// Row counts of the entity and index tables.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RegistryCounts {
    pub organizations: i64,
    pub office_bearers: i64,
    pub organization_index: i64,
    pub bearer_index: i64,
}

/// Consistency of the text-search index against the entity tables.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IndexReport {
    /// Entities without an index row.
    pub missing_organizations: i64,
    pub missing_bearers: i64,
    /// Index rows without an entity.
    pub orphaned_organizations: i64,
    pub orphaned_bearers: i64,
    /// Index rows whose fields differ from the entity.
    pub stale_organizations: i64,
    pub stale_bearers: i64,
}

impl IndexReport {
    pub fn is_consistent(&self) -> bool {
        *self == IndexReport::default()
    }
}

pub struct RegistryStore {
    pool: SqlitePool,
}

const ORGANIZATION_COLUMNS: &str = "o.id, o.name, o.former_name, o.registration_number, \
     o.file_number, o.category_description, o.status_code, o.nature_code, o.incorporation_date";

const BEARER_COLUMNS: &str = "b.id, b.organization_id, o.name AS organization_name, \
     b.name AS name, b.country, b.position, b.address, b.appointed_date";

impl RegistryStore {
    /// Open the configured database; fails with
    /// [`RegistryError::StorageUnavailable`] if it is missing or uninitialized.
    pub async fn open(config: &Config) -> Result<Self, RegistryError> {
        Ok(Self {
            pool: db::open(config).await?,
        })
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Start the batch transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, RegistryError> {
        self.pool.begin().await.map_err(RegistryError::Storage)
    }

    pub async fn find_organizations(
        &self,
        predicate: &Predicate,
        limit: i64,
    ) -> Result<Vec<OrganizationRow>, RegistryError> {
        let filter = predicate.to_sql();
        let sql = format!(
            "SELECT {} FROM organizations o WHERE {} ORDER BY o.name LIMIT ?",
            ORGANIZATION_COLUMNS, filter.sql
        );

        let mut query = sqlx::query(&sql);
        for param in &filter.params {
            query = query.bind(param.as_str());
        }
        let rows = query
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(RegistryError::Query)?;

        Ok(rows.iter().map(organization_row).collect())
    }

    pub async fn find_bearers(
        &self,
        predicate: &Predicate,
        limit: i64,
    ) -> Result<Vec<BearerRow>, RegistryError> {
        let filter = predicate.to_sql();
        let sql = format!(
            "SELECT {} FROM office_bearers b JOIN organizations o ON o.id = b.organization_id \
             WHERE {} ORDER BY b.name LIMIT ?",
            BEARER_COLUMNS, filter.sql
        );

        let mut query = sqlx::query(&sql);
        for param in &filter.params {
            query = query.bind(param.as_str());
        }
        let rows = query
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(RegistryError::Query)?;

        Ok(rows.iter().map(bearer_row).collect())
    }

    /// Every office bearer of one organization, any position.
    pub async fn find_bearers_for_organization(
        &self,
        organization_id: i64,
        limit: i64,
    ) -> Result<Vec<BearerRow>, RegistryError> {
        let sql = format!(
            "SELECT {} FROM office_bearers b JOIN organizations o ON o.id = b.organization_id \
             WHERE b.organization_id = ? ORDER BY b.name LIMIT ?",
            BEARER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(organization_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(RegistryError::Query)?;

        Ok(rows.iter().map(bearer_row).collect())
    }

    pub async fn get_organization(
        &self,
        id: i64,
        bearer_limit: i64,
    ) -> Result<Option<OrganizationDetail>, RegistryError> {
        let row = sqlx::query(
            r#"
            SELECT id, registration_number, file_number, name, former_name, address,
                   category_code, category_description, sub_category_code,
                   sub_category_description, status_code, type_code, nature_code,
                   nature_code_code, incorporation_date, effective_start_date, defunct_date,
                   total_comprehensive_income, winding_up_status, source_file
            FROM organizations WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RegistryError::Query)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let bearers = self.find_bearers_for_organization(id, bearer_limit).await?;

        Ok(Some(OrganizationDetail {
            id: row.get("id"),
            registration_number: row.get("registration_number"),
            file_number: row.get("file_number"),
            name: row.get("name"),
            former_name: row.get("former_name"),
            address: row.get("address"),
            category_code: row.get("category_code"),
            category_description: row.get("category_description"),
            sub_category_code: row.get("sub_category_code"),
            sub_category_description: row.get("sub_category_description"),
            status_code: row.get("status_code"),
            type_code: row.get("type_code"),
            nature_code: row.get("nature_code"),
            nature_code_code: row.get("nature_code_code"),
            incorporation_date: row.get("incorporation_date"),
            effective_start_date: row.get("effective_start_date"),
            defunct_date: row.get("defunct_date"),
            total_comprehensive_income: row.get("total_comprehensive_income"),
            winding_up_status: row.get("winding_up_status"),
            source_file: row.get("source_file"),
            bearers,
        }))
    }

    /// Number of organizations matching a predicate, uncapped.
    pub async fn count_organizations(&self, predicate: &Predicate) -> Result<i64, RegistryError> {
        let filter = predicate.to_sql();
        let sql = format!("SELECT COUNT(*) FROM organizations o WHERE {}", filter.sql);
        let mut query = sqlx::query_scalar(&sql);
        for param in &filter.params {
            query = query.bind(param.as_str());
        }
        query
            .fetch_one(&self.pool)
            .await
            .map_err(RegistryError::Query)
    }

    pub async fn counts(&self) -> Result<RegistryCounts, RegistryError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM organizations) AS organizations,
                (SELECT COUNT(*) FROM office_bearers) AS office_bearers,
                (SELECT COUNT(*) FROM organizations_fts) AS organization_index,
                (SELECT COUNT(*) FROM office_bearers_fts) AS bearer_index
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(RegistryError::Query)?;

        Ok(RegistryCounts {
            organizations: row.get("organizations"),
            office_bearers: row.get("office_bearers"),
            organization_index: row.get("organization_index"),
            bearer_index: row.get("bearer_index"),
        })
    }

    pub async fn index_report(&self) -> Result<IndexReport, RegistryError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM organizations
                  WHERE id NOT IN (SELECT rowid FROM organizations_fts)) AS missing_organizations,
                (SELECT COUNT(*) FROM office_bearers
                  WHERE id NOT IN (SELECT rowid FROM office_bearers_fts)) AS missing_bearers,
                (SELECT COUNT(*) FROM organizations_fts
                  WHERE rowid NOT IN (SELECT id FROM organizations)) AS orphaned_organizations,
                (SELECT COUNT(*) FROM office_bearers_fts
                  WHERE rowid NOT IN (SELECT id FROM office_bearers)) AS orphaned_bearers
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(RegistryError::Query)?;

        // Index rows are case-folded in Rust, so staleness is compared here
        // rather than in SQL.
        let organizations = sqlx::query(
            r#"
            SELECT o.name, o.former_name, o.address,
                   f.name AS fts_name, f.former_name AS fts_former_name, f.address AS fts_address
            FROM organizations o JOIN organizations_fts f ON f.rowid = o.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RegistryError::Query)?;
        let stale_organizations = organizations
            .iter()
            .filter(|r| {
                organization_entry(r)
                    != OrganizationIndexEntry {
                        name: r.get("fts_name"),
                        former_name: r.get("fts_former_name"),
                        address: r.get("fts_address"),
                    }
            })
            .count() as i64;

        let bearers = sqlx::query(
            r#"
            SELECT b.name, b.country, b.position, b.address,
                   f.name AS fts_name, f.country AS fts_country,
                   f.position AS fts_position, f.address AS fts_address
            FROM office_bearers b JOIN office_bearers_fts f ON f.rowid = b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RegistryError::Query)?;
        let stale_bearers = bearers
            .iter()
            .filter(|r| {
                bearer_entry(r)
                    != BearerIndexEntry {
                        name: r.get("fts_name"),
                        country: r.get("fts_country"),
                        position: r.get("fts_position"),
                        address: r.get("fts_address"),
                    }
            })
            .count() as i64;

        Ok(IndexReport {
            missing_organizations: row.get("missing_organizations"),
            missing_bearers: row.get("missing_bearers"),
            orphaned_organizations: row.get("orphaned_organizations"),
            orphaned_bearers: row.get("orphaned_bearers"),
            stale_organizations,
            stale_bearers,
        })
    }
}

/// Index entry derived from an entity row with `name`, `former_name` and
/// `address` columns.
fn organization_entry(row: &SqliteRow) -> OrganizationIndexEntry {
    OrganizationIndexEntry::new(
        row.get::<&str, _>("name"),
        row.get::<Option<&str>, _>("former_name"),
        row.get::<Option<&str>, _>("address"),
    )
}

fn bearer_entry(row: &SqliteRow) -> BearerIndexEntry {
    BearerIndexEntry::new(
        row.get::<&str, _>("name"),
        row.get::<Option<&str>, _>("country"),
        row.get::<Option<&str>, _>("position"),
        row.get::<Option<&str>, _>("address"),
    )
}

fn organization_row(row: &SqliteRow) -> OrganizationRow {
    OrganizationRow {
        id: row.get("id"),
        name: row.get("name"),
        former_name: row.get("former_name"),
        registration_number: row.get("registration_number"),
        file_number: row.get("file_number"),
        category_description: row.get("category_description"),
        status_code: row.get("status_code"),
        nature_code: row.get("nature_code"),
        incorporation_date: row.get("incorporation_date"),
    }
}

fn bearer_row(row: &SqliteRow) -> BearerRow {
    BearerRow {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        organization_name: row.get("organization_name"),
        name: row.get("name"),
        country: row.get("country"),
        position: row.get("position"),
        address: row.get("address"),
        appointed_date: row.get("appointed_date"),
    }
}

// ============ Writes ============

/// Insert an organization unless one already shares its registration or
/// file number.
///
/// With [`DuplicatePolicy::Skip`] an existing row is never touched. With
/// [`DuplicatePolicy::Overwrite`] its descriptive fields are replaced when
/// the incoming record hashes differently.
pub async fn upsert_organization(
    conn: &mut SqliteConnection,
    org: &Organization,
    source_file: Option<&str>,
    policy: DuplicatePolicy,
) -> Result<UpsertOutcome, sqlx::Error> {
    let hash = org.content_hash();

    let existing = sqlx::query(
        r#"
        SELECT id, source_hash FROM organizations
        WHERE registration_number = ? OR file_number = ?
        ORDER BY CASE WHEN registration_number = ? THEN 0 ELSE 1 END, id
        LIMIT 1
        "#,
    )
    .bind(&org.registration_number)
    .bind(&org.file_number)
    .bind(&org.registration_number)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = existing {
        let id: i64 = row.get("id");
        let stored_hash: String = row.get("source_hash");
        if policy == DuplicatePolicy::Skip || stored_hash == hash {
            return Ok(UpsertOutcome::AlreadyExists(id));
        }

        sqlx::query(
            r#"
            UPDATE organizations SET
                registration_number = COALESCE(?, registration_number),
                file_number = COALESCE(?, file_number),
                name = ?, former_name = ?, address = ?, category_code = ?,
                category_description = ?, sub_category_code = ?, sub_category_description = ?,
                status_code = ?, type_code = ?, nature_code = ?, nature_code_code = ?,
                incorporation_date = ?, effective_start_date = ?, defunct_date = ?,
                total_comprehensive_income = ?, winding_up_status = ?,
                source_file = ?, source_hash = ?
            WHERE id = ?
            "#,
        )
        .bind(&org.registration_number)
        .bind(&org.file_number)
        .bind(&org.name)
        .bind(&org.former_name)
        .bind(&org.address)
        .bind(&org.category_code)
        .bind(&org.category_description)
        .bind(&org.sub_category_code)
        .bind(&org.sub_category_description)
        .bind(&org.status_code)
        .bind(&org.type_code)
        .bind(&org.nature_code)
        .bind(&org.nature_code_code)
        .bind(&org.incorporation_date)
        .bind(&org.effective_start_date)
        .bind(&org.defunct_date)
        .bind(&org.total_comprehensive_income)
        .bind(&org.winding_up_status)
        .bind(source_file)
        .bind(&hash)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        return Ok(UpsertOutcome::Updated(id));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO organizations (registration_number, file_number, name, former_name, address,
                                   category_code, category_description, sub_category_code,
                                   sub_category_description, status_code, type_code, nature_code,
                                   nature_code_code, incorporation_date, effective_start_date,
                                   defunct_date, total_comprehensive_income, winding_up_status,
                                   source_file, source_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&org.registration_number)
    .bind(&org.file_number)
    .bind(&org.name)
    .bind(&org.former_name)
    .bind(&org.address)
    .bind(&org.category_code)
    .bind(&org.category_description)
    .bind(&org.sub_category_code)
    .bind(&org.sub_category_description)
    .bind(&org.status_code)
    .bind(&org.type_code)
    .bind(&org.nature_code)
    .bind(&org.nature_code_code)
    .bind(&org.incorporation_date)
    .bind(&org.effective_start_date)
    .bind(&org.defunct_date)
    .bind(&org.total_comprehensive_income)
    .bind(&org.winding_up_status)
    .bind(source_file)
    .bind(&hash)
    .fetch_one(&mut *conn)
    .await?;

    Ok(UpsertOutcome::Inserted(id))
}

/// Insert a bearer unless `(organization, name, position)` already exists.
pub async fn upsert_office_bearer(
    conn: &mut SqliteConnection,
    organization_id: i64,
    bearer: &OfficeBearer,
) -> Result<UpsertOutcome, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM office_bearers WHERE organization_id = ? AND name = ? AND position IS ?",
    )
    .bind(organization_id)
    .bind(&bearer.name)
    .bind(&bearer.position)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(UpsertOutcome::AlreadyExists(id));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO office_bearers (organization_id, name, country, position, address, appointed_date)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(organization_id)
    .bind(&bearer.name)
    .bind(&bearer.country)
    .bind(&bearer.position)
    .bind(&bearer.address)
    .bind(&bearer.appointed_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(UpsertOutcome::Inserted(id))
}

/// Write or overwrite the index row of an organization.
pub async fn sync_organization_index(
    conn: &mut SqliteConnection,
    organization_id: i64,
    entry: &OrganizationIndexEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM organizations_fts WHERE rowid = ?")
        .bind(organization_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO organizations_fts (rowid, name, former_name, address) VALUES (?, ?, ?, ?)",
    )
    .bind(organization_id)
    .bind(&entry.name)
    .bind(&entry.former_name)
    .bind(&entry.address)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Write or overwrite the index row of an office bearer.
pub async fn sync_bearer_index(
    conn: &mut SqliteConnection,
    bearer_id: i64,
    entry: &BearerIndexEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM office_bearers_fts WHERE rowid = ?")
        .bind(bearer_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO office_bearers_fts (rowid, name, country, position, address) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(bearer_id)
    .bind(&entry.name)
    .bind(&entry.country)
    .bind(&entry.position)
    .bind(&entry.address)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Index fields of a stored organization, read from the entity row.
pub async fn stored_organization_entry(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<Option<OrganizationIndexEntry>, sqlx::Error> {
    let row = sqlx::query("SELECT name, former_name, address FROM organizations WHERE id = ?")
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|r| organization_entry(&r)))
}

/// Index fields of a stored office bearer, read from the entity row.
pub async fn stored_bearer_entry(
    conn: &mut SqliteConnection,
    bearer_id: i64,
) -> Result<Option<BearerIndexEntry>, sqlx::Error> {
    let row =
        sqlx::query("SELECT name, country, position, address FROM office_bearers WHERE id = ?")
            .bind(bearer_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.map(|r| bearer_entry(&r)))
}

//! Core data models used throughout the registry.
//!
//! Three layers: the raw source shape as produced by the external data
//! source, the normalized entities written by ingestion, and the row
//! projections returned by searches.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// One source file: an organization plus its office bearers.
///
/// Every field is kept as a raw JSON value so that numbers, strings and
/// nulls all survive deserialization; the normalizer decides what counts
/// as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    #[serde(default)]
    pub company_details: Option<RawCompanyDetails>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub office_bearers: Vec<RawOfficeBearer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCompanyDetails {
    pub org_no: Option<Value>,
    pub org_file_no: Option<Value>,
    pub org_name: Option<Value>,
    pub former_org_name: Option<Value>,
    pub company_address: Option<Value>,
    pub org_category_code: Option<Value>,
    pub category_desc: Option<Value>,
    pub org_sub_category_code: Option<Value>,
    pub sub_category_desc: Option<Value>,
    pub org_last_sta_cd: Option<Value>,
    pub org_type_cd: Option<Value>,
    pub org_nature_cd: Option<Value>,
    pub org_nature_cd_code: Option<Value>,
    pub org_incorp_date: Option<Value>,
    pub effective_start_date: Option<Value>,
    pub defunct_date: Option<Value>,
    pub total_comprehensive_income: Option<Value>,
    pub winding_up_status: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOfficeBearer {
    pub name: Option<Value>,
    pub country: Option<Value>,
    pub position: Option<Value>,
    pub address: Option<Value>,
    pub appointed_date: Option<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawOfficeBearer>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<RawOfficeBearer>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Normalized organization, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Organization {
    pub registration_number: Option<String>,
    pub file_number: Option<String>,
    pub name: String,
    pub former_name: Option<String>,
    pub address: Option<String>,
    pub category_code: Option<String>,
    pub category_description: Option<String>,
    pub sub_category_code: Option<String>,
    pub sub_category_description: Option<String>,
    pub status_code: Option<String>,
    pub type_code: Option<String>,
    pub nature_code: Option<String>,
    pub nature_code_code: Option<String>,
    pub incorporation_date: Option<String>,
    pub effective_start_date: Option<String>,
    pub defunct_date: Option<String>,
    pub total_comprehensive_income: Option<String>,
    pub winding_up_status: Option<String>,
}

impl Organization {
    /// SHA-256 over every stored field. Absent and empty are hashed apart.
    pub fn content_hash(&self) -> String {
        let fields = [
            self.registration_number.as_deref(),
            self.file_number.as_deref(),
            Some(self.name.as_str()),
            self.former_name.as_deref(),
            self.address.as_deref(),
            self.category_code.as_deref(),
            self.category_description.as_deref(),
            self.sub_category_code.as_deref(),
            self.sub_category_description.as_deref(),
            self.status_code.as_deref(),
            self.type_code.as_deref(),
            self.nature_code.as_deref(),
            self.nature_code_code.as_deref(),
            self.incorporation_date.as_deref(),
            self.effective_start_date.as_deref(),
            self.defunct_date.as_deref(),
            self.total_comprehensive_income.as_deref(),
            self.winding_up_status.as_deref(),
        ];

        let mut hasher = Sha256::new();
        for field in fields {
            match field {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update((value.len() as u64).to_le_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn index_entry(&self) -> OrganizationIndexEntry {
        OrganizationIndexEntry::new(
            &self.name,
            self.former_name.as_deref(),
            self.address.as_deref(),
        )
    }
}

/// Normalized office bearer, not yet attached to a stored organization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfficeBearer {
    pub name: String,
    pub country: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    pub appointed_date: Option<String>,
}

impl OfficeBearer {
    pub fn index_entry(&self) -> BearerIndexEntry {
        BearerIndexEntry::new(
            &self.name,
            self.country.as_deref(),
            self.position.as_deref(),
            self.address.as_deref(),
        )
    }
}

/// Output of the normalizer for one accepted source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub organization: Organization,
    pub bearers: Vec<OfficeBearer>,
    /// Bearers dropped because their name was empty after normalization.
    pub rejected_bearers: usize,
}

/// Case folding applied to text-search index rows and search fragments.
///
/// Full Unicode upper case, so `société` and `SOCIÉTÉ` fold alike.
pub fn fold_case(text: &str) -> String {
    text.to_uppercase()
}

/// Text-search fields of an organization, case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationIndexEntry {
    pub name: String,
    pub former_name: Option<String>,
    pub address: Option<String>,
}

impl OrganizationIndexEntry {
    pub fn new(name: &str, former_name: Option<&str>, address: Option<&str>) -> Self {
        Self {
            name: fold_case(name),
            former_name: former_name.map(fold_case),
            address: address.map(fold_case),
        }
    }
}

/// Text-search fields of an office bearer, case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerIndexEntry {
    pub name: String,
    pub country: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
}

impl BearerIndexEntry {
    pub fn new(
        name: &str,
        country: Option<&str>,
        position: Option<&str>,
        address: Option<&str>,
    ) -> Self {
        Self {
            name: fold_case(name),
            country: country.map(fold_case),
            position: position.map(fold_case),
            address: address.map(fold_case),
        }
    }
}

/// Row returned by organization search.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationRow {
    pub id: i64,
    pub name: String,
    pub former_name: Option<String>,
    pub registration_number: Option<String>,
    pub file_number: Option<String>,
    pub category_description: Option<String>,
    pub status_code: Option<String>,
    pub nature_code: Option<String>,
    pub incorporation_date: Option<String>,
}

/// Row returned by director search and by directors-of-one-organization.
#[derive(Debug, Clone, Serialize)]
pub struct BearerRow {
    pub id: i64,
    pub organization_id: i64,
    pub organization_name: String,
    pub name: String,
    pub country: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    pub appointed_date: Option<String>,
}

/// Full organization record with its office bearers.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationDetail {
    pub id: i64,
    pub registration_number: Option<String>,
    pub file_number: Option<String>,
    pub name: String,
    pub former_name: Option<String>,
    pub address: Option<String>,
    pub category_code: Option<String>,
    pub category_description: Option<String>,
    pub sub_category_code: Option<String>,
    pub sub_category_description: Option<String>,
    pub status_code: Option<String>,
    pub type_code: Option<String>,
    pub nature_code: Option<String>,
    pub nature_code_code: Option<String>,
    pub incorporation_date: Option<String>,
    pub effective_start_date: Option<String>,
    pub defunct_date: Option<String>,
    pub total_comprehensive_income: Option<String>,
    pub winding_up_status: Option<String>,
    pub source_file: Option<String>,
    pub bearers: Vec<BearerRow>,
}

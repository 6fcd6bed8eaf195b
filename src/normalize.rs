//! Record normalizer.
//!
//! Turns one raw [`SourceRecord`] into a [`NormalizedRecord`] or a
//! [`Rejection`]. Pure: no I/O, no logging side effects beyond `tracing`
//! debug events.

use serde_json::Value;

use crate::error::Rejection;
use crate::models::{
    NormalizedRecord, OfficeBearer, Organization, RawCompanyDetails, RawOfficeBearer, SourceRecord,
};
use crate::vocab::{Category, Nature, Status, Vocabulary};

/// Token some sources embed in the bearer name field.
const ROLE_SUFFIX: &str = "Director";

/// Trim a raw value into text. Empty strings, nulls, arrays and objects are
/// absent; numbers and booleans keep their JSON spelling.
pub fn clean(value: &Option<Value>) -> Option<String> {
    let text = match value.as_ref()? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn upper(value: &Option<Value>) -> Option<String> {
    clean(value).map(|s| s.to_uppercase())
}

pub fn normalize_record(record: &SourceRecord) -> Result<NormalizedRecord, Rejection> {
    let details = record
        .company_details
        .as_ref()
        .ok_or(Rejection::MissingName)?;
    let organization = normalize_organization(details)?;

    let mut bearers = Vec::with_capacity(record.office_bearers.len());
    let mut rejected_bearers = 0;
    for raw in &record.office_bearers {
        match normalize_bearer(raw) {
            Ok(bearer) => bearers.push(bearer),
            Err(_) => rejected_bearers += 1,
        }
    }

    Ok(NormalizedRecord {
        organization,
        bearers,
        rejected_bearers,
    })
}

pub fn normalize_organization(details: &RawCompanyDetails) -> Result<Organization, Rejection> {
    let name = upper(&details.org_name).ok_or(Rejection::MissingName)?;

    let registration_number = clean(&details.org_no);
    let file_number = clean(&details.org_file_no);
    if registration_number.is_none() && file_number.is_none() {
        return Err(Rejection::MissingNaturalKey);
    }

    let org = Organization {
        registration_number,
        file_number,
        name,
        former_name: clean(&details.former_org_name),
        address: clean(&details.company_address),
        category_code: clean(&details.org_category_code),
        category_description: clean(&details.category_desc),
        sub_category_code: clean(&details.org_sub_category_code),
        sub_category_description: clean(&details.sub_category_desc),
        status_code: upper(&details.org_last_sta_cd),
        type_code: clean(&details.org_type_cd),
        nature_code: clean(&details.org_nature_cd),
        nature_code_code: clean(&details.org_nature_cd_code),
        incorporation_date: clean(&details.org_incorp_date),
        effective_start_date: clean(&details.effective_start_date),
        defunct_date: clean(&details.defunct_date),
        total_comprehensive_income: clean(&details.total_comprehensive_income),
        winding_up_status: clean(&details.winding_up_status),
    };

    log_unclassified(&org);
    Ok(org)
}

pub fn normalize_bearer(raw: &RawOfficeBearer) -> Result<OfficeBearer, Rejection> {
    let name = clean(&raw.name)
        .map(|n| strip_role_suffix(&n))
        .filter(|n| !n.is_empty())
        .ok_or(Rejection::EmptyBearerName)?;

    Ok(OfficeBearer {
        name,
        country: upper(&raw.country),
        position: clean(&raw.position),
        address: clean(&raw.address),
        appointed_date: clean(&raw.appointed_date),
    })
}

/// Remove every occurrence of the role token, including inside longer words
/// ("Directorate" leaves "ate"), then collapse all runs of whitespace in the
/// name to single spaces. Collapsing also normalizes spacing the source had
/// between name parts.
fn strip_role_suffix(name: &str) -> String {
    name.replace(ROLE_SUFFIX, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn log_unclassified(org: &Organization) {
    if org.category_description.is_some()
        && Category::classify(org.category_description.as_deref()).is_none()
    {
        tracing::debug!(name = %org.name, value = ?org.category_description, "unclassified category");
    }
    if org.status_code.is_some() && Status::classify(org.status_code.as_deref()).is_none() {
        tracing::debug!(name = %org.name, value = ?org.status_code, "unclassified status");
    }
    if org.nature_code.is_some() && Nature::classify(org.nature_code.as_deref()).is_none() {
        tracing::debug!(name = %org.name, value = ?org.nature_code, "unclassified nature");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> SourceRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn trims_and_uppercases() {
        let rec = record(json!({
            "companyDetails": {
                "orgNo": " C123 ",
                "orgName": "  Blue Bank Ltd ",
                "orgLastStaCd": "live",
                "formerOrgName": "   ",
                "categoryDesc": "DOMESTIC"
            },
            "officeBearers": [
                {"name": " Jane Doe ", "country": "mauritius", "position": "DIRECTOR"}
            ]
        }));
        let out = normalize_record(&rec).unwrap();
        assert_eq!(out.organization.name, "BLUE BANK LTD");
        assert_eq!(out.organization.registration_number.as_deref(), Some("C123"));
        assert_eq!(out.organization.status_code.as_deref(), Some("LIVE"));
        assert_eq!(out.organization.former_name, None);
        assert_eq!(out.bearers[0].name, "Jane Doe");
        assert_eq!(out.bearers[0].country.as_deref(), Some("MAURITIUS"));
    }

    #[test]
    fn missing_name_is_rejected() {
        let rec = record(json!({"companyDetails": {"orgNo": "1", "orgName": "  "}}));
        assert_eq!(normalize_record(&rec).unwrap_err(), Rejection::MissingName);

        let rec = record(json!({"officeBearers": []}));
        assert_eq!(normalize_record(&rec).unwrap_err(), Rejection::MissingName);
    }

    #[test]
    fn missing_both_natural_keys_is_rejected() {
        let rec = record(json!({"companyDetails": {"orgName": "Acme"}}));
        assert_eq!(
            normalize_record(&rec).unwrap_err(),
            Rejection::MissingNaturalKey
        );
    }

    #[test]
    fn file_number_alone_is_enough() {
        let rec = record(json!({"companyDetails": {"orgFileNo": "F-9", "orgName": "Acme"}}));
        let out = normalize_record(&rec).unwrap();
        assert_eq!(out.organization.registration_number, None);
        assert_eq!(out.organization.file_number.as_deref(), Some("F-9"));
    }

    #[test]
    fn numeric_fields_become_text() {
        let rec = record(json!({
            "companyDetails": {"orgNo": 4567, "orgName": "Acme", "totalComprehensiveIncome": 12.5}
        }));
        let out = normalize_record(&rec).unwrap();
        assert_eq!(out.organization.registration_number.as_deref(), Some("4567"));
        assert_eq!(
            out.organization.total_comprehensive_income.as_deref(),
            Some("12.5")
        );
    }

    #[test]
    fn strips_director_from_bearer_names() {
        let raw: RawOfficeBearer =
            serde_json::from_value(json!({"name": "John Smith Director"})).unwrap();
        assert_eq!(normalize_bearer(&raw).unwrap().name, "John Smith");

        let raw: RawOfficeBearer =
            serde_json::from_value(json!({"name": "Director  Mary Ann"})).unwrap();
        assert_eq!(normalize_bearer(&raw).unwrap().name, "Mary Ann");
    }

    #[test]
    fn role_token_is_stripped_as_substring_and_spacing_collapsed() {
        assert_eq!(strip_role_suffix("Jean   Paul  Directorate"), "Jean Paul ate");
        assert_eq!(strip_role_suffix("Ann\tLee"), "Ann Lee");
        assert_eq!(strip_role_suffix("director Ann"), "director Ann");
    }

    #[test]
    fn bearer_with_only_role_token_is_rejected() {
        let raw: RawOfficeBearer =
            serde_json::from_value(json!({"name": " Director ", "country": "MU"})).unwrap();
        assert_eq!(
            normalize_bearer(&raw).unwrap_err(),
            Rejection::EmptyBearerName
        );
    }

    #[test]
    fn rejected_bearers_do_not_reject_record() {
        let rec = record(json!({
            "companyDetails": {"orgNo": "1", "orgName": "Acme"},
            "officeBearers": [
                {"name": "Director"},
                {"name": ""},
                {"name": "A Person", "position": "SECRETARY"}
            ]
        }));
        let out = normalize_record(&rec).unwrap();
        assert_eq!(out.bearers.len(), 1);
        assert_eq!(out.rejected_bearers, 2);
    }

    #[test]
    fn position_and_other_fields_pass_through() {
        let raw: RawOfficeBearer = serde_json::from_value(json!({
            "name": "A", "position": "Director", "appointedDate": "01/02/2003"
        }))
        .unwrap();
        let bearer = normalize_bearer(&raw).unwrap();
        assert_eq!(bearer.position.as_deref(), Some("Director"));
        assert_eq!(bearer.appointed_date.as_deref(), Some("01/02/2003"));
    }
}

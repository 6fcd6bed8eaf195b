//! Filter query compiler.
//!
//! Structured criteria ([`OrganizationCriteria`], [`BearerCriteria`]) are
//! compiled into a typed [`Predicate`] tree. The tree is evaluated either by
//! the store, through [`Predicate::to_sql`], or in memory through
//! [`Predicate::matches`]; both give the same answer for the same record.
//! User input only ever travels as bound parameters.
//!
//! Compilation never touches storage and never fails: empty criteria
//! compile to [`Predicate::Always`].

use std::str::FromStr;

use thiserror::Error;

use crate::models::{fold_case, OfficeBearer, Organization};
use crate::vocab::{Category, Nature, Status, Vocabulary};

/// Case-insensitive prefix that negates a bearer search.
const NEGATION_PREFIX: &str = "not like ";

/// Position every bearer search is restricted to.
const DIRECTOR_POSITION: &str = "DIRECTOR";

/// A filterable attribute of an organization or an office bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    OrgName,
    OrgFormerName,
    OrgAddress,
    OrgCategory,
    OrgStatus,
    OrgNature,
    OrgIncorporationDate,
    BearerName,
    BearerCountry,
    BearerPosition,
    BearerAddress,
}

impl Field {
    fn column(self) -> &'static str {
        match self {
            Field::OrgName => "o.name",
            Field::OrgFormerName => "o.former_name",
            Field::OrgAddress => "o.address",
            Field::OrgCategory => "o.category_description",
            Field::OrgStatus => "o.status_code",
            Field::OrgNature => "o.nature_code",
            Field::OrgIncorporationDate => "o.incorporation_date",
            Field::BearerName => "b.name",
            Field::BearerCountry => "b.country",
            Field::BearerPosition => "b.position",
            Field::BearerAddress => "b.address",
        }
    }

    /// `(index table, index column, owning id column)` for fields carried
    /// by the text-search index.
    fn index(self) -> Option<(&'static str, &'static str, &'static str)> {
        match self {
            Field::OrgName => Some(("organizations_fts", "name", "o.id")),
            Field::OrgFormerName => Some(("organizations_fts", "former_name", "o.id")),
            Field::OrgAddress => Some(("organizations_fts", "address", "o.id")),
            Field::BearerName => Some(("office_bearers_fts", "name", "b.id")),
            Field::BearerCountry => Some(("office_bearers_fts", "country", "b.id")),
            Field::BearerPosition => Some(("office_bearers_fts", "position", "b.id")),
            Field::BearerAddress => Some(("office_bearers_fts", "address", "b.id")),
            _ => None,
        }
    }
}

/// Field access for in-memory evaluation.
pub trait Fields {
    fn field(&self, field: Field) -> Option<&str>;
}

impl Fields for Organization {
    fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::OrgName => Some(self.name.as_str()),
            Field::OrgFormerName => self.former_name.as_deref(),
            Field::OrgAddress => self.address.as_deref(),
            Field::OrgCategory => self.category_description.as_deref(),
            Field::OrgStatus => self.status_code.as_deref(),
            Field::OrgNature => self.nature_code.as_deref(),
            Field::OrgIncorporationDate => self.incorporation_date.as_deref(),
            _ => None,
        }
    }
}

impl Fields for OfficeBearer {
    fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::BearerName => Some(self.name.as_str()),
            Field::BearerCountry => self.country.as_deref(),
            Field::BearerPosition => self.position.as_deref(),
            Field::BearerAddress => self.address.as_deref(),
            _ => None,
        }
    }
}

/// Compiled, store-evaluable boolean condition.
///
/// Leaves are two-valued: an absent field is treated as the empty string,
/// so `Not` is always the exact complement of its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Always,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// Field is absent or whitespace.
    Blank(Field),
    /// Whole-value equality, ASCII case-insensitive.
    Equals(Field, String),
    /// Substring match. Case-folded on indexed fields, ASCII
    /// case-insensitive elsewhere.
    Contains(Field, String),
    /// `DD/MM/YYYY` field on or after a `YYYYMMDD` key.
    DateFrom(Field, String),
    /// `DD/MM/YYYY` field on or before a `YYYYMMDD` key.
    DateTo(Field, String),
}

impl Predicate {
    pub fn equals(field: Field, value: &str) -> Self {
        Predicate::Equals(field, value.to_string())
    }

    pub fn contains(field: Field, value: &str) -> Self {
        Predicate::Contains(field, value.to_string())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    /// Conjunction that drops `Always` operands and unwraps a single one.
    pub fn all(parts: Vec<Predicate>) -> Self {
        let mut parts: Vec<Predicate> = parts
            .into_iter()
            .filter(|p| *p != Predicate::Always)
            .collect();
        match parts.len() {
            0 => Predicate::Always,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    /// Evaluate against an in-memory record.
    pub fn matches(&self, record: &dyn Fields) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::And(parts) => parts.iter().all(|p| p.matches(record)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(record)),
            Predicate::Not(inner) => !inner.matches(record),
            Predicate::Blank(field) => record
                .field(*field)
                .map_or(true, |v| v.trim().is_empty()),
            Predicate::Equals(field, value) => record
                .field(*field)
                .unwrap_or("")
                .eq_ignore_ascii_case(value),
            Predicate::Contains(field, value) => {
                let haystack = record.field(*field).unwrap_or("");
                if field.index().is_some() {
                    fold_case(haystack).contains(&fold_case(value))
                } else {
                    haystack
                        .to_ascii_lowercase()
                        .contains(&value.to_ascii_lowercase())
                }
            }
            Predicate::DateFrom(field, key) => record
                .field(*field)
                .and_then(sortable_date)
                .is_some_and(|d| d.as_str() >= key.as_str()),
            Predicate::DateTo(field, key) => record
                .field(*field)
                .and_then(sortable_date)
                .is_some_and(|d| d.as_str() <= key.as_str()),
        }
    }

    /// Render as a SQL boolean expression over `organizations o` and
    /// `office_bearers b`, with `?` placeholders in parameter order.
    pub fn to_sql(&self) -> SqlFragment {
        let mut fragment = SqlFragment::default();
        self.render(&mut fragment);
        fragment
    }

    fn render(&self, out: &mut SqlFragment) {
        match self {
            Predicate::Always => out.sql.push('1'),
            Predicate::And(parts) => render_joined(out, parts, " AND ", '1'),
            Predicate::Or(parts) => render_joined(out, parts, " OR ", '0'),
            Predicate::Not(inner) => {
                out.sql.push_str("NOT (");
                inner.render(out);
                out.sql.push(')');
            }
            Predicate::Blank(field) => {
                out.sql
                    .push_str(&format!("IFNULL(TRIM({}), '') = ''", field.column()));
            }
            Predicate::Equals(field, value) => {
                out.sql
                    .push_str(&format!("IFNULL({}, '') = ? COLLATE NOCASE", field.column()));
                out.params.push(value.clone());
            }
            Predicate::Contains(field, value) => match field.index() {
                Some((table, column, owner)) => {
                    out.sql.push_str(&format!(
                        "{} IN (SELECT rowid FROM {} WHERE {} LIKE ? ESCAPE '\\')",
                        owner, table, column
                    ));
                    out.params.push(like_pattern(&fold_case(value)));
                }
                None => {
                    out.sql.push_str(&format!(
                        "IFNULL({}, '') LIKE ? ESCAPE '\\'",
                        field.column()
                    ));
                    out.params.push(like_pattern(value));
                }
            },
            Predicate::DateFrom(field, key) => {
                out.sql.push_str(&date_comparison(field.column(), ">="));
                out.params.push(key.clone());
            }
            Predicate::DateTo(field, key) => {
                out.sql.push_str(&date_comparison(field.column(), "<="));
                out.params.push(key.clone());
            }
        }
    }
}

fn render_joined(out: &mut SqlFragment, parts: &[Predicate], joiner: &str, empty: char) {
    if parts.is_empty() {
        out.sql.push(empty);
        return;
    }
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.sql.push_str(joiner);
        }
        out.sql.push('(');
        part.render(out);
        out.sql.push(')');
    }
}

/// Reassemble `DD/MM/YYYY` into `YYYYMMDD` in SQL. Values of any other
/// shape never satisfy a date bound.
fn date_comparison(column: &str, op: &str) -> String {
    format!(
        "(IFNULL({col}, '') GLOB '[0-9][0-9]/[0-9][0-9]/[0-9][0-9][0-9][0-9]' \
         AND substr({col}, 7, 4) || substr({col}, 4, 2) || substr({col}, 1, 2) {op} ?)",
        col = column,
        op = op
    )
}

fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Rewrite a `DD/MM/YYYY` string to its sortable `YYYYMMDD` form by
/// character position. `None` when the string does not have that shape.
pub fn sortable_date(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[2] == b'/'
        && bytes[5] == b'/'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    Some(format!("{}{}{}", &value[6..10], &value[3..5], &value[0..2]))
}

/// A SQL expression with its bound parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<String>,
}

// ============ Criteria ============

/// Selection within one categorical group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelection<V> {
    pub values: Vec<V>,
    pub include_unclassified: bool,
}

impl<V> Default for GroupSelection<V> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            include_unclassified: false,
        }
    }
}

impl<V: Vocabulary> GroupSelection<V> {
    pub fn of(values: Vec<V>) -> Self {
        Self {
            values,
            include_unclassified: false,
        }
    }

    pub fn with_unclassified(mut self, include: bool) -> Self {
        self.include_unclassified = include;
        self
    }

    /// OR of the selected rules, or `None` when nothing is selected.
    pub fn compile(&self) -> Option<Predicate> {
        let mut branches: Vec<Predicate> = self.values.iter().map(|v| v.rule()).collect();
        if self.include_unclassified {
            branches.push(unclassified::<V>());
        }
        if branches.is_empty() {
            None
        } else {
            Some(Predicate::Or(branches))
        }
    }
}

/// Catch-all for a group: blank, or outside every recognized rule.
pub fn unclassified<V: Vocabulary>() -> Predicate {
    Predicate::Or(vec![
        Predicate::Blank(V::FIELD),
        Predicate::not(Predicate::Or(V::ALL.iter().map(|v| v.rule()).collect())),
    ])
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid date '{0}': expected DD/MM/YYYY or YYYY-MM-DD")]
pub struct DateBoundError(pub String);

/// Inclusive date bound, held in sortable `YYYYMMDD` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBound(String);

impl DateBound {
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl FromStr for DateBound {
    type Err = DateBoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(key) = sortable_date(s) {
            return chrono::NaiveDate::parse_from_str(s, "%d/%m/%Y")
                .map(|_| DateBound(key))
                .map_err(|_| DateBoundError(s.to_string()));
        }
        chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|d| DateBound(d.format("%Y%m%d").to_string()))
            .map_err(|_| DateBoundError(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateBound>,
    pub to: Option<DateBound>,
}

/// Criteria for organization search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationCriteria {
    pub text: Option<String>,
    pub category: GroupSelection<Category>,
    pub status: GroupSelection<Status>,
    pub nature: GroupSelection<Nature>,
    pub incorporated: DateRange,
}

/// Bearer column a director search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BearerColumn {
    #[default]
    Name,
    Country,
    Address,
}

impl BearerColumn {
    fn field(self) -> Field {
        match self {
            BearerColumn::Name => Field::BearerName,
            BearerColumn::Country => Field::BearerCountry,
            BearerColumn::Address => Field::BearerAddress,
        }
    }
}

impl FromStr for BearerColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(BearerColumn::Name),
            "country" => Ok(BearerColumn::Country),
            "address" => Ok(BearerColumn::Address),
            other => Err(format!(
                "unknown column '{}': expected name, country, or address",
                other
            )),
        }
    }
}

/// User text for a bearer search, split into fragment and negation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery {
    pub fragment: Option<String>,
    pub negated: bool,
}

impl TextQuery {
    /// Recognize a leading `not like ` (any case) and strip it.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim_start();
        let (rest, negated) = match trimmed.get(..NEGATION_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(NEGATION_PREFIX) => {
                (&trimmed[NEGATION_PREFIX.len()..], true)
            }
            _ => (trimmed, false),
        };
        let fragment = rest.trim();
        TextQuery {
            fragment: (!fragment.is_empty()).then(|| fragment.to_string()),
            negated,
        }
    }
}

/// Criteria for director search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerCriteria {
    pub column: BearerColumn,
    pub query: TextQuery,
}

impl BearerCriteria {
    pub fn new(column: BearerColumn, input: &str) -> Self {
        Self {
            column,
            query: TextQuery::parse(input),
        }
    }
}

// ============ Compilation ============

pub fn compile_organizations(criteria: &OrganizationCriteria) -> Predicate {
    let mut parts = Vec::new();

    if let Some(text) = criteria.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        parts.push(Predicate::Or(vec![
            Predicate::contains(Field::OrgName, text),
            Predicate::contains(Field::OrgFormerName, text),
        ]));
    }

    parts.extend(criteria.category.compile());
    parts.extend(criteria.status.compile());
    parts.extend(criteria.nature.compile());

    if let Some(from) = &criteria.incorporated.from {
        parts.push(Predicate::DateFrom(
            Field::OrgIncorporationDate,
            from.key().to_string(),
        ));
    }
    if let Some(to) = &criteria.incorporated.to {
        parts.push(Predicate::DateTo(
            Field::OrgIncorporationDate,
            to.key().to_string(),
        ));
    }

    Predicate::all(parts)
}

pub fn compile_bearers(criteria: &BearerCriteria) -> Predicate {
    let mut parts = vec![Predicate::equals(Field::BearerPosition, DIRECTOR_POSITION)];

    if let Some(fragment) = &criteria.query.fragment {
        let matched = Predicate::contains(criteria.column.field(), fragment);
        parts.push(if criteria.query.negated {
            Predicate::not(matched)
        } else {
            matched
        });
    }

    Predicate::all(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(name: &str) -> Organization {
        Organization {
            registration_number: Some("1".into()),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn with_status(status: Option<&str>) -> Organization {
        Organization {
            status_code: status.map(str::to_string),
            ..org("ACME")
        }
    }

    fn director(name: &str, country: Option<&str>) -> OfficeBearer {
        OfficeBearer {
            name: name.to_string(),
            country: country.map(str::to_string),
            position: Some("Director".into()),
            ..Default::default()
        }
    }

    const STATUS_SAMPLES: &[Option<&str>] = &[
        None,
        Some(""),
        Some("LIVE"),
        Some("ACTIVE"),
        Some("DEFUNCT"),
        Some("DISSOLVED"),
        Some("STRUCK OFF"),
        Some("LIVE COMPANY"),
    ];

    #[test]
    fn empty_criteria_is_unconstrained() {
        let p = compile_organizations(&OrganizationCriteria::default());
        assert!(p.is_unconstrained());
        assert!(p.matches(&org("ANYTHING")));
        assert_eq!(p.to_sql().sql, "1");

        let blank_text = OrganizationCriteria {
            text: Some("   ".into()),
            ..Default::default()
        };
        assert!(compile_organizations(&blank_text).is_unconstrained());
    }

    #[test]
    fn free_text_matches_name_or_former_name() {
        let p = compile_organizations(&OrganizationCriteria {
            text: Some("bank".into()),
            ..Default::default()
        });
        assert!(p.matches(&org("BLUE BANK LTD")));
        let renamed = Organization {
            former_name: Some("Old Bank Co".into()),
            ..org("NEWCO")
        };
        assert!(p.matches(&renamed));
        assert!(!p.matches(&org("ACME HOLDINGS")));
    }

    #[test]
    fn status_selection_is_union_of_rules() {
        let subsets: Vec<Vec<Status>> = vec![
            vec![Status::Live],
            vec![Status::Defunct],
            vec![Status::Live, Status::Dissolved],
            vec![Status::Live, Status::Defunct, Status::Dissolved],
        ];
        for subset in subsets {
            let p = compile_organizations(&OrganizationCriteria {
                status: GroupSelection::of(subset.clone()),
                ..Default::default()
            });
            for &sample in STATUS_SAMPLES {
                let record = with_status(sample);
                let expected = subset.iter().any(|s| s.rule().matches(&record));
                assert_eq!(p.matches(&record), expected, "{:?} on {:?}", subset, sample);
            }
        }
    }

    #[test]
    fn nothing_selected_imposes_no_constraint() {
        let selection: GroupSelection<Status> = GroupSelection::default();
        assert_eq!(selection.compile(), None);
    }

    #[test]
    fn unclassified_is_exact_complement() {
        let p = unclassified::<Status>();
        for &sample in STATUS_SAMPLES {
            let record = with_status(sample);
            let recognized = Status::ALL.iter().any(|s| s.rule().matches(&record));
            let blank = sample.map_or(true, |s| s.trim().is_empty());
            assert_eq!(p.matches(&record), blank || !recognized, "{:?}", sample);
        }
    }

    #[test]
    fn live_expands_to_active_or_live() {
        let p = GroupSelection::of(vec![Status::Live]).compile().unwrap();
        assert!(p.matches(&with_status(Some("LIVE"))));
        assert!(p.matches(&with_status(Some("ACTIVE"))));
        assert!(!p.matches(&with_status(Some("DEFUNCT"))));
        assert!(!p.matches(&with_status(None)));
    }

    #[test]
    fn groups_combine_with_and() {
        let p = compile_organizations(&OrganizationCriteria {
            text: Some("bank".into()),
            category: GroupSelection::of(vec![Category::Domestic]),
            ..Default::default()
        });
        let domestic = Organization {
            category_description: Some("DOMESTIC".into()),
            ..org("BLUE BANK")
        };
        let global = Organization {
            category_description: Some("GLOBAL BUSINESS".into()),
            ..org("RED BANK")
        };
        let domestic_other = Organization {
            category_description: Some("DOMESTIC".into()),
            ..org("ACME")
        };
        assert!(p.matches(&domestic));
        assert!(!p.matches(&global));
        assert!(!p.matches(&domestic_other));
    }

    #[test]
    fn date_bounds_are_inclusive_and_positional() {
        let stored = Organization {
            incorporation_date: Some("15/03/2020".into()),
            ..org("ACME")
        };
        let from: DateBound = "01/01/2020".parse().unwrap();
        let to: DateBound = "01/01/2020".parse().unwrap();

        let after = compile_organizations(&OrganizationCriteria {
            incorporated: DateRange {
                from: Some(from),
                to: None,
            },
            ..Default::default()
        });
        assert!(after.matches(&stored));

        let before = compile_organizations(&OrganizationCriteria {
            incorporated: DateRange {
                from: None,
                to: Some(to),
            },
            ..Default::default()
        });
        assert!(!before.matches(&stored));

        let same_day = compile_organizations(&OrganizationCriteria {
            incorporated: DateRange {
                from: Some("15/03/2020".parse().unwrap()),
                to: Some("2020-03-15".parse().unwrap()),
            },
            ..Default::default()
        });
        assert!(same_day.matches(&stored));
    }

    #[test]
    fn unparseable_dates_never_satisfy_a_bound() {
        let malformed = Organization {
            incorporation_date: Some("2020-03-15".into()),
            ..org("ACME")
        };
        let p = Predicate::DateFrom(Field::OrgIncorporationDate, "19000101".into());
        assert!(!p.matches(&malformed));
        assert!(!p.matches(&org("NO DATE")));
        assert_eq!(sortable_date("5/3/2020"), None);
        assert_eq!(sortable_date("15/03/2020").as_deref(), Some("20200315"));
    }

    #[test]
    fn date_bound_parsing() {
        assert_eq!(DateBound::from_str("01/02/2021").unwrap().key(), "20210201");
        assert_eq!(DateBound::from_str("2021-02-01").unwrap().key(), "20210201");
        assert!(DateBound::from_str("31/02/2021").is_err());
        assert!(DateBound::from_str("yesterday").is_err());
    }

    #[test]
    fn negation_prefix_parsing() {
        assert_eq!(
            TextQuery::parse("not like mauritius"),
            TextQuery {
                fragment: Some("mauritius".into()),
                negated: true
            }
        );
        assert_eq!(
            TextQuery::parse("mauritius"),
            TextQuery {
                fragment: Some("mauritius".into()),
                negated: false
            }
        );
        assert!(TextQuery::parse("NOT LIKE France").negated);
        assert_eq!(TextQuery::parse("not like ").fragment, None);
        assert!(!TextQuery::parse("nothing like it").negated);
    }

    #[test]
    fn bearer_search_is_restricted_to_directors() {
        let p = compile_bearers(&BearerCriteria::new(BearerColumn::Name, ""));
        assert!(p.matches(&director("JANE", None)));
        let secretary = OfficeBearer {
            position: Some("SECRETARY".into()),
            ..director("JOHN", None)
        };
        assert!(!p.matches(&secretary));
    }

    #[test]
    fn negated_country_search() {
        let p = compile_bearers(&BearerCriteria::new(
            BearerColumn::Country,
            "not like mauritius",
        ));
        assert!(!p.matches(&director("A", Some("MAURITIUS"))));
        assert!(p.matches(&director("B", Some("FRANCE"))));
        assert!(p.matches(&director("C", None)));

        let positive = compile_bearers(&BearerCriteria::new(BearerColumn::Country, "mauritius"));
        assert!(positive.matches(&director("A", Some("MAURITIUS"))));
        assert!(!positive.matches(&director("B", Some("FRANCE"))));
    }

    #[test]
    fn sql_binds_user_input() {
        let p = compile_organizations(&OrganizationCriteria {
            text: Some("x' OR 1=1 --".into()),
            status: GroupSelection::of(vec![Status::Live]).with_unclassified(true),
            incorporated: DateRange {
                from: Some("01/01/2020".parse().unwrap()),
                to: None,
            },
            ..Default::default()
        });
        let frag = p.to_sql();
        assert!(!frag.sql.contains("1=1"));
        assert_eq!(frag.sql.matches('?').count(), frag.params.len());
        assert!(frag.params.contains(&"%X' OR 1=1 --%".to_string()));
        assert!(frag.params.contains(&"20200101".to_string()));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        let p = Predicate::contains(Field::OrgName, "50%");
        assert!(!p.matches(&org("500 CLUB")));
        assert!(p.matches(&org("50% CLUB")));
    }

    #[test]
    fn indexed_text_matches_across_unicode_case() {
        let p = compile_organizations(&OrganizationCriteria {
            text: Some("société".into()),
            ..Default::default()
        });
        assert!(p.matches(&org("SOCIÉTÉ GÉNÉRALE")));
        assert_eq!(p.to_sql().params, vec!["%SOCIÉTÉ%", "%SOCIÉTÉ%"]);

        let p = compile_bearers(&BearerCriteria::new(BearerColumn::Country, "not like réunion"));
        assert!(!p.matches(&director("A", Some("RÉUNION"))));
        assert!(p.matches(&director("B", Some("FRANCE"))));
    }

    #[test]
    fn column_parsing() {
        assert_eq!("Country".parse::<BearerColumn>(), Ok(BearerColumn::Country));
        assert!("phone".parse::<BearerColumn>().is_err());
    }
}

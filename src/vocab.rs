//! Recognized values of the categorical filter groups.
//!
//! Shared by the filter compiler (which compiles each value to a
//! [`Predicate`] and the "unclassified" bucket to the complement of all of
//! them) and by the normalizer and `stats` (which classify stored values
//! with the same rules).

use crate::filter::{Field, Fields, Predicate};

/// A closed set of recognized values for one organization field.
pub trait Vocabulary: Copy + Eq + std::fmt::Debug + 'static {
    /// Field the group filters on.
    const FIELD: Field;
    /// Every recognized value, in display order.
    const ALL: &'static [Self];
    /// Group name used in messages.
    const GROUP: &'static str;

    fn label(self) -> &'static str;

    /// Match rule for this value.
    fn rule(self) -> Predicate;

    /// Parse a user-supplied label. Case, `-` and `_` are ignored.
    fn parse(input: &str) -> Option<Self> {
        let wanted = canonical_label(input);
        Self::ALL
            .iter()
            .copied()
            .find(|v| canonical_label(v.label()) == wanted)
    }

    /// First recognized value whose rule matches `value`.
    fn classify(value: Option<&str>) -> Option<Self> {
        let sample = SingleField {
            field: Self::FIELD,
            value,
        };
        Self::ALL.iter().copied().find(|v| v.rule().matches(&sample))
    }
}

fn canonical_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

struct SingleField<'a> {
    field: Field,
    value: Option<&'a str>,
}

impl Fields for SingleField<'_> {
    fn field(&self, field: Field) -> Option<&str> {
        if field == self.field {
            self.value
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Domestic,
    GlobalBusiness,
    Authorised,
    Foreign,
}

impl Vocabulary for Category {
    const FIELD: Field = Field::OrgCategory;
    const ALL: &'static [Self] = &[
        Category::Domestic,
        Category::GlobalBusiness,
        Category::Authorised,
        Category::Foreign,
    ];
    const GROUP: &'static str = "category";

    fn label(self) -> &'static str {
        match self {
            Category::Domestic => "Domestic",
            Category::GlobalBusiness => "Global Business",
            Category::Authorised => "Authorised",
            Category::Foreign => "Foreign",
        }
    }

    fn rule(self) -> Predicate {
        match self {
            Category::Domestic => Predicate::equals(Self::FIELD, "DOMESTIC"),
            Category::GlobalBusiness => Predicate::contains(Self::FIELD, "GLOBAL BUSINESS"),
            Category::Authorised => Predicate::contains(Self::FIELD, "AUTHORISED"),
            Category::Foreign => Predicate::contains(Self::FIELD, "FOREIGN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Live,
    Defunct,
    Dissolved,
}

impl Vocabulary for Status {
    const FIELD: Field = Field::OrgStatus;
    const ALL: &'static [Self] = &[Status::Live, Status::Defunct, Status::Dissolved];
    const GROUP: &'static str = "status";

    fn label(self) -> &'static str {
        match self {
            Status::Live => "Live",
            Status::Defunct => "Defunct",
            Status::Dissolved => "Dissolved",
        }
    }

    fn rule(self) -> Predicate {
        match self {
            // Sources spell a live company either way.
            Status::Live => Predicate::Or(vec![
                Predicate::contains(Self::FIELD, "ACTIVE"),
                Predicate::equals(Self::FIELD, "LIVE"),
            ]),
            Status::Defunct => Predicate::equals(Self::FIELD, "DEFUNCT"),
            Status::Dissolved => Predicate::equals(Self::FIELD, "DISSOLVED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nature {
    Private,
    Public,
}

impl Vocabulary for Nature {
    const FIELD: Field = Field::OrgNature;
    const ALL: &'static [Self] = &[Nature::Private, Nature::Public];
    const GROUP: &'static str = "nature";

    fn label(self) -> &'static str {
        match self {
            Nature::Private => "Private",
            Nature::Public => "Public",
        }
    }

    fn rule(self) -> Predicate {
        match self {
            Nature::Private => Predicate::contains(Self::FIELD, "PRIVATE"),
            Nature::Public => Predicate::contains(Self::FIELD, "PUBLIC"),
        }
    }
}

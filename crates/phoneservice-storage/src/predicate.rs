//! Backend-neutral filter expression over [`Phone`] entities.
//!
//! A [`Predicate`] is a conjunction of [`Clause`]s. Each store translates it
//! to its own query language; [`Predicate::matches`] is the reference
//! evaluation used by the in-memory backends.
//!
//! Comparisons follow SQL null semantics: a clause against an absent value is
//! false, except `Specified(false)`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

use phoneservice_core::{BigDecimal, Phone, PhoneField};

/// A typed value a clause compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Id(i64),
    Text(String),
    Decimal(BigDecimal),
}

impl FieldValue {
    /// Reads `field` from `phone`, `None` when the attribute is absent.
    pub fn of(phone: &Phone, field: PhoneField) -> Option<FieldValue> {
        match field {
            PhoneField::Id => phone.id.map(FieldValue::Id),
            PhoneField::Name => phone.name.clone().map(FieldValue::Text),
            PhoneField::Brand => phone.brand.clone().map(FieldValue::Text),
            PhoneField::Price => phone.price.clone().map(FieldValue::Decimal),
        }
    }

    /// Orders two values of the same kind; values of different kinds are incomparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Text(s) => f.write_str(s),
            Self::Decimal(d) => write!(f, "{d}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Id(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BigDecimal> for FieldValue {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}

/// A single test applied to one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals(FieldValue),
    NotEquals(FieldValue),
    /// Matches when the value equals any member; an empty list matches nothing.
    In(Vec<FieldValue>),
    /// Case-sensitive substring test on text attributes.
    Contains(String),
    Range {
        lower: Bound<FieldValue>,
        upper: Bound<FieldValue>,
    },
    /// `true` matches present values, `false` matches absent ones.
    Specified(bool),
}

impl Condition {
    pub fn greater_than(value: impl Into<FieldValue>) -> Self {
        Self::Range {
            lower: Bound::Excluded(value.into()),
            upper: Bound::Unbounded,
        }
    }

    pub fn greater_than_or_equal(value: impl Into<FieldValue>) -> Self {
        Self::Range {
            lower: Bound::Included(value.into()),
            upper: Bound::Unbounded,
        }
    }

    pub fn less_than(value: impl Into<FieldValue>) -> Self {
        Self::Range {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(value.into()),
        }
    }

    pub fn less_than_or_equal(value: impl Into<FieldValue>) -> Self {
        Self::Range {
            lower: Bound::Unbounded,
            upper: Bound::Included(value.into()),
        }
    }

    /// Evaluates the condition against an attribute value.
    pub fn test(&self, value: Option<&FieldValue>) -> bool {
        let Some(value) = value else {
            return matches!(self, Self::Specified(false));
        };
        match self {
            Self::Equals(expected) => value.compare(expected) == Some(Ordering::Equal),
            Self::NotEquals(expected) => {
                matches!(value.compare(expected), Some(Ordering::Less | Ordering::Greater))
            }
            Self::In(values) => values
                .iter()
                .any(|v| value.compare(v) == Some(Ordering::Equal)),
            Self::Contains(needle) => value.as_text().is_some_and(|s| s.contains(needle.as_str())),
            Self::Range { lower, upper } => {
                let lower_ok = match lower {
                    Bound::Unbounded => true,
                    Bound::Included(b) => {
                        matches!(value.compare(b), Some(Ordering::Greater | Ordering::Equal))
                    }
                    Bound::Excluded(b) => value.compare(b) == Some(Ordering::Greater),
                };
                let upper_ok = match upper {
                    Bound::Unbounded => true,
                    Bound::Included(b) => {
                        matches!(value.compare(b), Some(Ordering::Less | Ordering::Equal))
                    }
                    Bound::Excluded(b) => value.compare(b) == Some(Ordering::Less),
                };
                lower_ok && upper_ok
            }
            Self::Specified(specified) => *specified,
        }
    }
}

/// A condition bound to a phone attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: PhoneField,
    pub condition: Condition,
}

impl Clause {
    pub fn new(field: PhoneField, condition: Condition) -> Self {
        Self { field, condition }
    }

    pub fn matches(&self, phone: &Phone) -> bool {
        self.condition
            .test(FieldValue::of(phone, self.field).as_ref())
    }
}

/// Conjunction of clauses. The empty predicate matches every phone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// The predicate that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, field: PhoneField, condition: Condition) -> Self {
        self.clauses.push(Clause::new(field, condition));
        self
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, phone: &Phone) -> bool {
        self.clauses.iter().all(|c| c.matches(phone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Phone {
        Phone::new("AAAAAAAAAA", "Acme", 10).with_id(7)
    }

    #[test]
    fn empty_predicate_matches_everything() {
        assert!(Predicate::all().matches(&sample()));
        assert!(Predicate::all().matches(&Phone::default()));
    }

    #[test]
    fn equals_and_not_equals() {
        let phone = sample();
        assert!(
            Predicate::all()
                .and(PhoneField::Name, Condition::Equals("AAAAAAAAAA".into()))
                .matches(&phone)
        );
        assert!(
            !Predicate::all()
                .and(PhoneField::Name, Condition::Equals("BBBBBBBBBB".into()))
                .matches(&phone)
        );
        assert!(
            Predicate::all()
                .and(PhoneField::Brand, Condition::NotEquals("Other".into()))
                .matches(&phone)
        );
    }

    #[test]
    fn decimal_equality_ignores_scale() {
        let phone = sample();
        let ten: BigDecimal = "10.00".parse().unwrap();
        assert!(
            Predicate::all()
                .and(PhoneField::Price, Condition::Equals(ten.into()))
                .matches(&phone)
        );
    }

    #[test]
    fn in_list_and_empty_in_list() {
        let phone = sample();
        let in_list = Condition::In(vec![FieldValue::Id(1), FieldValue::Id(7)]);
        assert!(Clause::new(PhoneField::Id, in_list).matches(&phone));
        assert!(!Clause::new(PhoneField::Id, Condition::In(vec![])).matches(&phone));
    }

    #[test]
    fn contains_is_case_sensitive() {
        let phone = sample();
        assert!(Clause::new(PhoneField::Brand, Condition::Contains("cm".into())).matches(&phone));
        assert!(!Clause::new(PhoneField::Brand, Condition::Contains("ACM".into())).matches(&phone));
    }

    #[test]
    fn range_bounds() {
        let phone = sample();
        let price = |n: i64| FieldValue::Decimal(BigDecimal::from(n));
        assert!(
            Clause::new(PhoneField::Price, Condition::greater_than_or_equal(price(10)))
                .matches(&phone)
        );
        assert!(
            !Clause::new(PhoneField::Price, Condition::greater_than(price(10)))
                .matches(&phone)
        );
        assert!(
            Clause::new(PhoneField::Price, Condition::less_than_or_equal(price(10)))
                .matches(&phone)
        );
        assert!(!Clause::new(PhoneField::Price, Condition::less_than(price(10))).matches(&phone));
        assert!(Clause::new(PhoneField::Price, Condition::less_than(price(11))).matches(&phone));
    }

    #[test]
    fn absent_values_only_match_unspecified() {
        let phone = Phone::default().with_id(1);
        assert!(Clause::new(PhoneField::Name, Condition::Specified(false)).matches(&phone));
        assert!(!Clause::new(PhoneField::Name, Condition::Specified(true)).matches(&phone));
        assert!(!Clause::new(PhoneField::Name, Condition::NotEquals("x".into())).matches(&phone));
        assert!(
            !Clause::new(PhoneField::Price, Condition::less_than(BigDecimal::from(5)))
                .matches(&phone)
        );
    }

    #[test]
    fn clauses_are_conjunctive() {
        let phone = sample();
        let predicate = Predicate::all()
            .and(PhoneField::Name, Condition::Specified(true))
            .and(PhoneField::Brand, Condition::Equals("Nope".into()));
        assert!(!predicate.matches(&phone));
        assert_eq!(predicate.clauses().len(), 2);
    }
}

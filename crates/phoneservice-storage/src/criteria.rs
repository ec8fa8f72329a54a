//! Per-attribute filter criteria and their translation into a [`Predicate`].
//!
//! Every operator set on a filter contributes one clause, and all clauses are
//! ANDed. Unset operators and unset filters contribute nothing.

use phoneservice_core::{BigDecimal, PhoneField};

use crate::predicate::{Clause, Condition, FieldValue, Predicate};

/// Operators available on every attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter<T> {
    pub equals: Option<T>,
    pub not_equals: Option<T>,
    pub in_list: Option<Vec<T>>,
    pub specified: Option<bool>,
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self {
            equals: None,
            not_equals: None,
            in_list: None,
            specified: None,
        }
    }
}

impl<T: Clone + Into<FieldValue>> Filter<T> {
    fn push_clauses(&self, field: PhoneField, out: &mut Predicate) {
        if let Some(v) = &self.equals {
            out.push(Clause::new(field, Condition::Equals(v.clone().into())));
        }
        if let Some(v) = &self.not_equals {
            out.push(Clause::new(field, Condition::NotEquals(v.clone().into())));
        }
        if let Some(values) = &self.in_list {
            let values = values.iter().cloned().map(Into::into).collect();
            out.push(Clause::new(field, Condition::In(values)));
        }
        if let Some(specified) = self.specified {
            out.push(Clause::new(field, Condition::Specified(specified)));
        }
    }

    fn is_empty(&self) -> bool {
        self.equals.is_none()
            && self.not_equals.is_none()
            && self.in_list.is_none()
            && self.specified.is_none()
    }
}

/// Filter over a text attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringFilter {
    pub filter: Filter<String>,
    /// Case-sensitive substring.
    pub contains: Option<String>,
}

impl StringFilter {
    #[must_use]
    pub fn equals(value: impl Into<String>) -> Self {
        let mut f = Self::default();
        f.filter.equals = Some(value.into());
        f
    }

    #[must_use]
    pub fn contains(value: impl Into<String>) -> Self {
        Self {
            contains: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.contains.is_none()
    }

    fn push_clauses(&self, field: PhoneField, out: &mut Predicate) {
        self.filter.push_clauses(field, out);
        if let Some(needle) = &self.contains {
            out.push(Clause::new(field, Condition::Contains(needle.clone())));
        }
    }
}

/// Filter over an ordered attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter<T> {
    pub filter: Filter<T>,
    pub greater_than: Option<T>,
    pub greater_than_or_equal: Option<T>,
    pub less_than: Option<T>,
    pub less_than_or_equal: Option<T>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            greater_than: None,
            greater_than_or_equal: None,
            less_than: None,
            less_than_or_equal: None,
        }
    }
}

impl<T: Clone + Into<FieldValue>> RangeFilter<T> {
    #[must_use]
    pub fn equals(value: T) -> Self {
        let mut f = Self::default();
        f.filter.equals = Some(value);
        f
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
            && self.greater_than.is_none()
            && self.greater_than_or_equal.is_none()
            && self.less_than.is_none()
            && self.less_than_or_equal.is_none()
    }

    fn push_clauses(&self, field: PhoneField, out: &mut Predicate) {
        self.filter.push_clauses(field, out);
        if let Some(v) = &self.greater_than {
            out.push(Clause::new(field, Condition::greater_than(v.clone())));
        }
        if let Some(v) = &self.greater_than_or_equal {
            out.push(Clause::new(field, Condition::greater_than_or_equal(v.clone())));
        }
        if let Some(v) = &self.less_than {
            out.push(Clause::new(field, Condition::less_than(v.clone())));
        }
        if let Some(v) = &self.less_than_or_equal {
            out.push(Clause::new(field, Condition::less_than_or_equal(v.clone())));
        }
    }
}

/// Optional filters on each phone attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneCriteria {
    pub id: Option<RangeFilter<i64>>,
    pub name: Option<StringFilter>,
    pub brand: Option<StringFilter>,
    pub price: Option<RangeFilter<BigDecimal>>,
}

impl PhoneCriteria {
    pub fn is_empty(&self) -> bool {
        self.id.as_ref().is_none_or(RangeFilter::is_empty)
            && self.name.as_ref().is_none_or(StringFilter::is_empty)
            && self.brand.as_ref().is_none_or(StringFilter::is_empty)
            && self.price.as_ref().is_none_or(RangeFilter::is_empty)
    }

    /// Builds the conjunction of every operator set on every filter.
    pub fn to_predicate(&self) -> Predicate {
        let mut predicate = Predicate::all();
        if let Some(f) = &self.id {
            f.push_clauses(PhoneField::Id, &mut predicate);
        }
        if let Some(f) = &self.name {
            f.push_clauses(PhoneField::Name, &mut predicate);
        }
        if let Some(f) = &self.brand {
            f.push_clauses(PhoneField::Brand, &mut predicate);
        }
        if let Some(f) = &self.price {
            f.push_clauses(PhoneField::Price, &mut predicate);
        }
        predicate
    }
}

/// Translates optional criteria; absent criteria select everything.
pub fn create_predicate(criteria: Option<&PhoneCriteria>) -> Predicate {
    criteria.map(PhoneCriteria::to_predicate).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use phoneservice_core::Phone;

    use super::*;

    #[test]
    fn absent_criteria_select_everything() {
        assert!(create_predicate(None).is_empty());
        assert!(create_predicate(Some(&PhoneCriteria::default())).is_empty());
        assert!(PhoneCriteria::default().is_empty());
    }

    #[test]
    fn each_operator_becomes_a_clause() {
        let criteria = PhoneCriteria {
            name: Some(StringFilter {
                filter: Filter {
                    equals: Some("AAAAAAAAAA".into()),
                    specified: Some(true),
                    ..Filter::default()
                },
                contains: Some("AAA".into()),
            }),
            price: Some(RangeFilter {
                greater_than: Some(BigDecimal::from(0)),
                less_than_or_equal: Some(BigDecimal::from(1)),
                ..RangeFilter::default()
            }),
            ..PhoneCriteria::default()
        };
        let predicate = criteria.to_predicate();
        assert_eq!(predicate.clauses().len(), 5);

        let matching = Phone::new("AAAAAAAAAA", "AAAAAAAAAA", 1).with_id(1);
        let other = Phone::new("BBBBBBBBBB", "BBBBBBBBBB", 2).with_id(2);
        assert!(predicate.matches(&matching));
        assert!(!predicate.matches(&other));
    }

    #[test]
    fn id_in_list() {
        let criteria = PhoneCriteria {
            id: Some(RangeFilter {
                filter: Filter {
                    in_list: Some(vec![1, 3]),
                    ..Filter::default()
                },
                ..RangeFilter::default()
            }),
            ..PhoneCriteria::default()
        };
        let predicate = create_predicate(Some(&criteria));
        assert!(predicate.matches(&Phone::default().with_id(3)));
        assert!(!predicate.matches(&Phone::default().with_id(2)));
    }

    #[test]
    fn brand_contains_and_not_equals() {
        let criteria = PhoneCriteria {
            brand: Some(StringFilter {
                filter: Filter {
                    not_equals: Some("Acme Pro".into()),
                    ..Filter::default()
                },
                contains: Some("Acme".into()),
            }),
            ..PhoneCriteria::default()
        };
        let predicate = criteria.to_predicate();
        assert!(predicate.matches(&Phone::default().with_brand("Acme")));
        assert!(!predicate.matches(&Phone::default().with_brand("Acme Pro")));
        assert!(!predicate.matches(&Phone::default().with_brand("Other")));
    }

    #[test]
    fn equals_shortcuts() {
        assert_eq!(StringFilter::equals("x").filter.equals.as_deref(), Some("x"));
        assert_eq!(RangeFilter::equals(5_i64).filter.equals, Some(5));
        assert!(!RangeFilter::equals(5_i64).is_empty());
        assert!(!StringFilter::contains("y").is_empty());
    }
}

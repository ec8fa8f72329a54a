//! Translation of a [`Predicate`] and sort order into SQL fragments.
//!
//! User values never reach the SQL text: every value is collected into
//! [`SqlArg`]s and bound positionally.

use std::ops::Bound;

use phoneservice_core::{BigDecimal, PhoneField};
use phoneservice_storage::{Condition, Direction, FieldValue, Order, Predicate};
use sqlx_core::query_as::QueryAs;
use sqlx_core::query_scalar::QueryScalar;
use sqlx_postgres::{PgArguments, Postgres};

/// A bind parameter with its SQL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    BigInt(i64),
    Text(String),
    Numeric(BigDecimal),
    BigIntArray(Vec<i64>),
    TextArray(Vec<String>),
    NumericArray(Vec<BigDecimal>),
}

impl From<&FieldValue> for SqlArg {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Id(id) => SqlArg::BigInt(*id),
            FieldValue::Text(s) => SqlArg::Text(s.clone()),
            FieldValue::Decimal(d) => SqlArg::Numeric(d.clone()),
        }
    }
}

/// Builds the array argument for `= ANY(..)`, typed after the column.
fn array_arg(field: PhoneField, values: &[FieldValue]) -> SqlArg {
    match field {
        PhoneField::Id => SqlArg::BigIntArray(
            values
                .iter()
                .filter_map(|v| match v {
                    FieldValue::Id(id) => Some(*id),
                    _ => None,
                })
                .collect(),
        ),
        PhoneField::Name | PhoneField::Brand => SqlArg::TextArray(
            values
                .iter()
                .filter_map(|v| v.as_text().map(str::to_string))
                .collect(),
        ),
        PhoneField::Price => SqlArg::NumericArray(
            values
                .iter()
                .filter_map(|v| match v {
                    FieldValue::Decimal(d) => Some(d.clone()),
                    _ => None,
                })
                .collect(),
        ),
    }
}

/// A `WHERE` clause and its arguments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WhereClause {
    conditions: Vec<String>,
    args: Vec<SqlArg>,
}

impl WhereClause {
    /// Translates every clause of `predicate`.
    pub fn from_predicate(predicate: &Predicate) -> Self {
        let mut clause = Self::default();
        for c in predicate.clauses() {
            let sql = clause.condition_sql(c.field, &c.condition);
            clause.conditions.push(sql);
        }
        clause
    }

    fn push_arg(&mut self, arg: SqlArg) -> usize {
        self.args.push(arg);
        self.args.len()
    }

    fn condition_sql(&mut self, field: PhoneField, condition: &Condition) -> String {
        let col = field.column();
        match condition {
            Condition::Equals(v) => format!("{col} = ${}", self.push_arg(v.into())),
            Condition::NotEquals(v) => format!("{col} <> ${}", self.push_arg(v.into())),
            Condition::In(values) if values.is_empty() => "FALSE".to_string(),
            Condition::In(values) => {
                format!("{col} = ANY(${})", self.push_arg(array_arg(field, values)))
            }
            Condition::Contains(needle) => {
                let p = self.push_arg(SqlArg::Text(needle.clone()));
                format!("strpos({col}, ${p}) > 0")
            }
            Condition::Range { lower, upper } => {
                let mut parts = Vec::new();
                match lower {
                    Bound::Included(v) => {
                        parts.push(format!("{col} >= ${}", self.push_arg(v.into())));
                    }
                    Bound::Excluded(v) => {
                        parts.push(format!("{col} > ${}", self.push_arg(v.into())));
                    }
                    Bound::Unbounded => {}
                }
                match upper {
                    Bound::Included(v) => {
                        parts.push(format!("{col} <= ${}", self.push_arg(v.into())));
                    }
                    Bound::Excluded(v) => {
                        parts.push(format!("{col} < ${}", self.push_arg(v.into())));
                    }
                    Bound::Unbounded => {}
                }
                if parts.is_empty() {
                    // An unbounded range still excludes absent values.
                    format!("{col} IS NOT NULL")
                } else {
                    parts.join(" AND ")
                }
            }
            Condition::Specified(true) => format!("{col} IS NOT NULL"),
            Condition::Specified(false) => format!("{col} IS NULL"),
        }
    }

    /// The ` WHERE ...` suffix, empty when there are no conditions.
    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn args(&self) -> &[SqlArg] {
        &self.args
    }

    /// Placeholder number the next appended argument will get.
    pub fn next_placeholder(&self) -> usize {
        self.args.len() + 1
    }
}

/// The ` ORDER BY ...` suffix. Ties are always broken by ascending id.
///
/// Text columns sort with the `C` collation so the order matches a plain
/// code-point comparison.
pub fn order_by_sql(orders: &[Order]) -> String {
    let mut keys: Vec<String> = orders
        .iter()
        .map(|order| {
            let col = order.field.column();
            let nulls = match order.direction {
                Direction::Asc => "NULLS LAST",
                Direction::Desc => "NULLS FIRST",
            };
            let collate = if order.field.is_text() {
                " COLLATE \"C\""
            } else {
                ""
            };
            format!("{col}{collate} {} {nulls}", order.direction.as_sql())
        })
        .collect();
    keys.push("id ASC".to_string());
    format!(" ORDER BY {}", keys.join(", "))
}

/// Helper trait to bind all args to a query.
pub(crate) trait BindAllArgs<'q> {
    fn bind_all_args(self, args: &'q [SqlArg]) -> Self;
}

impl<'q, O> BindAllArgs<'q> for QueryAs<'q, Postgres, O, PgArguments> {
    fn bind_all_args(mut self, args: &'q [SqlArg]) -> Self {
        for arg in args {
            self = match arg {
                SqlArg::BigInt(i) => self.bind(*i),
                SqlArg::Text(s) => self.bind(s.as_str()),
                SqlArg::Numeric(d) => self.bind(d.clone()),
                SqlArg::BigIntArray(v) => self.bind(v.clone()),
                SqlArg::TextArray(v) => self.bind(v.clone()),
                SqlArg::NumericArray(v) => self.bind(v.clone()),
            };
        }
        self
    }
}

impl<'q> BindAllArgs<'q> for QueryScalar<'q, Postgres, i64, PgArguments> {
    fn bind_all_args(mut self, args: &'q [SqlArg]) -> Self {
        for arg in args {
            self = match arg {
                SqlArg::BigInt(i) => self.bind(*i),
                SqlArg::Text(s) => self.bind(s.as_str()),
                SqlArg::Numeric(d) => self.bind(d.clone()),
                SqlArg::BigIntArray(v) => self.bind(v.clone()),
                SqlArg::TextArray(v) => self.bind(v.clone()),
                SqlArg::NumericArray(v) => self.bind(v.clone()),
            };
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use phoneservice_storage::{PhoneCriteria, RangeFilter, StringFilter};

    use super::*;

    #[test]
    fn empty_predicate_has_no_where() {
        let clause = WhereClause::from_predicate(&Predicate::all());
        assert_eq!(clause.sql(), "");
        assert!(clause.args().is_empty());
        assert_eq!(clause.next_placeholder(), 1);
    }

    #[test]
    fn values_are_bound_not_inlined() {
        let predicate = Predicate::all()
            .and(PhoneField::Name, Condition::Equals("x'; DROP TABLE phone; --".into()))
            .and(PhoneField::Brand, Condition::NotEquals("Acme".into()));
        let clause = WhereClause::from_predicate(&predicate);
        assert_eq!(clause.sql(), " WHERE name = $1 AND brand <> $2");
        assert_eq!(
            clause.args(),
            &[
                SqlArg::Text("x'; DROP TABLE phone; --".into()),
                SqlArg::Text("Acme".into())
            ]
        );
    }

    #[test]
    fn in_list_uses_any_with_typed_array() {
        let predicate = Predicate::all()
            .and(PhoneField::Id, Condition::In(vec![FieldValue::Id(1), FieldValue::Id(2)]))
            .and(PhoneField::Price, Condition::In(vec![]));
        let clause = WhereClause::from_predicate(&predicate);
        assert_eq!(clause.sql(), " WHERE id = ANY($1) AND FALSE");
        assert_eq!(clause.args(), &[SqlArg::BigIntArray(vec![1, 2])]);
    }

    #[test]
    fn contains_uses_strpos() {
        let predicate = Predicate::all().and(PhoneField::Brand, Condition::Contains("cm".into()));
        let clause = WhereClause::from_predicate(&predicate);
        assert_eq!(clause.sql(), " WHERE strpos(brand, $1) > 0");
    }

    #[test]
    fn ranges_and_specified() {
        let criteria = PhoneCriteria {
            price: Some(RangeFilter {
                greater_than_or_equal: Some(BigDecimal::from(1)),
                less_than: Some(BigDecimal::from(5)),
                ..RangeFilter::default()
            }),
            name: Some(StringFilter {
                filter: phoneservice_storage::Filter {
                    specified: Some(false),
                    ..Default::default()
                },
                contains: None,
            }),
            ..PhoneCriteria::default()
        };
        let clause = WhereClause::from_predicate(&criteria.to_predicate());
        assert_eq!(
            clause.sql(),
            " WHERE name IS NULL AND price >= $1 AND price < $2"
        );
        assert_eq!(clause.next_placeholder(), 3);
    }

    #[test]
    fn unbounded_range_requires_presence() {
        let predicate = Predicate::all().and(
            PhoneField::Price,
            Condition::Range {
                lower: Bound::Unbounded,
                upper: Bound::Unbounded,
            },
        );
        assert_eq!(
            WhereClause::from_predicate(&predicate).sql(),
            " WHERE price IS NOT NULL"
        );
    }

    #[test]
    fn order_by_breaks_ties_by_id() {
        assert_eq!(order_by_sql(&[]), " ORDER BY id ASC");
        let orders = [
            Order::asc(PhoneField::Name),
            Order {
                field: PhoneField::Price,
                direction: Direction::Desc,
            },
        ];
        assert_eq!(
            order_by_sql(&orders),
            " ORDER BY name COLLATE \"C\" ASC NULLS LAST, price DESC NULLS FIRST, id ASC"
        );
    }
}

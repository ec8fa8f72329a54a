//! Query-string parsing for the phone endpoints.
//!
//! Criteria use `<field>.<operator>=<value>`. Paging uses `page`, `size` and
//! a repeatable `sort=<field>[,<field>...][,asc|desc]`. Parameters that do not
//! name a known field and operator are ignored; a known one with a value that
//! does not parse is rejected.

use std::str::FromStr;

use phoneservice_api::ApiError;
use phoneservice_core::decimal::parse_decimal;
use phoneservice_core::{BigDecimal, PhoneField};
use phoneservice_storage::{
    Direction, Order, PageRequest, PhoneCriteria, RangeFilter, StringFilter,
};
use thiserror::Error;

use crate::config::PagingConfig;

/// Raw `key=value` pairs in request order; keys may repeat.
pub type QueryPairs = Vec<(String, String)>;

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Invalid value '{value}' for parameter '{param}': {reason}")]
    InvalidValue {
        param: String,
        value: String,
        reason: String,
    },
    #[error("Unknown sort property '{0}'")]
    UnknownSortField(String),
    #[error("Required parameter '{0}' is not present")]
    Missing(&'static str),
}

impl ParamError {
    fn invalid(param: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ParamError> for ApiError {
    fn from(err: ParamError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    NotEquals,
    In,
    Specified,
    Contains,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "in" => Operator::In,
            "specified" => Operator::Specified,
            "contains" => Operator::Contains,
            "greaterThan" => Operator::GreaterThan,
            "greaterThanOrEqual" => Operator::GreaterThanOrEqual,
            "lessThan" => Operator::LessThan,
            "lessThanOrEqual" => Operator::LessThanOrEqual,
            _ => return Err(()),
        })
    }
}

fn parse_bool(param: &str, raw: &str) -> Result<bool, ParamError> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ParamError::invalid(param, raw, "expected true or false"))
    }
}

fn parse_id(param: &str, raw: &str) -> Result<i64, ParamError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| ParamError::invalid(param, raw, e.to_string()))
}

fn parse_price(param: &str, raw: &str) -> Result<BigDecimal, ParamError> {
    parse_decimal(raw).map_err(|e| ParamError::invalid(param, raw, e.to_string()))
}

fn apply_range<T>(
    filter: &mut RangeFilter<T>,
    op: Operator,
    param: &str,
    raw: &str,
    parse: fn(&str, &str) -> Result<T, ParamError>,
) -> Result<(), ParamError> {
    match op {
        Operator::Equals => filter.filter.equals = Some(parse(param, raw)?),
        Operator::NotEquals => filter.filter.not_equals = Some(parse(param, raw)?),
        Operator::In => {
            let values = raw
                .split(',')
                .map(|v| parse(param, v))
                .collect::<Result<Vec<_>, _>>()?;
            filter.filter.in_list.get_or_insert_with(Vec::new).extend(values);
        }
        Operator::Specified => filter.filter.specified = Some(parse_bool(param, raw)?),
        Operator::GreaterThan => filter.greater_than = Some(parse(param, raw)?),
        Operator::GreaterThanOrEqual => filter.greater_than_or_equal = Some(parse(param, raw)?),
        Operator::LessThan => filter.less_than = Some(parse(param, raw)?),
        Operator::LessThanOrEqual => filter.less_than_or_equal = Some(parse(param, raw)?),
        // not defined on ordered attributes
        Operator::Contains => {}
    }
    Ok(())
}

fn apply_text(
    filter: &mut StringFilter,
    op: Operator,
    param: &str,
    raw: &str,
) -> Result<(), ParamError> {
    match op {
        Operator::Equals => filter.filter.equals = Some(raw.to_string()),
        Operator::NotEquals => filter.filter.not_equals = Some(raw.to_string()),
        Operator::In => filter
            .filter
            .in_list
            .get_or_insert_with(Vec::new)
            .extend(raw.split(',').map(str::to_string)),
        Operator::Specified => filter.filter.specified = Some(parse_bool(param, raw)?),
        Operator::Contains => filter.contains = Some(raw.to_string()),
        Operator::GreaterThan
        | Operator::GreaterThanOrEqual
        | Operator::LessThan
        | Operator::LessThanOrEqual => {}
    }
    Ok(())
}

/// Collects every `<field>.<operator>` parameter into criteria.
pub fn parse_criteria(pairs: &[(String, String)]) -> Result<PhoneCriteria, ParamError> {
    let mut criteria = PhoneCriteria::default();
    for (key, raw) in pairs {
        let Some((field, op)) = key.split_once('.') else {
            continue;
        };
        let (Ok(field), Ok(op)) = (field.parse::<PhoneField>(), op.parse::<Operator>()) else {
            continue;
        };
        match field {
            PhoneField::Id => {
                apply_range(criteria.id.get_or_insert_default(), op, key, raw, parse_id)?
            }
            PhoneField::Price => {
                apply_range(criteria.price.get_or_insert_default(), op, key, raw, parse_price)?
            }
            PhoneField::Name => apply_text(criteria.name.get_or_insert_default(), op, key, raw)?,
            PhoneField::Brand => apply_text(criteria.brand.get_or_insert_default(), op, key, raw)?,
        }
    }
    Ok(criteria)
}

fn parse_sort(raw: &str, out: &mut Vec<Order>) -> Result<(), ParamError> {
    let mut parts: Vec<&str> = raw.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    let direction = match parts.last() {
        Some(last) if parts.len() > 1 => match last.parse::<Direction>() {
            Ok(direction) => {
                parts.pop();
                direction
            }
            Err(_) => Direction::Asc,
        },
        _ => Direction::Asc,
    };
    for part in parts {
        let field = part
            .parse::<PhoneField>()
            .map_err(|_| ParamError::UnknownSortField(part.to_string()))?;
        out.push(Order { field, direction });
    }
    Ok(())
}

/// Builds a page request from `page`, `size` and `sort`.
///
/// `size` defaults to the configured default and is capped at the configured
/// maximum.
pub fn parse_page(
    pairs: &[(String, String)],
    paging: &PagingConfig,
) -> Result<PageRequest, ParamError> {
    let mut request = PageRequest::new(0, paging.default_size);
    for (key, raw) in pairs {
        match key.as_str() {
            "page" => {
                request.page = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| ParamError::invalid(key, raw, e.to_string()))?;
            }
            "size" => {
                let size = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| ParamError::invalid(key, raw, e.to_string()))?;
                if size == 0 {
                    return Err(ParamError::invalid(key, raw, "page size must be at least 1"));
                }
                request.size = size.min(paging.max_size);
            }
            "sort" => parse_sort(raw, &mut request.sort)?,
            _ => {}
        }
    }
    Ok(request)
}

/// Returns the first value of a required parameter.
pub fn required<'a>(
    pairs: &'a [(String, String)],
    name: &'static str,
) -> Result<&'a str, ParamError> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .ok_or(ParamError::Missing(name))
}

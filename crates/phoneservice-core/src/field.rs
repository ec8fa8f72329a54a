use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Filterable and sortable attributes of a [`crate::Phone`].
///
/// Stands in for a generated metamodel: every layer that needs to refer to a
/// phone attribute by name (criteria parsing, sorting, SQL generation, the
/// search index) goes through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneField {
    Id,
    Name,
    Brand,
    Price,
}

impl PhoneField {
    pub const ALL: [PhoneField; 4] = [
        PhoneField::Id,
        PhoneField::Name,
        PhoneField::Brand,
        PhoneField::Price,
    ];

    /// The attribute name used in JSON documents and query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneField::Id => "id",
            PhoneField::Name => "name",
            PhoneField::Brand => "brand",
            PhoneField::Price => "price",
        }
    }

    /// The column holding this attribute in the relational store.
    pub fn column(&self) -> &'static str {
        match self {
            PhoneField::Id => "id",
            PhoneField::Name => "name",
            PhoneField::Brand => "brand",
            PhoneField::Price => "price",
        }
    }

    /// Text attributes support substring matching; the rest are ordered numbers.
    pub fn is_text(&self) -> bool {
        matches!(self, PhoneField::Name | PhoneField::Brand)
    }
}

impl fmt::Display for PhoneField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhoneField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(PhoneField::Id),
            "name" => Ok(PhoneField::Name),
            "brand" => Ok(PhoneField::Brand),
            "price" => Ok(PhoneField::Price),
            _ => Err(CoreError::unknown_field(s)),
        }
    }
}

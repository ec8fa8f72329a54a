use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the entity store on first save.
pub type PhoneId = i64;

/// Name used for the phone entity in alerts and error payloads.
pub const ENTITY_NAME: &str = "phone";

/// A phone as persisted in the entity store and mirrored into the search index.
///
/// `id` is `None` until the entity store assigns one and never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub id: Option<PhoneId>,
    pub name: Option<String>,
    pub brand: Option<String>,
    #[serde(default, with = "crate::decimal::option")]
    pub price: Option<BigDecimal>,
}

impl Phone {
    /// Creates an unsaved phone.
    pub fn new(
        name: impl Into<String>,
        brand: impl Into<String>,
        price: impl Into<BigDecimal>,
    ) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            brand: Some(brand.into()),
            price: Some(price.into()),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: PhoneId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: impl Into<BigDecimal>) -> Self {
        self.price = Some(price.into());
        self
    }
}

/// Transport shape of a phone, field-identical to [`Phone`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneDto {
    #[serde(default)]
    pub id: Option<PhoneId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, with = "crate::decimal::option")]
    pub price: Option<BigDecimal>,
}

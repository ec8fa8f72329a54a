//! # phoneservice-core
//!
//! Domain types shared by every layer of the phone service: the stored
//! [`Phone`] entity, its transport shape [`PhoneDto`], the hand-written
//! [`PhoneField`] metamodel and the [`mapper`] between entity and DTO.

pub mod decimal;
pub mod error;
pub mod field;
pub mod mapper;
pub mod phone;

pub use bigdecimal::BigDecimal;
pub use error::{CoreError, Result};
pub use field::PhoneField;
pub use phone::{ENTITY_NAME, Phone, PhoneDto, PhoneId};

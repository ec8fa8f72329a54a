//! Field-for-field conversion between [`Phone`] and [`PhoneDto`].

use crate::phone::{Phone, PhoneDto, PhoneId};

pub fn to_dto(phone: &Phone) -> PhoneDto {
    PhoneDto {
        id: phone.id,
        name: phone.name.clone(),
        brand: phone.brand.clone(),
        price: phone.price.clone(),
    }
}

pub fn to_entity(dto: &PhoneDto) -> Phone {
    Phone {
        id: dto.id,
        name: dto.name.clone(),
        brand: dto.brand.clone(),
        price: dto.price.clone(),
    }
}

pub fn to_dtos(phones: &[Phone]) -> Vec<PhoneDto> {
    phones.iter().map(to_dto).collect()
}

pub fn to_entities(dtos: &[PhoneDto]) -> Vec<Phone> {
    dtos.iter().map(to_entity).collect()
}

/// Builds a reference stub carrying only the id, or `None` when there is no id.
pub fn entity_ref_from_id(id: Option<PhoneId>) -> Option<Phone> {
    id.map(|id| Phone {
        id: Some(id),
        ..Default::default()
    })
}

impl From<Phone> for PhoneDto {
    fn from(phone: Phone) -> Self {
        PhoneDto {
            id: phone.id,
            name: phone.name,
            brand: phone.brand,
            price: phone.price,
        }
    }
}

impl From<PhoneDto> for Phone {
    fn from(dto: PhoneDto) -> Self {
        Phone {
            id: dto.id,
            name: dto.name,
            brand: dto.brand,
            price: dto.price,
        }
    }
}

//! Paging and sorting types shared by every store and index.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use phoneservice_core::{Phone, PhoneField};
use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(format!("Unknown sort direction '{s}'"))
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub field: PhoneField,
    pub direction: Direction,
}

impl Order {
    pub fn asc(field: PhoneField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: PhoneField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

/// A request for one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Maximum number of entries per page.
    pub size: u32,
    /// Sort keys, applied left to right.
    #[serde(default)]
    pub sort: Vec<Order>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sort(mut self, order: Order) -> Self {
        self.sort.push(order);
        self
    }

    /// Index of the first entry of this page in the full result.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of a (possibly larger) result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    pub number: u32,
    /// Requested page size.
    pub size: u32,
    /// Number of entries across all pages.
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    /// A single page holding the full result.
    pub fn unpaged(content: Vec<T>) -> Self {
        let len = content.len();
        Self {
            content,
            number: 0,
            size: u32::try_from(len).unwrap_or(u32::MAX),
            total_elements: len as u64,
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            1
        } else {
            self.total_elements.div_ceil(u64::from(self.size))
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Converts the content while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

fn compare_optional<T: Ord>(a: Option<&T>, b: Option<&T>, direction: Direction) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match direction {
            Direction::Asc => x.cmp(y),
            Direction::Desc => y.cmp(x),
        },
        (None, None) => Ordering::Equal,
        // Absent values sort last ascending and first descending.
        (None, Some(_)) => match direction {
            Direction::Asc => Ordering::Greater,
            Direction::Desc => Ordering::Less,
        },
        (Some(_), None) => match direction {
            Direction::Asc => Ordering::Less,
            Direction::Desc => Ordering::Greater,
        },
    }
}

/// Compares two phones by the given sort keys, breaking ties by ascending id.
pub fn compare_phones(a: &Phone, b: &Phone, orders: &[Order]) -> Ordering {
    for order in orders {
        let ord = match order.field {
            PhoneField::Id => compare_optional(a.id.as_ref(), b.id.as_ref(), order.direction),
            PhoneField::Name => {
                compare_optional(a.name.as_ref(), b.name.as_ref(), order.direction)
            }
            PhoneField::Brand => {
                compare_optional(a.brand.as_ref(), b.brand.as_ref(), order.direction)
            }
            PhoneField::Price => {
                compare_optional(a.price.as_ref(), b.price.as_ref(), order.direction)
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    compare_optional(a.id.as_ref(), b.id.as_ref(), Direction::Asc)
}

/// Sorts a full in-memory result and cuts the requested page out of it.
///
/// Without a request the whole result is returned as a single page ordered by id.
pub fn paginate(mut phones: Vec<Phone>, request: Option<&PageRequest>) -> Page<Phone> {
    let orders: &[Order] = request.map(|r| r.sort.as_slice()).unwrap_or(&[]);
    phones.sort_by(|a, b| compare_phones(a, b, orders));

    let Some(request) = request else {
        return Page::unpaged(phones);
    };

    let total = phones.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let content = phones
        .into_iter()
        .skip(offset)
        .take(request.size as usize)
        .collect();
    Page::new(content, request, total)
}

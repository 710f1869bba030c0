//! Sort specifications
//!
//! A [`Sort`] is an ordered list of [`Order`]s. The first order is the primary
//! key and each following one breaks ties left by the orders before it.
//!
//! # Example
//!
//! ```rust
//! use data_repository::repository::{build_sort, Direction};
//!
//! let defaults = vec!["id".to_string()];
//!
//! let sort = build_sort(&["last_name", "first_name"], Direction::Descending, &defaults);
//! assert_eq!(sort.fields().collect::<Vec<_>>(), vec!["last_name", "first_name"]);
//!
//! // No fields means the configured defaults, still in the caller's direction
//! let sort = build_sort::<&str>(&[], Direction::Descending, &defaults);
//! assert_eq!(sort.fields().collect::<Vec<_>>(), vec!["id"]);
//! assert!(sort.iter().all(|order| order.direction == Direction::Descending));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction for ordering results
///
/// ```rust
/// use data_repository::repository::Direction;
///
/// assert_eq!(format!("{}", Direction::Ascending), "asc");
/// assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Descending);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    #[serde(alias = "desc")]
    Descending,
}

impl Direction {
    /// The opposite direction
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Returns `true` for [`Direction::Descending`]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Descending)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Error returned when a string is not a known sort direction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// A single (field, direction) pair of a [`Sort`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    /// Name of the field to order by
    pub field: String,
    /// Direction to order that field in
    pub direction: Direction,
}

impl Order {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Ascending)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Descending)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// Ordered sequence of sort keys
///
/// An empty sort leaves records in the store's own order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    /// A sort that applies no ordering
    pub const fn unsorted() -> Self {
        Self { orders: Vec::new() }
    }

    /// Sort by every field in `fields`, all in the same direction
    pub fn by<I, F>(direction: Direction, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        fields
            .into_iter()
            .map(|field| Order::new(field, direction))
            .collect()
    }

    /// Append a tie-breaking order
    #[must_use]
    pub fn and(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    /// Field names in priority order
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.orders.iter().map(|order| order.field.as_str())
    }
}

impl FromIterator<Order> for Sort {
    fn from_iter<T: IntoIterator<Item = Order>>(iter: T) -> Self {
        Self {
            orders: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Sort {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

impl IntoIterator for Sort {
    type Item = Order;
    type IntoIter = std::vec::IntoIter<Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.into_iter()
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.orders.is_empty() {
            return write!(f, "unsorted");
        }
        for (i, order) in self.orders.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", order)?;
        }
        Ok(())
    }
}

/// Build the sort for a caller-supplied list of field names.
///
/// When `fields` is empty the `default_fields` are used instead. Every field
/// of the result carries `direction`. Names are not validated here; an
/// unknown name fails when the store or comparator resolves it.
pub fn build_sort<F: AsRef<str>>(fields: &[F], direction: Direction, default_fields: &[String]) -> Sort {
    if fields.is_empty() {
        Sort::by(direction, default_fields.iter().map(String::as_str))
    } else {
        Sort::by(direction, fields.iter().map(|field| field.as_ref()))
    }
}

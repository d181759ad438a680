//! Catalog product types.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The value is above the top of the scale.
    #[error("rating must be at most {max} (got {value})")]
    OutOfRange {
        /// Rejected value.
        value: u8,
        /// Maximum allowed value.
        max: u8,
    },
}

/// Aggregate product rating, an integer out of five.
///
/// ## Examples
///
/// ```
/// use qkart_core::Rating;
///
/// assert_eq!(Rating::new(4).map(Rating::stars), Ok(4));
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Highest rating on the scale.
    pub const MAX: u8 = 5;

    /// Create a rating, rejecting values above [`Rating::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] if `value > 5`.
    pub const fn new(value: u8) -> Result<Self, RatingError> {
        if value > Self::MAX {
            return Err(RatingError::OutOfRange {
                value,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// A purchasable product as returned by `GET /products`.
///
/// Products are immutable once fetched. The backend names the id field
/// `_id`; `id` is accepted as well when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product id.
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Category the product belongs to (e.g. "Phones").
    #[serde(default)]
    pub category: String,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    /// Aggregate rating out of five.
    #[serde(default)]
    pub rating: Rating,
    /// Image URL.
    #[serde(default)]
    pub image: String,
}

//! Cart types.
//!
//! The backend only knows [`CartEntry`] values (product id + quantity).
//! [`CartItem`] is the display form produced by joining an entry with its
//! catalog [`Product`]; it is never edited directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::{Product, Rating};

/// A cart line as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Product in the cart.
    pub product_id: ProductId,
    /// Quantity, at least 1 for entries the backend returns.
    pub qty: u32,
}

impl CartEntry {
    /// Create a cart entry.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// Body of `POST /cart`: set the quantity of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpsert {
    /// Product to add or update.
    pub product_id: ProductId,
    /// Desired quantity.
    pub qty: u32,
}

/// A cart entry enriched with product display and pricing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub rating: Rating,
    pub image: String,
    pub qty: u32,
}

impl CartItem {
    /// Join a product with the quantity from its cart entry.
    #[must_use]
    pub fn from_product(product: &Product, qty: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            cost: product.cost,
            rating: product.rating,
            image: product.image.clone(),
            qty,
        }
    }

    /// Price of this line (`cost × qty`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.cost * Decimal::from(self.qty)
    }
}

/// Total value of a cart.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// Total number of units across all cart lines.
#[must_use]
pub fn total_quantity(items: &[CartItem]) -> u64 {
    items.iter().map(|item| u64::from(item.qty)).sum()
}

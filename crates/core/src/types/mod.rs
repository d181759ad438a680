//! Core types for QKart.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod cart;
pub mod envelope;
pub mod id;
pub mod product;

pub use cart::{CartEntry, CartItem, CartUpsert, cart_total, total_quantity};
pub use envelope::ErrorEnvelope;
pub use id::*;
pub use product::{Product, Rating, RatingError};

//! Server-authoritative cart.
//!
//! The backend stores only `(productId, qty)` pairs. [`reconcile`] joins
//! them with the catalog into displayable [`CartItem`](qkart_core::CartItem)s;
//! [`CartMutator`] sends changes to the backend and merges the returned cart.

mod mutator;
mod reconcile;

pub use mutator::{CartMutator, CartState, MutationOutcome, contains_product};
pub use reconcile::reconcile;

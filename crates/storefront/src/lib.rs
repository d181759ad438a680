//! `QKart` storefront core.
//!
//! Keeps the product catalog, the displayed search results and the signed-in
//! user's cart in sync with the `QKart` backend. The cart is server
//! authoritative: local state only ever changes to what the backend returned.
//!
//! # Components
//!
//! - [`CatalogStore`] loads and holds the catalog.
//! - [`SearchController`] debounces query text and applies search results,
//!   falling back to the catalog on server errors.
//! - [`cart::reconcile`] joins raw cart entries against the catalog.
//! - [`CartMutator`] sends cart changes and merges the returned cart.
//! - [`Storefront`] wires them to one backend and one session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod search;
pub mod sequence;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use backend::{ApiError, RestClient, StoreBackend};
pub use cart::{CartMutator, CartState, MutationOutcome};
pub use catalog::{Catalog, CatalogState, CatalogStore};
pub use config::{BackendConfig, ConfigError, StorefrontConfig};
pub use error::{ErrorClass, StorefrontError};
pub use notify::{Notice, Notifier, Severity, TracingNotifier};
pub use search::{SearchController, SearchOutcome, SearchState, SearchView};
pub use session::Session;
pub use state::Storefront;

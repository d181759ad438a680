//! QKart Core - Shared domain types.
//!
//! This crate provides the types shared by every QKart component:
//! - `storefront` - Catalog, search and cart synchronization against the backend
//! - `cli` - Command-line front end
//! - `integration-tests` - Fake backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere,
//! including by a fake backend that speaks the same wire format.
//!
//! # Modules
//!
//! - [`types`] - Product ids, products, ratings, cart entries/items and the
//!   backend error envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

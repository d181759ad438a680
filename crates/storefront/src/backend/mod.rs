//! Backend access for the storefront core.
//!
//! # Architecture
//!
//! - [`StoreBackend`] is the seam every component talks through; the
//!   components never see HTTP.
//! - [`RestClient`] implements it over the JSON/HTTP contract:
//!
//! | Operation | Request | Auth |
//! |---|---|---|
//! | List catalog | `GET products` | none |
//! | Search catalog | `GET products/search?value=<text>` | none |
//! | Fetch cart | `GET cart` | Bearer |
//! | Upsert cart item | `POST cart` `{productId, qty}` | Bearer |
//!
//! Every non-success response is classified into an [`ApiError`] by status
//! class, carrying the message from the backend's error envelope.

mod rest;

use std::future::Future;
use std::sync::Arc;

use qkart_core::{CartEntry, CartUpsert, Product};
use secrecy::SecretString;
use thiserror::Error;

use crate::error::ErrorClass;

pub use rest::RestClient;

/// Errors returned by a [`StoreBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other 4xx. `message` comes from the error envelope.
    #[error("Client error {status}: {message}")]
    Client { status: u16, message: String },

    /// 5xx (or any other unexpected status).
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// No response reached us (refused, reset, timed out).
    #[error("Connection failed: {0}")]
    Connectivity(String),

    /// A success response whose body does not match the contract.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The client could not be built from its configuration.
    #[error("Invalid backend configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Error class used for user-facing handling.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Client { .. } => ErrorClass::ClientError,
            Self::Server { .. } => ErrorClass::ServerError,
            Self::Connectivity(_) | Self::InvalidResponse(_) | Self::Config(_) => {
                ErrorClass::ConnectivityError
            }
        }
    }
}

/// The storefront backend contract.
///
/// Implementations must be cheap to share (`Send + Sync + 'static`); the
/// components hold them behind an `Arc` and call them from spawned tasks.
pub trait StoreBackend: Send + Sync + 'static {
    /// `GET /products` - the full catalog.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// `GET /products/search?value=<text>`.
    fn search_products(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// `GET /cart` with a bearer token.
    fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<CartEntry>, ApiError>> + Send;

    /// `POST /cart` with a bearer token. Returns the full updated cart.
    fn upsert_cart_item(
        &self,
        token: &SecretString,
        upsert: &CartUpsert,
    ) -> impl Future<Output = Result<Vec<CartEntry>, ApiError>> + Send;
}

/// Lets callers keep a handle on a backend they hand to the storefront.
impl<T: StoreBackend> StoreBackend for Arc<T> {
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send {
        (**self).list_products()
    }

    fn search_products(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send {
        (**self).search_products(text)
    }

    fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<CartEntry>, ApiError>> + Send {
        (**self).fetch_cart(token)
    }

    fn upsert_cart_item(
        &self,
        token: &SecretString,
        upsert: &CartUpsert,
    ) -> impl Future<Output = Result<Vec<CartEntry>, ApiError>> + Send {
        (**self).upsert_cart_item(token, upsert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Client {
            status: 400,
            message: "Product doesn't exist".to_string(),
        };
        assert_eq!(err.to_string(), "Client error 400: Product doesn't exist");

        let err = ApiError::Connectivity("connection refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: connection refused");
    }

    #[test]
    fn test_api_error_classes() {
        assert_eq!(
            ApiError::NotFound(String::new()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            ApiError::Server {
                status: 500,
                message: String::new()
            }
            .class(),
            ErrorClass::ServerError
        );
        assert_eq!(
            ApiError::InvalidResponse(String::new()).class(),
            ErrorClass::ConnectivityError
        );
    }
}

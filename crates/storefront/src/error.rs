//! Error taxonomy and user-facing messages.
//!
//! Every failure the core can hit falls into one [`ErrorClass`]. Components
//! catch errors at the boundary of each public operation and turn them into
//! a [`Notice`](crate::notify::Notice) using [`StorefrontError::user_message`];
//! server-side detail is logged, never shown.

use qkart_core::ProductId;
use thiserror::Error;

use crate::backend::ApiError;
use crate::notify::Severity;

/// Messages shown to the user.
pub mod messages {
    pub const SERVER_ERROR: &str =
        "Something went wrong. Check the backend console for more details";
    pub const CONNECTIVITY: &str = "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";
    pub const CART_FETCH_FAILED: &str = "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON.";
    pub const CART_UPDATE_FAILED: &str = "Could not update cart";
    pub const LOGIN_REQUIRED: &str = "Login to add an item to the Cart";
    pub const ALREADY_IN_CART: &str =
        "Item already in cart. Use the cart sidebar to update quantity or remove item.";
    pub const ITEM_ADDED: &str = "Item added to cart";
}

/// Broad failure classes, each with its own handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Empty result; not shown as an error.
    NotFound,
    /// 4xx with a server-supplied message, shown verbatim.
    ClientError,
    /// 5xx; a generic message is shown, the detail is only logged.
    ServerError,
    /// No usable response reached the client.
    ConnectivityError,
    /// Rejected locally without touching the network.
    LocalGuardRejection,
}

/// Storefront-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorefrontError {
    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Cart operation attempted without a session token.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Add of a product that is already a cart line.
    #[error("Product {0} is already in the cart")]
    AlreadyInCart(ProductId),
}

impl StorefrontError {
    /// Error class used to pick the handling policy.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Api(err) => err.class(),
            Self::NotAuthenticated | Self::AlreadyInCart(_) => ErrorClass::LocalGuardRejection,
        }
    }

    /// Message to show the user.
    ///
    /// Client errors carry the backend's own message; local guards have fixed
    /// wording; everything else falls back to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(ApiError::Client { message, .. }) => message.clone(),
            Self::NotAuthenticated => messages::LOGIN_REQUIRED.to_string(),
            Self::AlreadyInCart(_) => messages::ALREADY_IN_CART.to_string(),
            Self::Api(_) => fallback.to_string(),
        }
    }

    /// Default presentation severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.class() {
            ErrorClass::NotFound => Severity::Info,
            ErrorClass::ClientError | ErrorClass::LocalGuardRejection => Severity::Warning,
            ErrorClass::ServerError | ErrorClass::ConnectivityError => Severity::Error,
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

//! Storefront state shared by a front end.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use qkart_core::{CartEntry, CartItem, Product, ProductId};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::instrument;

use crate::backend::{ApiError, RestClient, StoreBackend};
use crate::cart::{CartMutator, CartState, MutationOutcome};
use crate::catalog::{Catalog, CatalogState, CatalogStore};
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::notify::Notifier;
use crate::search::{SearchController, SearchOutcome, SearchView};
use crate::session::Session;

/// Catalog, search and cart bound to one backend and one session slot.
///
/// Cheaply cloneable via `Arc`.
pub struct Storefront<B> {
    inner: Arc<StorefrontInner<B>>,
}

struct StorefrontInner<B> {
    catalog: CatalogStore<B>,
    search: SearchController<B>,
    cart: CartMutator<B>,
    session: RwLock<Option<Session>>,
}

impl<B> Clone for Storefront<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Storefront<RestClient> {
    /// Build a storefront talking to the configured REST backend.
    ///
    /// Signs in with the configured session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(
        config: &StorefrontConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let backend = RestClient::new(&config.backend)?;
        let storefront = Self::new(backend, notifier, config.search_debounce);
        if let Some(session) = &config.session {
            storefront.sign_in(session.clone());
        }
        Ok(storefront)
    }
}

impl<B: StoreBackend> Storefront<B> {
    #[must_use]
    pub fn new(backend: B, notifier: Arc<dyn Notifier>, debounce: Duration) -> Self {
        let backend = Arc::new(backend);
        let catalog = CatalogStore::new(Arc::clone(&backend), Arc::clone(&notifier));
        let search = SearchController::new(
            Arc::clone(&backend),
            Arc::clone(&notifier),
            catalog.subscribe(),
            debounce,
        );
        let cart = CartMutator::new(backend, notifier);

        Self {
            inner: Arc::new(StorefrontInner {
                catalog,
                search,
                cart,
                session: RwLock::new(None),
            }),
        }
    }

    /// Load the catalog, display it, then fetch the cart when signed in.
    ///
    /// A failed cart fetch is notified but does not fail the load.
    ///
    /// # Errors
    ///
    /// Returns the catalog load failure; the cart is not fetched in that case.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Arc<Catalog>, StorefrontError> {
        let catalog = self.inner.catalog.load().await?;
        self.inner.search.show_catalog(&catalog);
        self.inner.cart.rereconcile(&catalog);

        if let Some(session) = self.session() {
            // Already notified.
            let _ = self.inner.cart.fetch(Some(&session), &catalog).await;
        }
        Ok(catalog)
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!(username = %session.username(), "Signed in");
        *self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Forget the session and its cart.
    pub fn sign_out(&self) {
        let previous = self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = previous {
            tracing::info!(username = %session.username(), "Signed out");
        }
        self.inner.cart.clear();
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// See [`SearchController::on_query_changed`].
    pub fn on_query_changed(&self, text: impl Into<String>) {
        self.inner.search.on_query_changed(text);
    }

    pub async fn search_now(&self, text: &str) -> SearchOutcome {
        self.inner.search.search_now(text).await
    }

    /// Add a product, guarded against products already in the cart.
    pub async fn add_to_cart(&self, product_id: &ProductId, qty: u32) -> MutationOutcome {
        let session = self.session();
        let entries = self.inner.cart.entries();
        let catalog = self.inner.catalog.catalog();
        self.inner
            .cart
            .add_to_cart(session.as_ref(), &entries, &catalog, product_id, qty)
            .await
    }

    pub async fn update_quantity(&self, product_id: &ProductId, qty: u32) -> MutationOutcome {
        let session = self.session();
        let catalog = self.inner.catalog.catalog();
        self.inner
            .cart
            .update_quantity(session.as_ref(), &catalog, product_id, qty)
            .await
    }

    /// Re-fetch the cart for the current session.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::NotAuthenticated`] when signed out, or the
    /// backend failure after it has been notified.
    pub async fn refresh_cart(&self) -> Result<Vec<CartItem>, StorefrontError> {
        let session = self.session();
        let catalog = self.inner.catalog.catalog();
        self.inner.cart.fetch(session.as_ref(), &catalog).await
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        self.inner.catalog.catalog()
    }

    /// Products the grid currently shows.
    #[must_use]
    pub fn displayed(&self) -> Vec<Product> {
        self.inner.search.displayed()
    }

    #[must_use]
    pub fn cart_entries(&self) -> Vec<CartEntry> {
        self.inner.cart.entries()
    }

    #[must_use]
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.inner.cart.items()
    }

    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        qkart_core::cart_total(&self.inner.cart.items())
    }

    #[must_use]
    pub fn subscribe_catalog(&self) -> watch::Receiver<CatalogState> {
        self.inner.catalog.subscribe()
    }

    #[must_use]
    pub fn subscribe_search(&self) -> watch::Receiver<SearchView> {
        self.inner.search.subscribe()
    }

    #[must_use]
    pub fn subscribe_cart(&self) -> watch::Receiver<CartState> {
        self.inner.cart.subscribe()
    }

    #[must_use]
    pub fn search(&self) -> &SearchController<B> {
        &self.inner.search
    }
}

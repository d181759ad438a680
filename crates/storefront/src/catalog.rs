//! Product catalog store.
//!
//! The catalog is fetched once per session and replaced as a whole; readers
//! take an `Arc<Catalog>` snapshot and never observe a partial update.

use std::collections::HashMap;
use std::sync::Arc;

use qkart_core::{Product, ProductId};
use tokio::sync::watch;
use tracing::instrument;

use crate::backend::{ApiError, StoreBackend};
use crate::error::{StorefrontError, messages};
use crate::notify::{Notice, Notifier};

/// Products in backend order with an id index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog. If an id repeats, lookups resolve to its last occurrence.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let index = products
            .iter()
            .enumerate()
            .map(|(position, product)| (product.id.clone(), position))
            .collect();
        Self { products, index }
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Products in the order the backend returned them.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Observable catalog state.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub catalog: Arc<Catalog>,
    pub loading: bool,
}

/// Holds the session's catalog and its loading flag.
pub struct CatalogStore<B> {
    backend: Arc<B>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<CatalogState>,
}

impl<B: StoreBackend> CatalogStore<B> {
    #[must_use]
    pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        Self {
            backend,
            notifier,
            state,
        }
    }

    /// Fetch the catalog and replace the current one.
    ///
    /// On failure the previous catalog is kept, the loading flag is cleared
    /// and the user is notified. There is no automatic retry.
    ///
    /// # Errors
    ///
    /// Returns the backend failure after it has been notified.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Arc<Catalog>, StorefrontError> {
        self.state.send_modify(|state| state.loading = true);

        match self.backend.list_products().await {
            Ok(products) => {
                let catalog = Arc::new(Catalog::new(products));
                tracing::info!(products = catalog.len(), "Catalog loaded");
                self.state.send_replace(CatalogState {
                    catalog: Arc::clone(&catalog),
                    loading: false,
                });
                Ok(catalog)
            }
            Err(err) => {
                self.state.send_modify(|state| state.loading = false);
                let err = StorefrontError::from(err);
                tracing::warn!(error = %err, "Catalog load failed");
                self.notifier.notify(Notice::error(load_failure_message(&err)));
                Err(err)
            }
        }
    }

    /// Current catalog snapshot.
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.state.borrow().catalog)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Watch catalog replacements and loading changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }
}

/// Any 4xx, including 404, shows the server's message as sent.
fn load_failure_message(err: &StorefrontError) -> String {
    match err {
        StorefrontError::Api(ApiError::NotFound(message)) => message.clone(),
        other => other.user_message(messages::SERVER_ERROR),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::notify::Severity;
    use crate::testing::{Call, FakeBackend, drain, notices, phone_and_ball, product, shared};

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::new(phone_and_ball());

        assert_eq!(catalog.get("A").map(|p| p.name.as_str()), Some("Phone"));
        assert!(catalog.contains("B"));
        assert!(catalog.get("Z").is_none());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_catalog_repeated_id_resolves_to_last() {
        let catalog: Catalog = vec![product("A", "Old", 1), product("A", "New", 2)]
            .into_iter()
            .collect();
        assert_eq!(catalog.get("A").map(|p| p.name.as_str()), Some("New"));
    }

    #[tokio::test]
    async fn test_load_replaces_catalog() {
        let backend = shared(FakeBackend::with_products(phone_and_ball()));
        let (tx, mut rx) = notices();
        let store = CatalogStore::new(Arc::clone(&backend), tx);

        assert!(store.catalog().is_empty());
        let catalog = store.load().await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(store.catalog().len(), 2);
        assert!(!store.is_loading());
        assert_eq!(backend.calls(), vec![Call::ListProducts]);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_catalog() {
        let backend = shared(FakeBackend::with_products(phone_and_ball()));
        let (tx, mut rx) = notices();
        let store = CatalogStore::new(Arc::clone(&backend), tx);
        store.load().await.unwrap();

        backend.fail_list(ApiError::Server {
            status: 500,
            message: "db down".to_string(),
        });
        let err = store.load().await.unwrap_err();

        assert!(matches!(err, StorefrontError::Api(ApiError::Server { .. })));
        assert_eq!(store.catalog().len(), 2);
        assert!(!store.is_loading());

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Error);
        assert_eq!(notices[0].message, messages::SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_client_error_message_is_shown_verbatim() {
        let backend = shared(FakeBackend::with_products(phone_and_ball()));
        let (tx, mut rx) = notices();
        let store = CatalogStore::new(Arc::clone(&backend), tx);
        store.load().await.unwrap();

        backend.fail_list(ApiError::Client {
            status: 400,
            message: "Malformed catalog request".to_string(),
        });
        let err = store.load().await.unwrap_err();

        assert_eq!(err.class(), ErrorClass::ClientError);
        assert_eq!(store.catalog().len(), 2);
        assert_eq!(
            drain(&mut rx),
            vec![Notice::error("Malformed catalog request")]
        );
    }

    #[tokio::test]
    async fn test_not_found_message_is_shown_verbatim() {
        let backend = shared(FakeBackend::with_products(phone_and_ball()));
        let (tx, mut rx) = notices();
        let store = CatalogStore::new(Arc::clone(&backend), tx);
        store.load().await.unwrap();

        backend.fail_list(ApiError::NotFound("No products in store".to_string()));
        let err = store.load().await.unwrap_err();

        assert!(matches!(err, StorefrontError::Api(ApiError::NotFound(_))));
        assert_eq!(store.catalog().len(), 2);
        assert!(!store.is_loading());
        assert_eq!(drain(&mut rx), vec![Notice::error("No products in store")]);
    }

    #[tokio::test]
    async fn test_first_load_failure_leaves_empty_catalog() {
        let backend = shared(FakeBackend::default());
        backend.fail_list(ApiError::Connectivity("refused".to_string()));
        let (tx, _rx) = notices();
        let store = CatalogStore::new(backend, tx);

        assert!(store.load().await.is_err());
        assert!(store.catalog().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_new_catalog() {
        let backend = shared(FakeBackend::with_products(phone_and_ball()));
        let (tx, _rx) = notices();
        let store = CatalogStore::new(backend, tx);
        let mut watcher = store.subscribe();

        store.load().await.unwrap();

        assert!(watcher.has_changed().unwrap());
        assert_eq!(watcher.borrow_and_update().catalog.len(), 2);
    }
}

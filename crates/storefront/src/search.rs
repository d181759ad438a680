//! Debounced catalog search.
//!
//! [`SearchController`] is a two-state machine: **Idle**, or **Pending** with a
//! single armed debounce timer. Every keystroke replaces the timer, so only
//! text that survives a full debounce window of quiescence reaches the
//! backend.
//!
//! When the timer fires it spawns the search as its own task. Aborting a
//! later timer therefore never aborts an HTTP call that has started; a
//! superseded response is discarded by its request id instead.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use qkart_core::Product;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::backend::StoreBackend;
use crate::catalog::{Catalog, CatalogState};
use crate::error::{ErrorClass, StorefrontError, messages};
use crate::notify::{Notice, Notifier};
use crate::sequence::{Freshness, Sequencer, Ticket};

/// Quiet period before a typed query is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// A search request tagged with its position in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub request_id: Ticket,
}

/// What the product grid currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchView {
    pub products: Vec<Product>,
    pub loading: bool,
}

/// Controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    /// A debounce timer is armed for `text`.
    Pending { text: String },
}

/// How a fired query changed the displayed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Matching products are displayed.
    Results(usize),
    /// The backend found nothing; the displayed set is empty.
    NoMatches,
    /// Blank query; the full catalog is displayed.
    ShowingCatalog,
    /// Server failure; the full catalog is displayed again.
    FellBackToCatalog,
    /// Failure that leaves the displayed set as it was.
    Unchanged,
    /// A newer query was issued before this response arrived.
    Stale,
}

struct PendingQuery {
    text: String,
    timer: JoinHandle<()>,
}

struct SearchInner<B> {
    backend: Arc<B>,
    notifier: Arc<dyn Notifier>,
    catalog: watch::Receiver<CatalogState>,
    sequencer: Sequencer,
    view: watch::Sender<SearchView>,
}

/// Turns query text into the displayed product set.
pub struct SearchController<B> {
    inner: Arc<SearchInner<B>>,
    pending: Mutex<Option<PendingQuery>>,
    debounce: Duration,
}

impl<B: StoreBackend> SearchController<B> {
    /// `catalog` is the fallback shown on blank queries and server errors.
    #[must_use]
    pub fn new(
        backend: Arc<B>,
        notifier: Arc<dyn Notifier>,
        catalog: watch::Receiver<CatalogState>,
        debounce: Duration,
    ) -> Self {
        let (view, _) = watch::channel(SearchView::default());
        Self {
            inner: Arc::new(SearchInner {
                backend,
                notifier,
                catalog,
                sequencer: Sequencer::new(),
                view,
            }),
            pending: Mutex::new(None),
            debounce,
        }
    }

    /// Record a keystroke. Replaces any armed timer with a new one for `text`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_query_changed(&self, text: impl Into<String>) {
        let text = text.into();
        let inner = Arc::clone(&self.inner);
        let debounce = self.debounce;
        let query = text.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            tokio::spawn(async move {
                inner.run_query(&query).await;
            });
        });

        if let Some(previous) = self.lock_pending().replace(PendingQuery { text, timer }) {
            previous.timer.abort();
        }
    }

    /// Cancel any armed timer and run `text` immediately.
    pub async fn search_now(&self, text: &str) -> SearchOutcome {
        self.cancel_pending();
        self.inner.run_query(text).await
    }

    /// Display `catalog` in full and discard any search still in flight.
    pub fn show_catalog(&self, catalog: &Catalog) {
        self.inner.sequencer.invalidate();
        self.inner.publish(catalog.products().to_vec());
    }

    /// Disarm the pending timer, if any.
    pub fn cancel_pending(&self) {
        if let Some(pending) = self.lock_pending().take() {
            pending.timer.abort();
        }
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        match self.lock_pending().as_ref() {
            Some(pending) if !pending.timer.is_finished() => SearchState::Pending {
                text: pending.text.clone(),
            },
            _ => SearchState::Idle,
        }
    }

    /// Products currently displayed.
    #[must_use]
    pub fn displayed(&self) -> Vec<Product> {
        self.inner.view.borrow().products.clone()
    }

    #[must_use]
    pub fn view(&self) -> SearchView {
        self.inner.view.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.inner.view.subscribe()
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingQuery>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B> Drop for SearchController<B> {
    fn drop(&mut self) {
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.timer.abort();
        }
    }
}

impl<B: StoreBackend> SearchInner<B> {
    #[instrument(skip(self))]
    async fn run_query(&self, text: &str) -> SearchOutcome {
        if text.trim().is_empty() {
            self.sequencer.invalidate();
            self.publish(self.catalog_products());
            return SearchOutcome::ShowingCatalog;
        }

        let query = SearchQuery {
            text: text.to_string(),
            request_id: self.sequencer.issue(),
        };
        self.view.send_modify(|view| view.loading = true);

        let result = self.backend.search_products(&query.text).await;

        if self.sequencer.check_latest(query.request_id) == Freshness::Stale {
            debug!(
                request_id = query.request_id.get(),
                "Discarding stale search response"
            );
            return SearchOutcome::Stale;
        }

        match result {
            Ok(products) if products.is_empty() => {
                self.publish(products);
                SearchOutcome::NoMatches
            }
            Ok(products) => {
                let count = products.len();
                self.publish(products);
                SearchOutcome::Results(count)
            }
            Err(err) => self.apply_failure(&StorefrontError::from(err)),
        }
    }

    fn apply_failure(&self, err: &StorefrontError) -> SearchOutcome {
        match err.class() {
            ErrorClass::NotFound => {
                self.publish(Vec::new());
                SearchOutcome::NoMatches
            }
            ErrorClass::ServerError => {
                tracing::warn!(error = %err, "Search failed, showing full catalog");
                self.notifier
                    .notify(Notice::error(err.user_message(messages::SERVER_ERROR)));
                self.publish(self.catalog_products());
                SearchOutcome::FellBackToCatalog
            }
            ErrorClass::ConnectivityError => {
                tracing::warn!(error = %err, "Search did not reach the backend");
                self.notifier.notify(Notice::error(messages::CONNECTIVITY));
                self.view.send_modify(|view| view.loading = false);
                SearchOutcome::Unchanged
            }
            ErrorClass::ClientError | ErrorClass::LocalGuardRejection => {
                self.notifier
                    .notify(Notice::warning(err.user_message(messages::SERVER_ERROR)));
                self.view.send_modify(|view| view.loading = false);
                SearchOutcome::Unchanged
            }
        }
    }

    fn publish(&self, products: Vec<Product>) {
        self.view.send_replace(SearchView {
            products,
            loading: false,
        });
    }

    fn catalog_products(&self) -> Vec<Product> {
        self.catalog.borrow().catalog.products().to_vec()
    }
}

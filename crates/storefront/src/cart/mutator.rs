//! Cart mutations and server-response merging.
//!
//! Nothing is applied optimistically: local cart state only ever changes to
//! a list the backend returned, and a failed call leaves it untouched.

use std::sync::Arc;

use qkart_core::{CartEntry, CartItem, CartUpsert, ProductId};
use tokio::sync::watch;
use tracing::{debug, instrument};

use super::reconcile::reconcile;
use crate::backend::StoreBackend;
use crate::catalog::Catalog;
use crate::error::{StorefrontError, messages};
use crate::notify::{Notice, Notifier};
use crate::sequence::{Freshness, Sequencer, Ticket};
use crate::session::Session;

/// Server cart entries and the items reconciled from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub entries: Vec<CartEntry>,
    pub items: Vec<CartItem>,
}

/// Result of an add or quantity update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum MutationOutcome {
    /// The backend accepted the change; the local cart now matches its response.
    Applied(Vec<CartItem>),
    /// The backend accepted the change but a newer response had already been
    /// merged, so this one was dropped.
    Stale,
    /// Rejected locally or by the backend; the local cart is unchanged.
    Rejected(StorefrontError),
}

impl MutationOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    #[must_use]
    pub const fn error(&self) -> Option<&StorefrontError> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Applied(_) | Self::Stale => None,
        }
    }
}

/// Whether `product_id` already has a line in `entries`.
#[must_use]
pub fn contains_product(entries: &[CartEntry], product_id: &ProductId) -> bool {
    entries.iter().any(|entry| &entry.product_id == product_id)
}

/// Sends cart changes to the backend and merges the returned cart.
pub struct CartMutator<B> {
    backend: Arc<B>,
    notifier: Arc<dyn Notifier>,
    sequencer: Sequencer,
    state: watch::Sender<CartState>,
}

impl<B: StoreBackend> CartMutator<B> {
    #[must_use]
    pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            backend,
            notifier,
            sequencer: Sequencer::new(),
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<CartEntry> {
        self.state.borrow().entries.clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.state.borrow().items.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Fetch the cart from the backend and replace local state.
    ///
    /// Without a session nothing is sent and nothing is notified: anonymous
    /// visitors simply have no cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::NotAuthenticated`] without a session, or
    /// the backend failure after it has been notified.
    #[instrument(skip(self, session, catalog))]
    pub async fn fetch(
        &self,
        session: Option<&Session>,
        catalog: &Catalog,
    ) -> Result<Vec<CartItem>, StorefrontError> {
        let Some(session) = session else {
            debug!("No session, skipping cart fetch");
            return Err(StorefrontError::NotAuthenticated);
        };

        let ticket = self.sequencer.issue();
        match self.backend.fetch_cart(session.token()).await {
            Ok(entries) => Ok(self
                .merge(ticket, entries, catalog)
                .unwrap_or_else(|| self.items())),
            Err(err) => {
                let err = StorefrontError::from(err);
                tracing::warn!(error = %err, "Cart fetch failed");
                self.notifier.notify(Notice::error(
                    err.user_message(messages::CART_FETCH_FAILED),
                ));
                Err(err)
            }
        }
    }

    /// Add a product that is not in the cart yet.
    ///
    /// Rejected locally, without a request, when there is no session or when
    /// `product_id` already appears in `current_entries`. The duplicate check
    /// is a convenience for the user; the backend stays authoritative.
    #[instrument(skip(self, session, current_entries, catalog), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        session: Option<&Session>,
        current_entries: &[CartEntry],
        catalog: &Catalog,
        product_id: &ProductId,
        qty: u32,
    ) -> MutationOutcome {
        let Some(session) = session else {
            return self.reject(StorefrontError::NotAuthenticated);
        };
        if contains_product(current_entries, product_id) {
            return self.reject(StorefrontError::AlreadyInCart(product_id.clone()));
        }

        let outcome = self.upsert(session, catalog, product_id, qty).await;
        if outcome.is_applied() {
            self.notifier.notify(Notice::success(messages::ITEM_ADDED));
        }
        outcome
    }

    /// Set the quantity of an existing cart line.
    ///
    /// Same request and merge as [`add_to_cart`](Self::add_to_cart) without
    /// the duplicate check. A quantity of zero is sent as-is; whether it
    /// removes the line is up to the backend's response.
    #[instrument(skip(self, session, catalog), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        session: Option<&Session>,
        catalog: &Catalog,
        product_id: &ProductId,
        qty: u32,
    ) -> MutationOutcome {
        let Some(session) = session else {
            return self.reject(StorefrontError::NotAuthenticated);
        };
        self.upsert(session, catalog, product_id, qty).await
    }

    /// Recompute items from the current entries, e.g. after a catalog reload.
    pub fn rereconcile(&self, catalog: &Catalog) {
        self.state
            .send_modify(|state| state.items = reconcile(&state.entries, catalog));
    }

    /// Drop local cart state and any response still in flight.
    pub fn clear(&self) {
        self.sequencer.invalidate();
        self.state.send_replace(CartState::default());
    }

    async fn upsert(
        &self,
        session: &Session,
        catalog: &Catalog,
        product_id: &ProductId,
        qty: u32,
    ) -> MutationOutcome {
        let upsert = CartUpsert {
            product_id: product_id.clone(),
            qty,
        };

        let ticket = self.sequencer.issue();
        match self.backend.upsert_cart_item(session.token(), &upsert).await {
            Ok(entries) => self
                .merge(ticket, entries, catalog)
                .map_or(MutationOutcome::Stale, MutationOutcome::Applied),
            Err(err) => self.reject(StorefrontError::from(err)),
        }
    }

    /// Replace local state with a server cart unless a newer one is already in.
    fn merge(
        &self,
        ticket: Ticket,
        entries: Vec<CartEntry>,
        catalog: &Catalog,
    ) -> Option<Vec<CartItem>> {
        if self.sequencer.admit(ticket) == Freshness::Stale {
            debug!(ticket = ticket.get(), "Dropping stale cart response");
            return None;
        }

        let items = reconcile(&entries, catalog);
        self.state.send_replace(CartState {
            entries,
            items: items.clone(),
        });
        Some(items)
    }

    fn reject(&self, err: StorefrontError) -> MutationOutcome {
        tracing::warn!(error = %err, class = ?err.class(), "Cart update rejected");
        self.notifier.notify(Notice::warning(
            err.user_message(messages::CART_UPDATE_FAILED),
        ));
        MutationOutcome::Rejected(err)
    }
}

//! Request sequencing for out-of-order responses.
//!
//! Every request that merges its response into shared state takes a
//! [`Ticket`]. When the response arrives the ticket is checked and the
//! response is tagged [`Freshness::Current`] or [`Freshness::Stale`]; stale
//! responses are dropped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Position of a request in issue order. Tickets start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Whether a response may be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Current,
    Stale,
}

/// Monotonic ticket issuer.
#[derive(Debug, Default)]
pub struct Sequencer {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl Sequencer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    /// Issue the next ticket.
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// `Current` only if no later ticket has been issued.
    ///
    /// Used where only the newest request may win (search).
    #[must_use]
    pub fn check_latest(&self, ticket: Ticket) -> Freshness {
        if self.issued.load(Ordering::SeqCst) == ticket.0 {
            Freshness::Current
        } else {
            Freshness::Stale
        }
    }

    /// `Current` if the ticket is newer than every ticket admitted so far,
    /// in which case it becomes the newest admitted one.
    ///
    /// Used where any response carries full server state (cart): a response
    /// only loses to one that was issued after it and already merged.
    pub fn admit(&self, ticket: Ticket) -> Freshness {
        let previous = self.applied.fetch_max(ticket.0, Ordering::SeqCst);
        if previous < ticket.0 {
            Freshness::Current
        } else {
            Freshness::Stale
        }
    }

    /// Make every ticket issued so far stale for both checks.
    pub fn invalidate(&self) {
        let ticket = self.issue();
        self.applied.fetch_max(ticket.0, Ordering::SeqCst);
    }
}

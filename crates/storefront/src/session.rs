//! Signed-in session context.
//!
//! A [`Session`] is created by the login flow (outside this crate), handed to
//! the storefront with [`Storefront::sign_in`](crate::Storefront::sign_in)
//! and dropped at sign-out. Nothing here reads ambient storage.

use std::fmt;

use rust_decimal::Decimal;
use secrecy::SecretString;

/// Identity and credentials of the signed-in user.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    username: String,
    token: SecretString,
    balance: Option<Decimal>,
}

impl Session {
    /// Create a session from the values returned at login.
    #[must_use]
    pub fn new(username: impl Into<String>, token: SecretString) -> Self {
        Self {
            username: username.into(),
            token,
            balance: None,
        }
    }

    /// Attach the wallet balance reported at login.
    #[must_use]
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = Some(balance);
        self
    }

    /// Name of the signed-in user.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Bearer token for authenticated backend calls.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Wallet balance, if the login response carried one.
    #[must_use]
    pub const fn balance(&self) -> Option<Decimal> {
        self.balance
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .field("balance", &self.balance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("crio-user", SecretString::from("super-secret-token"))
            .with_balance(Decimal::from(5000));
        let debug = format!("{session:?}");

        assert!(debug.contains("crio-user"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));
        assert_eq!(session.balance(), Some(Decimal::from(5000)));
    }
}

//! CLI subcommands.

pub mod cart;
pub mod products;
pub mod search;

use std::sync::Arc;

use qkart_storefront::{Notice, RestClient, Severity, Storefront, StorefrontConfig};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// A storefront plus the channel its notices arrive on.
pub struct Context {
    pub storefront: Storefront<RestClient>,
    notices: mpsc::UnboundedReceiver<Notice>,
}

impl Context {
    /// Build the storefront from the environment (and `.env`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid.
    pub fn connect() -> Result<Self, Box<dyn std::error::Error>> {
        let config = StorefrontConfig::from_env()?;
        tracing::debug!(backend = %config.backend.base_url, "Loaded configuration");

        let (tx, notices) = mpsc::unbounded_channel();
        let storefront = Storefront::from_config(&config, Arc::new(tx))?;
        Ok(Self {
            storefront,
            notices,
        })
    }

    /// Print every notice received so far.
    pub fn flush_notices(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            print_notice(&notice);
        }
    }
}

#[allow(clippy::print_stderr)]
fn print_notice(notice: &Notice) {
    eprintln!("{}: {}", severity_label(notice.severity), notice.message);
}

const fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "ok",
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

/// Two decimal places with a currency sign.
pub fn format_cost(cost: Decimal) -> String {
    format!("${:.2}", cost.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(Decimal::from(100)), "$100.00");
        assert_eq!(format_cost(Decimal::new(1999, 2)), "$19.99");
        assert_eq!(format_cost(Decimal::new(12346, 3)), "$12.35");
    }

    #[test]
    fn test_severity_label() {
        assert_eq!(severity_label(Severity::Warning), "warning");
        assert_eq!(severity_label(Severity::Success), "ok");
    }
}

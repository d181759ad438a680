//! `QKart` CLI - browse the catalog and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List every product
//! qkart products
//!
//! # One-shot search
//! qkart search phone
//!
//! # Debounced search, one query per stdin line
//! qkart search --interactive
//!
//! # Cart (needs QKART_USERNAME and QKART_TOKEN)
//! qkart cart show
//! qkart cart add 5f2b0a7e --qty 2
//! qkart cart set 5f2b0a7e 3
//! ```
//!
//! The backend is read from `QKART_BACKEND_URL`; see
//! [`qkart_storefront::config`] for the other variables.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront from the command line")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the full catalog
    Products,
    /// Search the catalog by name or category
    Search {
        /// Query text
        #[arg(required_unless_present = "interactive")]
        text: Option<String>,

        /// Read queries from stdin, one per line, with debouncing
        #[arg(short, long, conflicts_with = "text")]
        interactive: bool,
    },
    /// Show or change the signed-in user's cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product that is not in the cart yet
    Add {
        /// Product id
        product_id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        qty: u32,
    },
    /// Set the quantity of a cart line
    Set {
        /// Product id
        product_id: String,

        /// New quantity
        qty: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for listings.
fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_storefront=info,qkart_cli=info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::connect()?;

    match cli.command {
        Commands::Products => commands::products::list(&mut ctx).await?,
        Commands::Search { text, interactive } => match text {
            Some(text) if !interactive => commands::search::once(&mut ctx, &text).await?,
            _ => commands::search::interactive(&mut ctx).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&mut ctx).await?,
            CartAction::Add { product_id, qty } => {
                commands::cart::add(&mut ctx, &product_id, qty).await?;
            }
            CartAction::Set { product_id, qty } => {
                commands::cart::set(&mut ctx, &product_id, qty).await?;
            }
        },
    }
    Ok(())
}

//! `qkart cart`.

use qkart_core::{CartItem, ProductId, cart_total, total_quantity};
use qkart_storefront::MutationOutcome;
use rust_decimal::Decimal;

use super::{CommandResult, Context, format_cost};

/// Print the signed-in user's cart.
///
/// # Errors
///
/// Returns an error when signed out or when loading fails.
pub async fn show(ctx: &mut Context) -> CommandResult {
    load(ctx).await?;
    print_cart(&ctx.storefront.cart_items());
    let balance = ctx.storefront.session().and_then(|session| session.balance());
    if let Some(line) = balance_line(balance, ctx.storefront.cart_total()) {
        print_line(&line);
    }
    Ok(())
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error when loading fails or the backend rejects the change.
pub async fn add(ctx: &mut Context, product_id: &str, qty: u32) -> CommandResult {
    load(ctx).await?;
    let outcome = ctx
        .storefront
        .add_to_cart(&ProductId::new(product_id), qty)
        .await;
    finish(ctx, outcome)
}

/// Set the quantity of a cart line.
///
/// # Errors
///
/// Returns an error when loading fails or the backend rejects the change.
pub async fn set(ctx: &mut Context, product_id: &str, qty: u32) -> CommandResult {
    load(ctx).await?;
    let outcome = ctx
        .storefront
        .update_quantity(&ProductId::new(product_id), qty)
        .await;
    finish(ctx, outcome)
}

async fn load(ctx: &mut Context) -> CommandResult {
    if !ctx.storefront.is_signed_in() {
        return Err("Not signed in: set QKART_USERNAME and QKART_TOKEN".into());
    }
    let loaded = ctx.storefront.load().await;
    ctx.flush_notices();
    loaded?;
    Ok(())
}

fn finish(ctx: &mut Context, outcome: MutationOutcome) -> CommandResult {
    ctx.flush_notices();
    match outcome {
        MutationOutcome::Applied(items) => {
            print_cart(&items);
            Ok(())
        }
        // A newer response was merged in the meantime.
        MutationOutcome::Stale => {
            print_cart(&ctx.storefront.cart_items());
            Ok(())
        }
        MutationOutcome::Rejected(err) => Err(err.into()),
    }
}

#[allow(clippy::print_stdout)]
fn print_cart(items: &[CartItem]) {
    for line in cart_lines(items) {
        println!("{line}");
    }
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}

/// Wallet balance, flagged when the cart costs more than it.
fn balance_line(balance: Option<Decimal>, total: Decimal) -> Option<String> {
    let balance = balance?;
    let mut line = format!("Balance: {}", format_cost(balance));
    if total > balance {
        line.push_str(" (insufficient for this cart)");
    }
    Some(line)
}

fn cart_lines(items: &[CartItem]) -> Vec<String> {
    if items.is_empty() {
        return vec!["Cart is empty".to_string()];
    }

    let mut lines: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "{:<26} {:<32} {:>4} x {:>10} = {:>10}",
                item.product_id,
                item.name,
                item.qty,
                format_cost(item.cost),
                format_cost(item.line_total()),
            )
        })
        .collect();
    lines.push(format!(
        "{} item(s), total {}",
        total_quantity(items),
        format_cost(cart_total(items)),
    ));
    lines
}

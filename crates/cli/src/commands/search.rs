//! `qkart search`.

use qkart_core::Product;
use qkart_storefront::{SearchOutcome, SearchState, SearchView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use super::products::print_products;
use super::{CommandResult, Context};

/// Run a single query immediately and print the displayed products.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn once(ctx: &mut Context, text: &str) -> CommandResult {
    let loaded = ctx.storefront.load().await;
    ctx.flush_notices();
    loaded?;

    let outcome = ctx.storefront.search_now(text).await;
    ctx.flush_notices();

    if outcome == SearchOutcome::NoMatches {
        print_no_matches();
    } else {
        print_products(&ctx.storefront.displayed());
    }
    Ok(())
}

/// Treat each stdin line as the search box's new content.
///
/// Lines arriving faster than the debounce interval coalesce; the product
/// list is printed every time the displayed set settles.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or stdin fails.
pub async fn interactive(ctx: &mut Context) -> CommandResult {
    let loaded = ctx.storefront.load().await;
    ctx.flush_notices();
    loaded?;

    let mut view = ctx.storefront.subscribe_search();
    view.mark_unchanged();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) => ctx.storefront.on_query_changed(text),
                None => break,
            },
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                if !snapshot.loading {
                    print_view(&snapshot.products);
                }
            }
        }
        ctx.flush_notices();
    }

    // Input ended while a query was still waiting out its debounce.
    if let SearchState::Pending { text } = ctx.storefront.search().state() {
        ctx.storefront.search_now(&text).await;
        print_view(&ctx.storefront.displayed());
    } else if let Some(products) = settle(&mut view).await {
        print_view(&products);
    }
    ctx.flush_notices();
    Ok(())
}

/// Wait out a search that was already sent when input ended.
///
/// Returns the settled products, or `None` if nothing was in flight.
async fn settle(view: &mut watch::Receiver<SearchView>) -> Option<Vec<Product>> {
    if !view.borrow().loading {
        return None;
    }
    let settled = view.wait_for(|snapshot| !snapshot.loading).await.ok()?;
    Some(settled.products.clone())
}

fn print_view(products: &[Product]) {
    if products.is_empty() {
        print_no_matches();
    } else {
        print_products(products);
    }
}

#[allow(clippy::print_stdout)]
fn print_no_matches() {
    println!("No products found");
}

//! `qkart products`.

use qkart_core::Product;

use super::{CommandResult, Context, format_cost};

/// Load and print the full catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn list(ctx: &mut Context) -> CommandResult {
    let loaded = ctx.storefront.load().await;
    ctx.flush_notices();
    let catalog = loaded?;

    tracing::debug!(products = catalog.len(), "Printing catalog");
    print_products(catalog.products());
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn print_products(products: &[Product]) {
    for product in products {
        println!("{}", product_line(product));
    }
}

fn product_line(product: &Product) -> String {
    let stars = usize::from(product.rating.stars());
    format!(
        "{:<26} {:<32} {:<14} {:>10}  {}",
        product.id,
        product.name,
        product.category,
        format_cost(product.cost),
        "*".repeat(stars),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use qkart_core::{ProductId, Rating};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_product_line() {
        let product = Product {
            id: ProductId::new("A"),
            name: "Phone".to_string(),
            category: "Electronics".to_string(),
            cost: Decimal::from(100),
            rating: Rating::new(3).unwrap(),
            image: String::new(),
        };

        let line = product_line(&product);

        assert!(line.starts_with("A "));
        assert!(line.contains("Phone"));
        assert!(line.contains("$100.00"));
        assert!(line.ends_with("***"));
    }
}

//! Join of server cart entries with the catalog.

use std::collections::HashMap;

use qkart_core::{CartEntry, CartItem, ProductId};

use crate::catalog::Catalog;

/// Build display items from cart entries.
///
/// - Output order follows `entries`.
/// - Entries whose product is not in the catalog are dropped.
/// - If a product id repeats, the item keeps its first position and takes
///   the quantity of the last occurrence.
///
/// Pure: identical inputs always give identical output.
#[must_use]
pub fn reconcile(entries: &[CartEntry], catalog: &Catalog) -> Vec<CartItem> {
    let mut items: Vec<CartItem> = Vec::with_capacity(entries.len());
    let mut positions: HashMap<&ProductId, usize> = HashMap::with_capacity(entries.len());

    for entry in entries {
        let Some(product) = catalog.get(entry.product_id.as_str()) else {
            tracing::debug!(product_id = %entry.product_id, "Cart entry not in catalog, skipping");
            continue;
        };

        if let Some(&position) = positions.get(&entry.product_id) {
            if let Some(item) = items.get_mut(position) {
                item.qty = entry.qty;
            }
        } else {
            positions.insert(&entry.product_id, items.len());
            items.push(CartItem::from_product(product, entry.qty));
        }
    }

    items
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::testing::{phone_and_ball, product};

    fn ids(items: &[CartItem]) -> Vec<&str> {
        items.iter().map(|item| item.product_id.as_str()).collect()
    }

    #[test]
    fn test_joins_product_data() {
        let catalog = Catalog::new(phone_and_ball());
        let items = reconcile(&[CartEntry::new("A", 2)], &catalog);

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.product_id.as_str(), "A");
        assert_eq!(item.name, "Phone");
        assert_eq!(item.cost, Decimal::from(100));
        assert_eq!(item.qty, 2);
    }

    #[test]
    fn test_preserves_entry_order() {
        let catalog = Catalog::new(vec![
            product("A", "Phone", 100),
            product("B", "Ball", 20),
            product("C", "Cap", 5),
        ]);
        let entries = [
            CartEntry::new("C", 1),
            CartEntry::new("A", 1),
            CartEntry::new("B", 1),
        ];

        assert_eq!(ids(&reconcile(&entries, &catalog)), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_drops_entries_missing_from_catalog() {
        let catalog = Catalog::new(phone_and_ball());
        let entries = [
            CartEntry::new("Z", 5),
            CartEntry::new("B", 1),
            CartEntry::new("Y", 2),
        ];

        assert_eq!(ids(&reconcile(&entries, &catalog)), vec!["B"]);
        assert!(reconcile(&[CartEntry::new("Z", 5)], &catalog).is_empty());
    }

    #[test]
    fn test_empty_catalog_yields_empty_cart() {
        let items = reconcile(&[CartEntry::new("A", 1)], &Catalog::default());
        assert!(items.is_empty());
    }

    #[test]
    fn test_duplicate_entries_last_quantity_wins() {
        let catalog = Catalog::new(phone_and_ball());
        let entries = [
            CartEntry::new("A", 1),
            CartEntry::new("B", 4),
            CartEntry::new("A", 3),
        ];

        let items = reconcile(&entries, &catalog);
        assert_eq!(ids(&items), vec!["A", "B"]);
        assert_eq!(items[0].qty, 3);
    }

    #[test]
    fn test_is_idempotent() {
        let catalog = Catalog::new(phone_and_ball());
        let entries = [CartEntry::new("B", 2), CartEntry::new("A", 1)];

        assert_eq!(reconcile(&entries, &catalog), reconcile(&entries, &catalog));
    }
}

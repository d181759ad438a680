//! Newtype IDs for type-safe entity references.
//!
//! The backend identifies entities with opaque strings (e.g. `"v4sLtEcMpzabRyfx"`).
//! Use the `define_id!` macro to wrap them so ids of different entity types
//! cannot be mixed up.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use qkart_core::define_id;
/// define_id!(SkuId);
///
/// let sku = SkuId::new("KCRwjF7lN97HnEaY");
/// assert_eq!(sku.as_str(), "KCRwjF7lN97HnEaY");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the id and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl ::core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_serializes_transparently() {
        let id = ProductId::new("BW0jAAeDJmlZCF8i");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"BW0jAAeDJmlZCF8i\"");
    }

    #[test]
    fn test_product_id_borrows_as_str() {
        let mut set = std::collections::HashSet::new();
        set.insert(ProductId::from("A"));
        assert!(set.contains("A"));
        assert!(!set.contains("B"));
    }

    #[test]
    fn test_product_id_display_honours_width() {
        assert_eq!(format!("{:<3}|", ProductId::new("A")), "A  |");
    }
}

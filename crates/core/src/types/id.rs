//! Newtype IDs for type-safe entity references.
//!
//! Commerce providers hand out opaque string identifiers (Shopify uses GIDs
//! such as `gid://shopify/Cart/abc123`). The `define_id!` macro wraps them so
//! a line item ID can never be passed where a variant ID is expected.

/// Macro to define a type-safe opaque string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use magnolia_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget = WidgetId::new("gid://shopify/Widget/1");
/// let gadget = GadgetId::new("gid://shopify/Widget/1");
///
/// assert_eq!(widget.as_str(), gadget.as_str());
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget;
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

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the identifier is blank (empty or whitespace only).
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Commerce entity IDs
define_id!(CheckoutId);
define_id!(LineItemId);
define_id!(VariantId);
define_id!(ProductId);
define_id!(CollectionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_transparently() {
        let id = CheckoutId::new("gid://shopify/Cart/abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/Cart/abc\"");
    }

    #[test]
    fn test_id_blank_detection() {
        assert!(LineItemId::new("").is_blank());
        assert!(LineItemId::new("   ").is_blank());
        assert!(!LineItemId::new("line-1").is_blank());
    }

    #[test]
    fn test_id_display_matches_inner() {
        let id = VariantId::from("variant-A");
        assert_eq!(id.to_string(), "variant-A");
        assert_eq!(String::from(id), "variant-A");
    }
}

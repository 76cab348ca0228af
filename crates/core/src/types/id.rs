//! Newtype handles for type-safe references to remote entities.
//!
//! Shopify identifies everything with opaque global IDs
//! (`gid://shopify/Cart/...`). They are never parsed; the `define_id!` macro
//! only keeps a cart handle from being passed where a line handle is expected.

/// Macro to define a type-safe opaque handle.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Accessors: `new()`, `as_str()`, `into_inner()`, `is_empty()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use verger_core::define_id;
/// define_id!(OrderHandle);
/// define_id!(ShipmentHandle);
///
/// let order = OrderHandle::new("gid://shopify/Order/1");
/// let shipment = ShipmentHandle::new("gid://shopify/Order/1");
///
/// // These are different types, so this won't compile:
/// // let _: OrderHandle = shipment;
/// assert_eq!(order.as_str(), shipment.as_str());
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
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an opaque handle.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying handle.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the handle.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the handle is blank (after trimming whitespace).
            #[must_use]
            pub fn is_empty(&self) -> bool {
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(CartId);
define_id!(CartLineId);
define_id!(MerchandiseId);
define_id!(ProductId);
define_id!(CollectionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_string() {
        let id = CartId::new("gid://shopify/Cart/abc?key=123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/Cart/abc?key=123\"");

        let parsed: CartId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_is_empty_ignores_whitespace() {
        assert!(MerchandiseId::new("").is_empty());
        assert!(MerchandiseId::new("   ").is_empty());
        assert!(!MerchandiseId::new("gid://shopify/ProductVariant/1").is_empty());
    }

    #[test]
    fn test_display() {
        let id = CartLineId::from("gid://shopify/CartLine/1");
        assert_eq!(id.to_string(), "gid://shopify/CartLine/1");
    }
}

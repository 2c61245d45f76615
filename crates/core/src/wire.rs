//! JSON bodies exchanged between the cart client and the storefront API.
//!
//! Both sides of `/api/checkout`, `/api/products` and `/api/collections`
//! share these types so the request and response shapes cannot drift.
//!
//! Request fields that the API must validate are `Option`s: a missing field
//! is reported as a 400 with a message naming it, rather than as a generic
//! deserialization failure.

use serde::{Deserialize, Serialize};

use crate::types::{
    CheckoutId, LineItemId, Quantity, VariantId,
    catalog::{Collection, Product},
    checkout::Checkout,
};

/// A variant/quantity pair to add to a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    /// Variant to add.
    pub variant_id: VariantId,
    /// Quantity to add.
    pub quantity: Quantity,
}

/// An absolute quantity for an existing line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemUpdate {
    /// Line item to update.
    pub id: LineItemId,
    /// New quantity.
    pub quantity: Quantity,
}

/// `PUT /api/checkout` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineItemsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<CheckoutId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItemInput>>,
}

/// `PATCH /api/checkout` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLineItemsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<CheckoutId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItemUpdate>>,
}

/// `DELETE /api/checkout` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLineItemsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<CheckoutId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_item_ids: Option<Vec<LineItemId>>,
}

/// Query string for lookups that take an optional handle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandleQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// Query string for `GET /api/checkout`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CheckoutId>,
}

/// `{ "checkout": … }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutEnvelope {
    pub checkout: Checkout,
}

/// `{ "product": … }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductEnvelope {
    pub product: Product,
}

/// `{ "products": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsEnvelope {
    pub products: Vec<Product>,
}

/// `{ "collection": … }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEnvelope {
    pub collection: Collection,
}

/// `{ "collections": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsEnvelope {
    pub collections: Vec<Collection>,
}

/// `{ "error": "…" }`, returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_wire_shape() {
        let request = AddLineItemsRequest {
            checkout_id: Some(CheckoutId::new("c1")),
            line_items: Some(vec![LineItemInput {
                variant_id: VariantId::new("v1"),
                quantity: Quantity::coerce(2),
            }]),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["checkoutId"], "c1");
        assert_eq!(value["lineItems"][0]["variantId"], "v1");
        assert_eq!(value["lineItems"][0]["quantity"], 2);
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let request: RemoveLineItemsRequest =
            serde_json::from_str("{}").unwrap();
        assert!(request.checkout_id.is_none());
        assert!(request.line_item_ids.is_none());
    }

    #[test]
    fn test_zero_quantity_is_rejected_on_the_wire() {
        let result = serde_json::from_str::<UpdateLineItemsRequest>(
            r#"{"checkoutId":"c","lineItems":[{"id":"l","quantity":0}]}"#,
        );
        assert!(result.is_err());
    }
}

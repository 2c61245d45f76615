//! Checkout aggregate as confirmed by the commerce provider.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::Variant;
use super::id::{CheckoutId, LineItemId, VariantId};
use super::price::{CurrencyCode, Price};

/// One variant/quantity pair within a [`Checkout`].
///
/// The variant is a display snapshot; the catalog remains the owner of
/// variant data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Provider-assigned line item ID.
    pub id: LineItemId,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Variant snapshot.
    pub variant: Variant,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_price(&self) -> Decimal {
        self.variant.price * Decimal::from(self.quantity)
    }
}

/// The server-confirmed cart.
///
/// Always replaced in full whenever a mutation succeeds; never patched field
/// by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    /// Opaque checkout ID.
    pub id: CheckoutId,
    /// Ordered line items.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Subtotal before tax and shipping.
    pub subtotal_price: Decimal,
    /// Currency of `subtotal_price`.
    #[serde(default)]
    pub currency_code: CurrencyCode,
    /// Hosted checkout URL for the payment handoff.
    pub web_url: String,
}

impl Checkout {
    /// An empty checkout, as returned by the provider right after creation.
    #[must_use]
    pub fn empty(id: CheckoutId, web_url: impl Into<String>) -> Self {
        Self {
            id,
            line_items: Vec::new(),
            subtotal_price: Decimal::ZERO,
            currency_code: CurrencyCode::default(),
            web_url: web_url.into(),
        }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.line_items
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Whether the checkout has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Look up a line item by ID.
    #[must_use]
    pub fn line_item(&self, id: &LineItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|line| &line.id == id)
    }

    /// Find the line item referencing a variant.
    #[must_use]
    pub fn line_for_variant(&self, variant_id: &VariantId) -> Option<&LineItem> {
        self.line_items
            .iter()
            .find(|line| &line.variant.id == variant_id)
    }

    /// Subtotal with currency, for display.
    #[must_use]
    pub const fn subtotal(&self) -> Price {
        Price::new(self.subtotal_price, self.currency_code)
    }
}

//! Read-only catalog entities.
//!
//! Products, variants and collections are owned by the commerce provider.
//! This application never creates or edits them; it only renders them and
//! references variants from line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CollectionId, ProductId, VariantId};

/// Product or collection image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// A purchasable SKU of a [`Product`].
///
/// Only variants with `available == true` may be added to the cart from the
/// UI. The cart state container does not re-check this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Provider variant ID.
    pub id: VariantId,
    /// Unit price, non-negative.
    pub price: Decimal,
    /// Display title (e.g. "Large / Indigo").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Variant image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Whether the variant can currently be purchased.
    #[serde(default)]
    pub available: bool,
}

impl Variant {
    /// Title suitable for display, hiding Shopify's placeholder title.
    #[must_use]
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|title| *title != "Default Title" && !title.is_empty())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Provider product ID.
    pub id: ProductId,
    /// URL slug, unique across products.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain-text description.
    #[serde(default)]
    pub description: String,
    /// Ordered product images.
    #[serde(default)]
    pub images: Vec<Image>,
    /// Ordered variants.
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Merchandising tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Product {
    /// Variants that may be added to the cart.
    pub fn available_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|variant| variant.available)
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|variant| &variant.id == id)
    }

    /// Whether any variant is purchasable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.variants.iter().any(|variant| variant.available)
    }
}

/// A curated group of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Provider collection ID.
    pub id: CollectionId,
    /// URL slug, unique across collections.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain-text description.
    #[serde(default)]
    pub description: String,
    /// Collection image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Products in the collection (first page).
    #[serde(default)]
    pub products: Vec<Product>,
}

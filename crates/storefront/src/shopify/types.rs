//! Raw Storefront API response shapes.
//!
//! These mirror the selections in [`super::queries`] field for field. Every
//! cart document selects `...CartFields`, so a single [`CartNode`] covers
//! `cart`, `cartCreate`, `cartLinesAdd`, `cartLinesUpdate` and
//! `cartLinesRemove`.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::GraphQLError;

/// Top-level GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

/// `{ nodes: [...] }` connection.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default)]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

// =============================================================================
// Shared
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: Decimal,
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub available_for_sale: bool,
    pub price: MoneyV2,
    #[serde(default)]
    pub image: Option<ImageNode>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Connection<ImageNode>,
    #[serde(default)]
    pub variants: Connection<VariantNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<ImageNode>,
    #[serde(default)]
    pub products: Connection<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: Connection<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionData {
    pub collection: Option<CollectionNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionsData {
    pub collections: Connection<CollectionNode>,
}

#[derive(Debug, Deserialize)]
pub struct ShopData {
    pub shop: ShopNode,
}

#[derive(Debug, Deserialize)]
pub struct ShopNode {
    pub name: String,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNode {
    pub id: String,
    pub checkout_url: String,
    pub cost: CartCost,
    #[serde(default)]
    pub lines: Connection<CartLineNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    pub subtotal_amount: MoneyV2,
}

#[derive(Debug, Deserialize)]
pub struct CartLineNode {
    pub id: String,
    pub quantity: u32,
    pub merchandise: VariantNode,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart: Option<CartNode>,
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

#[derive(Debug, Deserialize)]
pub struct CartUserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CartData {
    pub cart: Option<CartNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreateData {
    pub cart_create: Option<CartPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesAddData {
    pub cart_lines_add: Option<CartPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesUpdateData {
    pub cart_lines_update: Option<CartPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesRemoveData {
    pub cart_lines_remove: Option<CartPayload>,
}

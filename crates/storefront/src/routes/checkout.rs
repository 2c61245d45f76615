//! Checkout route handlers.
//!
//! The checkout ID travels in every request (query string for reads, JSON
//! body for mutations); the server keeps no cart state of its own. Every
//! successful response is the full, provider-confirmed `{ checkout }`.

use axum::{Json, extract::State, http::StatusCode};
use magnolia_core::CheckoutId;
use magnolia_core::wire::{
    AddLineItemsRequest, CheckoutEnvelope, CheckoutQuery, RemoveLineItemsRequest,
    UpdateLineItemsRequest,
};
use tracing::instrument;

use super::{ApiJson, ApiQuery};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

// =============================================================================
// Validation
// =============================================================================

fn require_checkout_id(id: Option<CheckoutId>, field: &str) -> Result<CheckoutId> {
    id.filter(|id| !id.is_blank())
        .ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

fn require_items<T>(items: Option<Vec<T>>, field: &str) -> Result<Vec<T>> {
    items
        .filter(|items| !items.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{field} must be a non-empty array")))
}

/// Reject the first blank ID in `ids`, naming its position.
fn require_ids(ids: impl Iterator<Item = (usize, bool)>, field: &str) -> Result<()> {
    for (index, blank) in ids {
        if blank {
            return Err(AppError::BadRequest(format!(
                "{field}[{index}] must not be empty"
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an empty checkout.
#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<CheckoutEnvelope>)> {
    let checkout = state.backend().create_checkout().await?;
    tracing::info!(checkout_id = %checkout.id, "Checkout created");
    Ok((StatusCode::CREATED, Json(CheckoutEnvelope { checkout })))
}

/// Fetch a checkout by ID.
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CheckoutQuery>,
) -> Result<Json<CheckoutEnvelope>> {
    let id = require_checkout_id(query.id, "id")?;
    let checkout = state.backend().checkout(&id).await?;
    Ok(Json(CheckoutEnvelope { checkout }))
}

/// Add line items to a checkout.
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddLineItemsRequest>,
) -> Result<Json<CheckoutEnvelope>> {
    let id = require_checkout_id(body.checkout_id, "checkoutId")?;
    let items = require_items(body.line_items, "lineItems")?;
    require_ids(
        items.iter().map(|item| item.variant_id.is_blank()).enumerate(),
        "lineItems.variantId",
    )?;

    add_breadcrumb("cart", "Adding line items", Some(&[("checkout_id", id.as_str())]));
    let checkout = state.backend().add_line_items(&id, items).await?;
    Ok(Json(CheckoutEnvelope { checkout }))
}

/// Set absolute quantities on existing line items.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateLineItemsRequest>,
) -> Result<Json<CheckoutEnvelope>> {
    let id = require_checkout_id(body.checkout_id, "checkoutId")?;
    let items = require_items(body.line_items, "lineItems")?;
    require_ids(
        items.iter().map(|item| item.id.is_blank()).enumerate(),
        "lineItems.id",
    )?;

    add_breadcrumb("cart", "Updating line items", Some(&[("checkout_id", id.as_str())]));
    let checkout = state.backend().update_line_items(&id, items).await?;
    Ok(Json(CheckoutEnvelope { checkout }))
}

/// Remove line items from a checkout.
#[instrument(skip(state, body))]
pub async fn remove(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RemoveLineItemsRequest>,
) -> Result<Json<CheckoutEnvelope>> {
    let id = require_checkout_id(body.checkout_id, "checkoutId")?;
    let line_item_ids = require_items(body.line_item_ids, "lineItemIds")?;
    require_ids(
        line_item_ids.iter().map(|line| line.is_blank()).enumerate(),
        "lineItemIds",
    )?;

    add_breadcrumb("cart", "Removing line items", Some(&[("checkout_id", id.as_str())]));
    let checkout = state.backend().remove_line_items(&id, line_item_ids).await?;
    Ok(Json(CheckoutEnvelope { checkout }))
}

//! Catalog browsing.

use magnolia_cart::CatalogProvider;

use super::{CommandError, render};

/// List products, or show one product and its variant IDs.
pub async fn products(
    catalog: &dyn CatalogProvider,
    handle: Option<&str>,
) -> Result<String, CommandError> {
    match handle {
        Some(handle) => Ok(render::product_detail(&catalog.product(handle).await?)),
        None => Ok(render::product_list(&catalog.products().await?)),
    }
}

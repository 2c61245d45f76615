//! Conversions from raw Storefront API shapes into `magnolia_core` types.

use magnolia_core::{
    Checkout, CheckoutId, Collection, CollectionId, CurrencyCode, Image, LineItem, LineItemId,
    Product, ProductId, Variant, VariantId,
};

use super::ShopifyError;
use super::types::{
    CartNode, CartPayload, CartUserError, CollectionNode, ImageNode, ProductNode, VariantNode,
};

fn convert_image(image: ImageNode) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}

fn convert_variant(variant: VariantNode) -> Variant {
    Variant {
        id: VariantId::new(variant.id),
        price: variant.price.amount,
        title: variant.title,
        image: variant.image.map(convert_image),
        available: variant.available_for_sale,
    }
}

pub fn convert_product(product: ProductNode) -> Product {
    Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        description: product.description,
        images: product.images.nodes.into_iter().map(convert_image).collect(),
        variants: product
            .variants
            .nodes
            .into_iter()
            .map(convert_variant)
            .collect(),
        tags: product.tags,
    }
}

pub fn convert_collection(collection: CollectionNode) -> Collection {
    Collection {
        id: CollectionId::new(collection.id),
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        image: collection.image.map(convert_image),
        products: collection
            .products
            .nodes
            .into_iter()
            .map(convert_product)
            .collect(),
    }
}

/// Map a Shopify cart onto the checkout shape the API serves.
///
/// `checkoutUrl` becomes `web_url` and `cost.subtotalAmount` becomes the
/// subtotal.
pub fn convert_cart(cart: CartNode) -> Checkout {
    Checkout {
        id: CheckoutId::new(cart.id),
        line_items: cart
            .lines
            .nodes
            .into_iter()
            .map(|line| LineItem {
                id: LineItemId::new(line.id),
                quantity: line.quantity,
                variant: convert_variant(line.merchandise),
            })
            .collect(),
        subtotal_price: cart.cost.subtotal_amount.amount,
        currency_code: CurrencyCode::from_code(&cart.cost.subtotal_amount.currency_code),
        web_url: cart.checkout_url,
    }
}

fn format_user_errors(errors: Vec<CartUserError>) -> String {
    errors
        .into_iter()
        .map(|e| match e.field {
            Some(field) if !field.is_empty() => format!("{} ({})", e.message, field.join(".")),
            _ => e.message,
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unwrap a cart mutation payload.
///
/// User errors win over a returned cart; a payload with neither is reported
/// as a GraphQL error naming `operation`.
pub fn convert_cart_payload(
    payload: Option<CartPayload>,
    operation: &str,
) -> Result<Checkout, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::graphql(format!("{operation} returned no payload")));
    };

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserError(format_user_errors(
            payload.user_errors,
        )));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::graphql(format!("{operation} returned no cart")))
}

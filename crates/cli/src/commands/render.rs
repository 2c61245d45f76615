//! Plain-text rendering of carts and catalog entries.

use magnolia_core::{Checkout, CurrencyCode, Price, Product, Variant};

fn variant_label(variant: &Variant) -> &str {
    variant.display_title().unwrap_or_else(|| variant.id.as_str())
}

/// One line per item, then the subtotal.
pub fn checkout(checkout: &Checkout) -> String {
    if checkout.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut lines = Vec::with_capacity(checkout.line_items.len() + 2);
    lines.push(format!("Cart ({} items)", checkout.item_count()));
    for item in &checkout.line_items {
        lines.push(format!(
            "  {:>2} x {}  {}  [{}]",
            item.quantity,
            variant_label(&item.variant),
            Price::new(item.line_price(), checkout.currency_code),
            item.id,
        ));
    }
    lines.push(format!("Subtotal: {}", checkout.subtotal()));
    lines.join("\n")
}

/// `handle  title  from-price`, one product per line.
pub fn product_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }

    products
        .iter()
        .map(|product| {
            let from = product
                .variants
                .iter()
                .map(|variant| variant.price)
                .min()
                .map(|amount| format!("from {}", Price::new(amount, CurrencyCode::default())))
                .unwrap_or_default();
            let sold_out = if product.is_available() { "" } else { "  (sold out)" };
            format!("{}  {}  {}{}", product.handle, product.title, from, sold_out)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title, description and every variant with its ID.
pub fn product_detail(product: &Product) -> String {
    let mut lines = vec![product.title.clone()];
    if !product.description.is_empty() {
        lines.push(product.description.clone());
    }
    lines.push(String::new());
    for variant in &product.variants {
        lines.push(format!(
            "  {}  {}  {}",
            variant.id,
            variant_label(variant),
            if variant.available {
                Price::new(variant.price, CurrencyCode::default()).to_string()
            } else {
                "sold out".to_string()
            },
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use magnolia_core::{CheckoutId, LineItem, LineItemId, ProductId, VariantId};
    use rust_decimal::Decimal;

    use super::*;

    fn variant(id: &str, price: i64, available: bool) -> Variant {
        Variant {
            id: VariantId::new(id),
            price: Decimal::from(price),
            title: Some("Default Title".to_string()),
            image: None,
            available,
        }
    }

    #[test]
    fn test_empty_cart() {
        let empty = Checkout::empty(CheckoutId::new("c1"), "https://pay.example/c1");
        assert_eq!(checkout(&empty), "Your cart is empty.");
    }

    #[test]
    fn test_cart_lines_and_subtotal() {
        let mut cart = Checkout::empty(CheckoutId::new("c1"), "https://pay.example/c1");
        cart.line_items.push(LineItem {
            id: LineItemId::new("line-1"),
            quantity: 2,
            variant: variant("v1", 12, true),
        });
        cart.subtotal_price = Decimal::from(24);

        let text = checkout(&cart);
        assert!(text.starts_with("Cart (2 items)"));
        assert!(text.contains(" 2 x v1  $24.00  [line-1]"));
        assert!(text.ends_with("Subtotal: $24.00"));
    }

    #[test]
    fn test_product_list_marks_sold_out() {
        let product = Product {
            id: ProductId::new("p1"),
            handle: "magnolia-candle".to_string(),
            title: "Magnolia Candle".to_string(),
            description: String::new(),
            images: vec![],
            variants: vec![variant("v1", 18, false), variant("v2", 12, false)],
            tags: vec![],
        };

        let text = product_list(&[product]);
        assert_eq!(text, "magnolia-candle  Magnolia Candle  from $12.00  (sold out)");
    }
}

//! GraphQL documents for the Shopify Storefront API.
//!
//! Fragments are appended to each operation with `concat!` so every document
//! is a `&'static str` assembled at compile time.

macro_rules! image_fragment {
    () => {
        r"
fragment ImageFields on Image {
  url
  altText
}
"
    };
}

macro_rules! product_fragment {
    () => {
        r"
fragment ProductFields on Product {
  id
  handle
  title
  description
  tags
  images(first: 10) {
    nodes { ...ImageFields }
  }
  variants(first: 50) {
    nodes {
      id
      title
      availableForSale
      price { amount currencyCode }
      image { ...ImageFields }
    }
  }
}
"
    };
}

macro_rules! cart_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  cost {
    subtotalAmount { amount currencyCode }
  }
  lines(first: 100) {
    nodes {
      id
      quantity
      merchandise {
        ... on ProductVariant {
          id
          title
          availableForSale
          price { amount currencyCode }
          image { ...ImageFields }
        }
      }
    }
  }
}
"
    };
}

// =============================================================================
// Catalog
// =============================================================================

/// `product(handle:)`
pub const PRODUCT_BY_HANDLE: &str = concat!(
    r"
query ProductByHandle($handle: String!) {
  product(handle: $handle) { ...ProductFields }
}
",
    product_fragment!(),
    image_fragment!()
);

/// `products(first:)`
pub const PRODUCTS: &str = concat!(
    r"
query Products($first: Int!) {
  products(first: $first) {
    nodes { ...ProductFields }
  }
}
",
    product_fragment!(),
    image_fragment!()
);

/// `collection(handle:)`
pub const COLLECTION_BY_HANDLE: &str = concat!(
    r"
query CollectionByHandle($handle: String!, $productCount: Int!) {
  collection(handle: $handle) {
    id
    handle
    title
    description
    image { ...ImageFields }
    products(first: $productCount) {
      nodes { ...ProductFields }
    }
  }
}
",
    product_fragment!(),
    image_fragment!()
);

/// `collections(first:)`
pub const COLLECTIONS: &str = concat!(
    r"
query Collections($first: Int!) {
  collections(first: $first) {
    nodes {
      id
      handle
      title
      description
      image { ...ImageFields }
    }
  }
}
",
    image_fragment!()
);

/// Cheapest query that proves the token and store are valid.
pub const SHOP: &str = r"
query Shop {
  shop { name }
}
";

// =============================================================================
// Cart
// =============================================================================

/// `cart(id:)`
pub const CART: &str = concat!(
    r"
query Cart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
",
    cart_fragment!(),
    image_fragment!()
);

/// `cartCreate`
pub const CART_CREATE: &str = concat!(
    r"
mutation CartCreate($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
    cart_fragment!(),
    image_fragment!()
);

/// `cartLinesAdd`
pub const CART_LINES_ADD: &str = concat!(
    r"
mutation CartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
    cart_fragment!(),
    image_fragment!()
);

/// `cartLinesUpdate`
pub const CART_LINES_UPDATE: &str = concat!(
    r"
mutation CartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
    cart_fragment!(),
    image_fragment!()
);

/// `cartLinesRemove`
pub const CART_LINES_REMOVE: &str = concat!(
    r"
mutation CartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
    cart_fragment!(),
    image_fragment!()
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_used_fragment_is_defined() {
        for document in [
            PRODUCT_BY_HANDLE,
            PRODUCTS,
            COLLECTION_BY_HANDLE,
            COLLECTIONS,
            CART,
            CART_CREATE,
            CART_LINES_ADD,
            CART_LINES_UPDATE,
            CART_LINES_REMOVE,
        ] {
            for fragment in ["ImageFields", "ProductFields", "CartFields"] {
                if document.contains(&format!("...{fragment}")) {
                    assert!(
                        document.contains(&format!("fragment {fragment} on")),
                        "{fragment} used but not defined in:\n{document}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cart_documents_request_user_errors() {
        for document in [CART_CREATE, CART_LINES_ADD, CART_LINES_UPDATE, CART_LINES_REMOVE] {
            assert!(document.contains("userErrors { field message }"));
        }
    }
}

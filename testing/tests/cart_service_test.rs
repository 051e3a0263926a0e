//! Cart service behavior tests.
//!
//! Exercises the stock ceiling, line merging, quantity updates against
//! shrinking stock, idempotent removal, and the self-healing read pass.
//!
//! Run with: `cargo test --test cart_service_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)] // Tests panic with context on unexpected outcomes

use std::sync::Arc;
use storefront_core::cart::{CartError, CartService};
use storefront_core::environment::Clock;
use storefront_core::types::{
    Cart, CartLine, CartLineKey, CustomerId, Product, ProductId, ProductStock,
};
use storefront_testing::helpers::{init_tracing, sized_product, unsized_product};
use storefront_testing::mocks::{test_clock, InMemoryCarts, InMemoryProducts};

struct Fixture {
    products: Arc<InMemoryProducts>,
    carts: Arc<InMemoryCarts>,
    service: CartService,
}

fn fixture() -> Fixture {
    init_tracing();
    let products = Arc::new(InMemoryProducts::new());
    let carts = Arc::new(InMemoryCarts::new());
    let service = CartService::new(products.clone(), carts.clone(), Arc::new(test_clock()));
    Fixture {
        products,
        carts,
        service,
    }
}

/// A sized shirt with `{M: 3, L: 0}`: medium nearly out, large sold out.
fn shirt() -> Product {
    sized_product("Shirt", 25, &[("M", 3), ("L", 0)])
}

#[tokio::test]
async fn sold_out_size_rejects_add() {
    let fx = fixture();
    let shirt = shirt();
    fx.products.put(shirt.clone());
    let customer = CustomerId::new();

    let err = fx
        .service
        .add_to_cart(customer, shirt.id, Some("L".to_string()), 1)
        .await
        .expect_err("L is sold out");
    let CartError::InsufficientStock {
        requested,
        available,
        in_cart,
    } = err
    else {
        panic!("expected insufficient stock, got {err}");
    };
    assert_eq!((requested, available, in_cart), (1, 0, 0));
}

#[tokio::test]
async fn merge_validates_combined_quantity() {
    let fx = fixture();
    let shirt = shirt();
    fx.products.put(shirt.clone());
    let customer = CustomerId::new();

    let view = fx
        .service
        .add_to_cart(customer, shirt.id, Some("M".to_string()), 2)
        .await
        .expect("first add fits");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);

    // Second add of 2 would put the combined line at 4 > 3 in stock.
    let err = fx
        .service
        .add_to_cart(customer, shirt.id, Some("M".to_string()), 2)
        .await
        .expect_err("combined quantity exceeds stock");
    let CartError::InsufficientStock {
        requested,
        available,
        in_cart,
    } = err
    else {
        panic!("expected insufficient stock, got {err}");
    };
    assert_eq!((requested, available, in_cart), (4, 3, 2));

    // The failed merge left the cart untouched.
    let view = fx.service.read_cart(customer).await.expect("read");
    assert_eq!(view.lines[0].quantity, 2);
}

#[tokio::test]
async fn merge_increments_within_stock() {
    let fx = fixture();
    let shirt = shirt();
    fx.products.put(shirt.clone());
    let customer = CustomerId::new();

    fx.service
        .add_to_cart(customer, shirt.id, Some("M".to_string()), 2)
        .await
        .expect("first add");
    let view = fx
        .service
        .add_to_cart(customer, shirt.id, Some("M".to_string()), 1)
        .await
        .expect("merge to exactly the stock ceiling");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 3);
    assert_eq!(view.lines[0].line_total.dollars(), 75);
    assert_eq!(view.total.dollars(), 75);
}

#[tokio::test]
async fn sizes_are_distinct_lines() {
    let fx = fixture();
    let hoodie = sized_product("Hoodie", 40, &[("M", 3), ("L", 2)]);
    fx.products.put(hoodie.clone());
    let customer = CustomerId::new();

    fx.service
        .add_to_cart(customer, hoodie.id, Some("M".to_string()), 1)
        .await
        .expect("add M");
    let view = fx
        .service
        .add_to_cart(customer, hoodie.id, Some("L".to_string()), 1)
        .await
        .expect("add L");
    assert_eq!(view.lines.len(), 2);
    assert_eq!(view.total.dollars(), 80);
}

#[tokio::test]
async fn sized_product_requires_a_size() {
    let fx = fixture();
    let shirt = shirt();
    fx.products.put(shirt.clone());

    let err = fx
        .service
        .add_to_cart(CustomerId::new(), shirt.id, None, 1)
        .await
        .expect_err("size required");
    assert!(matches!(err, CartError::SizeRequired));
}

#[tokio::test]
async fn missing_product_rejects_add() {
    let fx = fixture();
    let ghost = unsized_product("Ghost", 10, 5);
    // Never stored.
    let err = fx
        .service
        .add_to_cart(CustomerId::new(), ghost.id, None, 1)
        .await
        .expect_err("product not found");
    assert!(matches!(err, CartError::ProductNotFound(id) if id == ghost.id));
}

#[tokio::test]
async fn update_revalidates_against_current_stock() {
    let fx = fixture();
    let tee = sized_product("Tee", 15, &[("M", 5)]);
    fx.products.put(tee.clone());
    let customer = CustomerId::new();

    fx.service
        .add_to_cart(customer, tee.id, Some("M".to_string()), 1)
        .await
        .expect("add");

    let key = CartLineKey::new(tee.id, Some("M".to_string()));
    let view = fx
        .service
        .update_quantity(customer, &key, 5)
        .await
        .expect("5 fits the M stock");
    assert_eq!(view.lines[0].quantity, 5);

    let err = fx
        .service
        .update_quantity(customer, &key, 6)
        .await
        .expect_err("6 exceeds the M stock");
    assert!(matches!(
        err,
        CartError::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        }
    ));

    // Stock shrank since the line was added: the next update re-checks.
    fx.products.put(Product {
        stock: ProductStock::Sized([("M".to_string(), 2)].into_iter().collect()),
        ..tee.clone()
    });
    let err = fx
        .service
        .update_quantity(customer, &key, 4)
        .await
        .expect_err("stock shrank under the cart");
    assert!(matches!(
        err,
        CartError::InsufficientStock {
            requested: 4,
            available: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn update_rejects_zero_and_unknown_lines() {
    let fx = fixture();
    let tee = sized_product("Tee", 15, &[("M", 5)]);
    fx.products.put(tee.clone());
    let customer = CustomerId::new();
    let key = CartLineKey::new(tee.id, Some("M".to_string()));

    let err = fx
        .service
        .update_quantity(customer, &key, 0)
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, CartError::InvalidQuantity));

    let err = fx
        .service
        .update_quantity(customer, &key, 2)
        .await
        .expect_err("no such line");
    assert!(matches!(err, CartError::LineNotFound(_)));
}

#[tokio::test]
async fn removal_is_idempotent() {
    let fx = fixture();
    let mug = unsized_product("Mug", 12, 10);
    fx.products.put(mug.clone());
    let customer = CustomerId::new();

    fx.service
        .add_to_cart(customer, mug.id, None, 2)
        .await
        .expect("add");

    // Removing a line that was never added succeeds and changes nothing.
    let absent = CartLineKey::new(ProductId::new(), None);
    let view = fx
        .service
        .remove_line(customer, Some(&absent))
        .await
        .expect("idempotent removal");
    assert_eq!(view.lines.len(), 1);

    // Removing the real line empties the cart; removing it again is fine.
    let key = CartLineKey::new(mug.id, None);
    let view = fx
        .service
        .remove_line(customer, Some(&key))
        .await
        .expect("remove");
    assert!(view.lines.is_empty());
    let view = fx
        .service
        .remove_line(customer, Some(&key))
        .await
        .expect("second removal still succeeds");
    assert!(view.lines.is_empty());
}

#[tokio::test]
async fn remove_without_key_clears_the_cart() {
    let fx = fixture();
    let mug = unsized_product("Mug", 12, 10);
    let tee = sized_product("Tee", 15, &[("M", 5)]);
    fx.products.put(mug.clone());
    fx.products.put(tee.clone());
    let customer = CustomerId::new();

    fx.service
        .add_to_cart(customer, mug.id, None, 1)
        .await
        .expect("add mug");
    fx.service
        .add_to_cart(customer, tee.id, Some("M".to_string()), 1)
        .await
        .expect("add tee");

    let view = fx
        .service
        .remove_line(customer, None)
        .await
        .expect("clear");
    assert!(view.lines.is_empty());
    assert!(fx.carts.raw(&customer).is_none());
}

#[tokio::test]
async fn read_purges_dangling_and_invalid_lines() {
    let fx = fixture();
    let mug = unsized_product("Mug", 12, 10);
    let deleted = unsized_product("Gone", 9, 4);
    fx.products.put(mug.clone());
    let customer = CustomerId::new();

    // Seed a cart that references a deleted product and carries a
    // zero-quantity line, as if written by an older buggy client.
    fx.carts.seed(Cart {
        customer_id: customer,
        lines: vec![
            CartLine {
                product_id: mug.id,
                size: None,
                quantity: 2,
            },
            CartLine {
                product_id: deleted.id,
                size: None,
                quantity: 1,
            },
            CartLine {
                product_id: mug.id,
                size: Some("M".to_string()),
                quantity: 0,
            },
        ],
        updated_at: test_clock().now(),
    });

    let view = fx.service.read_cart(customer).await.expect("read");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);
    assert_eq!(view.total.dollars(), 24);

    // The repaired cart was persisted, not just filtered from the view.
    let stored = fx.carts.raw(&customer).expect("cart persisted");
    assert_eq!(stored.lines.len(), 1);
}

#[tokio::test]
async fn view_reports_current_availability() {
    let fx = fixture();
    let shirt = shirt();
    fx.products.put(shirt.clone());
    let customer = CustomerId::new();

    let view = fx
        .service
        .add_to_cart(customer, shirt.id, Some("M".to_string()), 2)
        .await
        .expect("add");
    assert_eq!(view.lines[0].available, 3);
    assert_eq!(view.lines[0].key, format!("{}-M", shirt.id));
}

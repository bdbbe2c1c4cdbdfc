//! Cart lifecycle: mutations, pricing, and persistence across restarts.

use std::sync::Arc;

use rust_decimal::Decimal;

use cityfashion_core::ProductId;
use cityfashion_core::notify::{Notifier, ToastVariant};
use cityfashion_core::storage::{FileStorage, MemoryStorage, SharedStorage};
use cityfashion_integration_tests::{init_tracing, product, temp_state_dir};
use cityfashion_storefront::cart::{CART_STORAGE_KEY, CartStore, shipping_fee};

fn memory_cart() -> (CartStore, Notifier) {
    init_tracing();
    let notifier = Notifier::new();
    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let cart = CartStore::new(storage, notifier.clone());
    cart.load();
    (cart, notifier)
}

#[tokio::test]
async fn shopping_trip_totals_stay_consistent() {
    let (cart, _notifier) = memory_cart();

    assert!(cart.add_item(&product(1, 600, Some(5)), 1));
    assert!(cart.add_item(&product(2, 1000, Some(5)), 2));

    // 600 + 2000 = 2600 lands in the 2500..=3500 tier.
    assert_eq!(cart.subtotal(), Decimal::from(2600));
    assert_eq!(cart.shipping_fee(), Decimal::from(200));
    assert_eq!(cart.total(), Decimal::from(2800));

    // Total always equals subtotal + fee, whatever the cart does next.
    cart.update_quantity(ProductId::new(2), 1);
    assert_eq!(cart.total(), cart.subtotal() + shipping_fee(cart.subtotal()));

    cart.remove_item(ProductId::new(1));
    assert_eq!(cart.total(), cart.subtotal() + shipping_fee(cart.subtotal()));
}

#[tokio::test]
async fn repeated_adds_keep_one_line_per_product() {
    let (cart, _notifier) = memory_cart();

    for _ in 0..4 {
        assert!(cart.add_item(&product(7, 250, Some(10)), 2));
    }

    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 8);
    assert_eq!(cart.count(), 8);
}

#[tokio::test]
async fn over_stock_add_is_rejected_with_one_error_toast() {
    let (cart, notifier) = memory_cart();

    assert!(!cart.add_item(&product(5, 100, Some(2)), 3));

    assert!(cart.items().is_empty());
    let toasts = notifier.snapshot();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].variant, ToastVariant::Error);
}

#[tokio::test]
async fn stock_refresh_caps_existing_quantity() {
    let (cart, _notifier) = memory_cart();
    cart.add_item(&product(9, 400, Some(4)), 4);

    cart.update_item_stock(ProductId::new(9), Some(2));

    let items = cart.items();
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].stock, Some(2));
}

#[tokio::test]
async fn cart_survives_restart_with_order_intact() {
    init_tracing();
    let dir = temp_state_dir();
    let notifier = Notifier::new();

    let before = {
        let storage: SharedStorage = Arc::new(FileStorage::open(&dir).expect("open state dir"));
        let cart = CartStore::new(storage, notifier.clone());
        cart.load();
        cart.add_item(&product(3, 300, None), 1);
        cart.add_item(&product(1, 100, None), 2);
        cart.add_item(&product(2, 200, Some(9)), 3);
        cart.items()
    };

    // A new process: fresh store over the same directory.
    let storage: SharedStorage = Arc::new(FileStorage::open(&dir).expect("reopen state dir"));
    let cart = CartStore::new(storage, Notifier::new());
    cart.load();

    assert_eq!(cart.items(), before, "line items and their order survive");
    assert_eq!(cart.count(), 6);
    assert!(
        !cart.drawer_open(),
        "the drawer flag is ephemeral and must not survive"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn mutations_before_load_never_clobber_persisted_state() {
    init_tracing();
    let storage = Arc::new(MemoryStorage::new());
    {
        let seeded = CartStore::new(Arc::clone(&storage) as SharedStorage, Notifier::new());
        seeded.load();
        seeded.add_item(&product(4, 750, None), 1);
    }

    // Second store over the same storage, mutated before load().
    let cart = CartStore::new(Arc::clone(&storage) as SharedStorage, Notifier::new());
    cart.clear();

    let reloaded = CartStore::new(Arc::clone(&storage) as SharedStorage, Notifier::new());
    reloaded.load();
    assert_eq!(reloaded.count(), 1, "pre-load clear must not reach storage");
}

#[tokio::test]
async fn clear_after_confirmed_payment_empties_everything() {
    let (cart, notifier) = memory_cart();
    cart.add_item(&product(1, 1500, Some(3)), 2);
    cart.open_drawer();

    // The checkout flow calls this once the gateway confirms.
    cart.clear();

    assert!(cart.items().is_empty());
    assert!(!cart.drawer_open());
    assert_eq!(cart.subtotal(), Decimal::ZERO);
    assert_eq!(
        notifier.snapshot().last().map(|t| t.variant),
        Some(ToastVariant::Info)
    );
}

#[tokio::test]
async fn three_stores_share_storage_without_interference() {
    init_tracing();
    let storage = Arc::new(MemoryStorage::new());

    let cart = CartStore::new(Arc::clone(&storage) as SharedStorage, Notifier::new());
    cart.load();
    cart.add_item(&product(1, 999, None), 1);

    // Unrelated keys in the same storage are untouched by cart writes.
    use cityfashion_core::storage::Storage;
    storage
        .set("cityfashion_auth_v1", r#"{"token":"tok","user":null}"#)
        .expect("seed session key");

    cart.clear();

    assert_eq!(
        storage.get("cityfashion_auth_v1").expect("read").as_deref(),
        Some(r#"{"token":"tok","user":null}"#)
    );
    assert_eq!(
        storage.get(CART_STORAGE_KEY).expect("read").as_deref(),
        Some("[]")
    );
}

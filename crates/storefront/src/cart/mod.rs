//! The shopping cart store.
//!
//! Single source of truth for the cart: one line per product, quantities
//! bounded by the last-known stock, totals recomputed on every read, and
//! the line items persisted under a fixed storage key as soon as the
//! initial load has run. The drawer flag (the slide-over cart preview) is
//! deliberately ephemeral.
//!
//! Stock/removal events surface through the shared [`Notifier`]; quantity
//! edits stay silent.

mod pricing;

pub use pricing::{
    free_shipping_progress, free_shipping_remaining, free_shipping_threshold, shipping_fee,
};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use cityfashion_core::ProductId;
use cityfashion_core::notify::Notifier;
use cityfashion_core::storage::SharedStorage;

use crate::api::{Product, StoreClient};

/// Storage key for the persisted cart.
pub const CART_STORAGE_KEY: &str = "cityfashion_cart_v1";

/// One row in the cart: a product and its requested quantity.
///
/// Display fields are snapshotted at add-time and not re-synced; `stock`
/// alone is refreshed against the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unit price in rupees, snapshotted at add-time.
    pub price: Decimal,
    /// Always >= 1 while the row exists; a row at 0 is removed instead.
    pub quantity: u32,
    /// Last-known inventory; `None` means unknown / unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl CartLineItem {
    fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            slug: product.slug.clone(),
            image: product.primary_image().map(str::to_owned),
            price: product.price,
            quantity,
            stock: product.stock,
        }
    }

    /// `price * quantity` for this row.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

struct CartState {
    items: Vec<CartLineItem>,
    drawer_open: bool,
    /// Set by `load()`; until then writes are suppressed so an empty
    /// default can never clobber the persisted cart during startup.
    hydrated: bool,
    version: u64,
}

struct CartStoreInner {
    storage: SharedStorage,
    key: String,
    notifier: Notifier,
    state: Mutex<CartState>,
    changed: watch::Sender<u64>,
}

/// Handle to the cart store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

impl CartStore {
    /// Create a cart persisting under [`CART_STORAGE_KEY`].
    #[must_use]
    pub fn new(storage: SharedStorage, notifier: Notifier) -> Self {
        Self::with_key(storage, notifier, CART_STORAGE_KEY)
    }

    /// Create a cart with a custom storage key (tests).
    #[must_use]
    pub fn with_key(storage: SharedStorage, notifier: Notifier, key: impl Into<String>) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                key: key.into(),
                notifier,
                state: Mutex::new(CartState {
                    items: Vec::new(),
                    drawer_open: false,
                    hydrated: false,
                    version: 0,
                }),
                changed,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the persisted cart and enable write-through.
    ///
    /// Malformed persisted data is logged and treated as an empty cart;
    /// this never fails.
    pub fn load(&self) {
        let items = match self.inner.storage.get(&self.inner.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(key = %self.inner.key, error = %err, "failed to parse persisted cart");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(key = %self.inner.key, error = %err, "failed to load persisted cart");
                Vec::new()
            }
        };

        let mut state = self.lock();
        state.items = items;
        state.hydrated = true;
        self.touch(&mut state);
    }

    /// Whether the initial load has run.
    #[must_use]
    pub fn hydrated(&self) -> bool {
        self.lock().hydrated
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Add `quantity` of `product`, merging into an existing line.
    ///
    /// When the combined quantity would exceed the product's known stock
    /// the cart is left untouched, a "limited stock" toast is raised, and
    /// `false` is returned. On success the drawer opens and a success
    /// toast is raised.
    pub fn add_item(&self, product: &Product, quantity: u32) -> bool {
        let quantity = quantity.max(1);
        {
            let mut state = self.lock();
            let current_qty = state
                .items
                .iter()
                .find(|item| item.id == product.id)
                .map_or(0, |item| item.quantity);

            if let Some(stock) = product.stock
                && current_qty + quantity > stock
            {
                drop(state);
                self.inner
                    .notifier
                    .error(format!("Only {stock} left in stock. Adjust quantity."));
                return false;
            }

            match state.items.iter().position(|item| item.id == product.id) {
                Some(index) => {
                    if let Some(item) = state.items.get_mut(index) {
                        item.quantity += quantity;
                        item.stock = product.stock;
                    }
                }
                None => state
                    .items
                    .push(CartLineItem::from_product(product, quantity)),
            }
            state.drawer_open = true;
            self.persist(&state);
            self.touch(&mut state);
        }

        self.inner.notifier.success("Added to cart");
        true
    }

    /// Set the quantity of a line, clamping to its known stock. Zero (or
    /// a clamp that reaches zero) removes the line. Silent; no-op for an
    /// unknown id.
    pub fn update_quantity(&self, id: ProductId, quantity: u32) {
        let mut state = self.lock();
        let Some(index) = state.items.iter().position(|item| item.id == id) else {
            return;
        };
        let capped = state.items.get_mut(index).map_or(0, |item| {
            let capped = item.stock.map_or(quantity, |stock| quantity.min(stock));
            item.quantity = capped;
            capped
        });
        if capped == 0 {
            state.items.remove(index);
        }
        self.persist(&state);
        self.touch(&mut state);
    }

    /// Refresh the stock snapshot of a line from the live catalog, capping
    /// the quantity when it now exceeds the stock (removing the line when
    /// the cap reaches zero). Silent; no-op for an unknown id.
    pub fn update_item_stock(&self, id: ProductId, stock: Option<u32>) {
        let mut state = self.lock();
        let Some(index) = state.items.iter().position(|item| item.id == id) else {
            return;
        };
        let remaining = state.items.get_mut(index).map_or(1, |item| {
            item.stock = stock;
            if let Some(stock) = stock {
                item.quantity = item.quantity.min(stock);
            }
            item.quantity
        });
        if remaining == 0 {
            state.items.remove(index);
        }
        self.persist(&state);
        self.touch(&mut state);
    }

    /// Remove a line unconditionally.
    pub fn remove_item(&self, id: ProductId) {
        {
            let mut state = self.lock();
            state.items.retain(|item| item.id != id);
            self.persist(&state);
            self.touch(&mut state);
        }
        self.inner.notifier.info("Removed from cart");
    }

    /// Empty the cart and close the drawer.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            state.items.clear();
            state.drawer_open = false;
            self.persist(&state);
            self.touch(&mut state);
        }
        self.inner.notifier.info("Cart cleared");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Drawer flag (ephemeral, never persisted)
    // ─────────────────────────────────────────────────────────────────────

    pub fn open_drawer(&self) {
        let mut state = self.lock();
        state.drawer_open = true;
        self.touch(&mut state);
    }

    pub fn close_drawer(&self) {
        let mut state = self.lock();
        state.drawer_open = false;
        self.touch(&mut state);
    }

    pub fn toggle_drawer(&self) {
        let mut state = self.lock();
        state.drawer_open = !state.drawer_open;
        self.touch(&mut state);
    }

    #[must_use]
    pub fn drawer_open(&self) -> bool {
        self.lock().drawer_open
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads (derived values recomputed on every call)
    // ─────────────────────────────────────────────────────────────────────

    /// Snapshot of the lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lock().items.clone()
    }

    /// Product ids currently in the cart, sorted.
    #[must_use]
    pub fn item_ids(&self) -> Vec<ProductId> {
        let state = self.lock();
        let mut ids: Vec<ProductId> = state.items.iter().map(|item| item.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Total units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lock().items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of `price * quantity` over all lines, in rupees.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lock()
            .items
            .iter()
            .map(CartLineItem::line_total)
            .sum()
    }

    /// Delivery fee for the current subtotal.
    #[must_use]
    pub fn shipping_fee(&self) -> Decimal {
        pricing::shipping_fee(self.subtotal())
    }

    /// `subtotal + shipping_fee`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let subtotal = self.subtotal();
        subtotal + pricing::shipping_fee(subtotal)
    }

    /// Watch channel bumped on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changed.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stock reconciliation
    // ─────────────────────────────────────────────────────────────────────

    /// Refresh the stock snapshots of every line from the live catalog.
    ///
    /// If the cart's id set changes while the fetch is in flight the
    /// response is discarded wholesale; a refresh keyed on a stale item
    /// set must not touch the new cart. Fetch failures are logged and
    /// left for the next natural trigger.
    pub async fn refresh_stock(&self, client: &StoreClient) {
        let requested = self.item_ids();
        if requested.is_empty() {
            return;
        }
        match client.products_by_ids(&requested).await {
            Ok(products) => self.apply_stock_refresh(&requested, &products),
            Err(err) => {
                tracing::warn!(error = %err, "failed to refresh cart stock");
            }
        }
    }

    fn apply_stock_refresh(&self, requested: &[ProductId], products: &[Product]) {
        if self.item_ids() != requested {
            tracing::debug!("cart changed during stock refresh; discarding response");
            return;
        }
        for product in products {
            self.update_item_stock(product.id, product.stock);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────

    /// Write-through for the line items, serialized with the state change
    /// by running under the same lock. Suppressed until `load()` has run;
    /// failures are logged and the in-memory cart stays authoritative.
    fn persist(&self, state: &CartState) {
        if !state.hydrated {
            return;
        }
        let raw = match serde_json::to_string(&state.items) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key = %self.inner.key, error = %err, "failed to encode cart");
                return;
            }
        };
        if let Err(err) = self.inner.storage.set(&self.inner.key, &raw) {
            tracing::warn!(key = %self.inner.key, error = %err, "failed to persist cart");
        }
    }

    fn touch(&self, state: &mut CartState) {
        state.version += 1;
        self.inner.changed.send_replace(state.version);
    }
}

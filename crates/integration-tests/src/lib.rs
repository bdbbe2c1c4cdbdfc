//! Integration tests for the CityFashion client crates.
//!
//! The suites drive the real stores end to end against in-memory and
//! file-backed storage, with the network seam replaced by scripted
//! [`ScriptedBackend`] responses. No server is required.
//!
//! # Test Categories
//!
//! - `cart_flow` - cart mutations, pricing, persistence across restarts
//! - `session_flow` - login/hydration/logout lifecycles for both session
//!   kinds, and key isolation between the three stores

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;

use cityfashion_core::ProductId;
use cityfashion_core::session::{AuthBackend, ProfileError};
use cityfashion_storefront::api::{Product, ProductImage};

/// Install a compact tracing subscriber honouring `RUST_LOG`. Safe to call
/// from every test; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

/// A fresh, unique directory for file-backed storage tests.
#[must_use]
pub fn temp_state_dir() -> PathBuf {
    std::env::temp_dir().join(format!("cityfashion-it-{}", uuid::Uuid::new_v4()))
}

/// Catalog product fixture.
#[must_use]
pub fn product(id: i64, price: i64, stock: Option<u32>) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        slug: format!("product-{id}"),
        description: None,
        price: Decimal::from(price),
        stock,
        rating: None,
        category: None,
        product_images: vec![ProductImage {
            url: format!("https://cdn.cityfashion.in/p/{id}.jpg"),
        }],
    }
}

/// Scripted auth backend: pops one canned response per profile fetch and
/// counts revocations. Stands in for the storefront/admin API clients at
/// the [`AuthBackend`] seam.
pub struct ScriptedBackend<P> {
    responses: Mutex<Vec<Result<P, ProfileError>>>,
    fetches: AtomicUsize,
    revokes: AtomicUsize,
}

impl<P> ScriptedBackend<P> {
    #[must_use]
    pub fn new(responses: Vec<Result<P, ProfileError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fetches: AtomicUsize::new(0),
            revokes: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn revokes(&self) -> usize {
        self.revokes.load(Ordering::SeqCst)
    }
}

impl<P> AuthBackend for ScriptedBackend<P>
where
    P: Clone + serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
{
    type Profile = P;

    async fn fetch_profile(&self, _token: &str) -> Result<P, ProfileError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if responses.is_empty() {
            return Err(ProfileError::Transient("no scripted response".into()));
        }
        responses.remove(0)
    }

    async fn revoke(&self, _token: &str) -> Result<(), ProfileError> {
        self.revokes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//! CityFashion storefront client.
//!
//! State and API orchestration for the shopper-facing side of the store.
//! All business rules (inventory, pricing, payment capture) live in the
//! CityFashion API; this crate is the typed client state over it:
//!
//! - [`cart`] - the shopping cart store: stock-aware mutations, derived
//!   totals, tiered shipping, persistence
//! - [`auth`] - the shopper session (Google OAuth redirect flow)
//! - [`api`] - typed REST client for the storefront endpoints
//! - [`config`] - environment-driven configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use cityfashion_core::{notify::Notifier, storage::FileStorage};
//! use cityfashion_storefront::{api::StoreClient, auth, cart::CartStore, config::StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let storage = Arc::new(FileStorage::open(&config.state_dir)?);
//! let client = StoreClient::new(&config);
//! let notifier = Notifier::new();
//!
//! let session = auth::shopper_session(client.clone(), Arc::clone(&storage) as _);
//! session.load();
//!
//! let cart = CartStore::new(Arc::clone(&storage) as _, notifier.clone());
//! cart.load();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;

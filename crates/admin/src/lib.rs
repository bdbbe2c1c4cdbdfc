//! CityFashion admin client.
//!
//! Back-office state and API client: credential login, the persisted admin
//! session, and the management endpoints (products, categories, hero
//! slides, orders, customers, stats, image upload). The heavy lifting -
//! validation, inventory, payment state - happens in the API; this crate
//! is the typed surface over it.
//!
//! The admin session is entirely separate from the shopper session: its
//! own storage key, its own endpoints, its own lifecycle.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;

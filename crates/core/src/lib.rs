//! CityFashion Core - shared types and client state plumbing.
//!
//! This crate provides the pieces used by both CityFashion client crates:
//! - `storefront` - shopper-facing cart, session, and catalog client
//! - `admin` - back-office session and management API client
//!
//! # Architecture
//!
//! The core crate contains types, traits, and the generic state stores - no
//! HTTP. Network access is abstracted behind the [`session::AuthBackend`]
//! trait so the stores can be driven by real API clients in the leaf crates
//! and by scripted stubs in tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money formatting, and shared status enums
//! - [`storage`] - Durable key-value storage (the localStorage analog)
//! - [`session`] - Generic persisted auth session with lazy profile hydration
//! - [`notify`] - Fire-and-forget, auto-expiring user-facing notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod notify;
pub mod session;
pub mod storage;
pub mod types;

pub use types::*;

//! Core types for CityFashion.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{format_inr, format_short_date};
pub use status::OrderStatus;

//! Core domain types for the Dermastore commerce platform.
//!
//! This crate defines the backend-neutral domain model shared by every
//! provider implementation: catalog entities, carts, customers, orders
//! and the common error taxonomy. It contains no I/O and no provider
//! specifics, so it can be depended on from any binary or test crate
//! without pulling in an HTTP stack.
//!
//! # Architecture
//!
//! - **`types`**: plain data types (products, categories, carts, orders)
//! - **`error`**: the [`ApiError`] taxonomy every provider maps into
//!
//! All monetary values use [`rust_decimal::Decimal`] via [`types::Price`];
//! floating point never touches money.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;

//! Xeno Armory Core - Shared types library.
//!
//! This crate provides common types used across all Xeno Armory client
//! components:
//! - `client` - API client library (cart, catalog, checkout, admin)
//! - `cli` - Command-line front-end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere, including inside test
//! scaffolding.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, credit amounts, roles,
//!   and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

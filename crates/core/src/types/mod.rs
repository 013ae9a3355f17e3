//! Core types for the Xeno Armory client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credits;
pub mod id;
pub mod status;

pub use credits::Credits;
pub use id::*;
pub use status::{OrderStatus, Role};

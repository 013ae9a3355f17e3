//! Command implementations, one module per surface.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;

/// Boxed error alias for command results.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

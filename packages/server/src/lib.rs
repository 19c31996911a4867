// Reachline - Publishing Pipeline Core
//
// This crate implements the autonomous publishing pipeline: the publish
// scheduler that advances content items through their lifecycle, the
// keyword-triggered automation engine, and the webhook dispatcher.
//
// Route handlers, auth, and the UI live elsewhere; external services are
// consumed through the trait contracts in kernel/traits.rs.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;

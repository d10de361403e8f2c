//! Centralized error handling for the gateway.
//!
//! Unifies error reporting across the proxy, registry, control-plane and
//! session/OAuth layers so every surface maps onto the taxonomy in spec.md §7.

pub mod types;

pub use types::*;

//! Domain types and persistence ports for the checkout workspace.
//!
//! Nothing in this crate does I/O. The `domain` module holds the entities
//! and the pricing math that belongs to them; `ports` holds the traits the
//! adapter crate implements.

pub mod domain;
pub mod ports;

//! checkout-hex: hexagonal checkout API library (core + inbound HTTP)

pub mod config;
pub mod errors;

pub mod application;
pub mod outbound;

pub use checkout_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)

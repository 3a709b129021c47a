//! Application Layer
//!
//! Orchestrates the cart domain against the ports it depends on.
//!
//! - `ports`: Interfaces for external systems (document store)
//! - `services`: The cart store
//! - `context`: Per-call cancellation and deadlines

pub mod context;
pub mod ports;
pub mod services;

//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `persistence/`: document store gateways (in-memory, Turso)
//! - `config/`: dependency injection container

pub mod config;
pub mod persistence;

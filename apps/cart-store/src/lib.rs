// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value
    )
)]

//! Cart Store - Rust Core Library
//!
//! Per-user shopping cart backed by a document store.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: cart identifiers, line items, typed filters, errors
//!   - `cart`: `CartItem`, `CartKey`, `CartFilter`, `CartContents`, `QuantityPolicy`
//!
//! - **Application**: the cart store and the ports it consumes
//!   - `ports`: `DocumentGatewayPort`, `DocumentCursor`
//!   - `services`: `CartStore` (`add_item`, `remove_item`, `list_items`)
//!   - `context`: per-call cancellation and deadlines
//!
//! - **Infrastructure**: adapters
//!   - `persistence`: in-memory and Turso document gateways
//!   - `config`: dependency injection container

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Cart model with no external dependencies.
pub mod domain;

/// Application layer - Cart store and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::context::OperationContext;
pub use application::ports::{Document, DocumentCursor, DocumentGatewayPort};
pub use application::services::{CartPolicy, CartStore};
pub use domain::cart::{
    CartContents, CartError, CartField, CartFilter, CartItem, CartKey, Collection, Filter,
    GatewayError, ProductId, Quantity, QuantityPolicy, UserId,
};
pub use infrastructure::config::Container;
pub use infrastructure::persistence::{InMemoryDocumentGateway, TursoDocumentGateway};

//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems.

mod document_gateway_port;

pub use document_gateway_port::{DocumentCursor, DocumentGatewayPort, VecCursor};
pub use crate::domain::cart::{Collection, Document, Filter, GatewayError};

#[cfg(test)]
pub use document_gateway_port::MockDocumentGatewayPort;

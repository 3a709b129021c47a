//! Persistence Adapters
//!
//! Document store implementations of `DocumentGatewayPort`.

pub mod in_memory;
pub mod turso_gateway;

use std::sync::Arc;

use tracing::info;

pub use in_memory::InMemoryDocumentGateway;
pub use turso_gateway::TursoDocumentGateway;

use crate::application::ports::{DocumentGatewayPort, GatewayError};
use crate::config::{PersistenceBackend, PersistenceConfig};

/// Connect the gateway selected by `config.backend`.
///
/// # Errors
///
/// Returns an error if the selected store cannot be opened or pinged.
pub async fn connect_gateway(
    config: &PersistenceConfig,
) -> Result<Arc<dyn DocumentGatewayPort>, GatewayError> {
    let gateway: Arc<dyn DocumentGatewayPort> = match config.backend {
        PersistenceBackend::Memory => {
            info!("Using in-memory document store");
            Arc::new(InMemoryDocumentGateway::new())
        }
        PersistenceBackend::Turso => Arc::new(TursoDocumentGateway::from_config(config).await?),
    };
    gateway.ping().await?;
    Ok(gateway)
}

//! Dependency Injection Container
//!
//! Builds the document gateway named in the configuration and hands out
//! cart stores bound to it.

use std::sync::Arc;

use crate::application::ports::{DocumentGatewayPort, GatewayError};
use crate::application::services::{CartPolicy, CartStore};
use crate::config::Config;
use crate::infrastructure::persistence::connect_gateway;

/// Dependency injection container.
///
/// Holds the single gateway handle of the process. Every cart store it
/// creates shares that handle.
pub struct Container {
    gateway: Arc<dyn DocumentGatewayPort>,
    policy: CartPolicy,
}

impl Container {
    /// Create a container around an existing gateway.
    pub fn new(gateway: Arc<dyn DocumentGatewayPort>, policy: CartPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Connect the configured gateway and capture the cart policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot connect.
    pub async fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let gateway = connect_gateway(&config.persistence).await?;
        Ok(Self::new(gateway, config.cart.to_policy()))
    }

    /// Get the gateway.
    pub fn gateway(&self) -> Arc<dyn DocumentGatewayPort> {
        Arc::clone(&self.gateway)
    }

    /// Create a `CartStore` bound to the container's gateway.
    pub fn cart_store(&self) -> CartStore<dyn DocumentGatewayPort> {
        CartStore::with_policy(Arc::clone(&self.gateway), self.policy)
    }
}

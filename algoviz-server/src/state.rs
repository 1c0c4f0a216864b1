//! Shared application state for the server.

use std::sync::Arc;

use algoviz::hub::{self, HubHandle};
use algoviz::io::config::AppConfig;
use algoviz::orchestrator::{ExecutionLimits, Orchestrator};
use algoviz::registry::Registry;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub orchestrator: Arc<Orchestrator>,
    /// Fan-out point for WebSocket and SSE clients.
    pub hub: HubHandle,
}

impl AppState {
    /// Build the registry, start the hub and wire the orchestrator to both.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: &AppConfig) -> Self {
        let registry = Arc::new(Registry::with_builtin());
        let hub = hub::spawn(config.hub.subscriber_queue_capacity);
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&registry),
            hub.clone(),
            ExecutionLimits::from(&config.executions),
        ));
        Self {
            registry,
            orchestrator,
            hub,
        }
    }
}

use std::sync::Arc;
use tracemoe_core::{Config, SearchOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<SearchOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<SearchOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &SearchOrchestrator {
        self.orchestrator.as_ref()
    }
}

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::DataStore;

/// Shared application state: the remote store handle and loaded config.
/// Both are read-only after startup; there is no per-request shared mutable
/// state anywhere in this crate.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

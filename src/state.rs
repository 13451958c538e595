use crate::config::Config;
use crate::store::EventStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared by every handler. The mutex serializes mutations, so at most one
/// save is in flight at a time.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<Mutex<EventStore>>,
}

impl AppState {
    pub fn new(config: Config, store: EventStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
        }
    }
}

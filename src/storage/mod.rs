pub mod local;
pub mod remote;

pub use local::LocalStore;
pub use remote::RemoteStore;

use crate::config::StorageConfig;
use crate::errors::{Result, StoreError};
use crate::models::Snapshot;
use tracing::warn;

/// Where the event log is kept.
#[derive(Debug, Clone)]
pub enum Persistence {
    Local(LocalStore),
    Remote(RemoteStore),
    /// Remote mode without usable credentials; every call fails.
    Unconfigured(String),
}

impl Persistence {
    pub fn from_config(config: &StorageConfig) -> Self {
        match config {
            StorageConfig::Local { path } => Persistence::Local(LocalStore::new(path)),
            StorageConfig::Remote(remote) => match RemoteStore::new(remote) {
                Ok(store) => Persistence::Remote(store),
                Err(err) => {
                    warn!(error = %err, "remote storage unavailable");
                    let reason = match err {
                        StoreError::ConfigurationMissing(reason) => reason,
                        other => other.to_string(),
                    };
                    Persistence::Unconfigured(reason)
                }
            },
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Persistence::Local(_) => "local",
            Persistence::Remote(_) | Persistence::Unconfigured(_) => "remote",
        }
    }

    pub async fn load(&self) -> Result<Snapshot> {
        match self {
            Persistence::Local(store) => store.load().await,
            Persistence::Remote(store) => store.load().await,
            Persistence::Unconfigured(reason) => {
                Err(StoreError::ConfigurationMissing(reason.clone()))
            }
        }
    }

    /// Persists `snapshot` and returns the revision the backend assigned.
    pub async fn save(&self, snapshot: &Snapshot, message: &str) -> Result<Option<String>> {
        match self {
            Persistence::Local(store) => store.save(snapshot).await,
            Persistence::Remote(store) => store.save(snapshot, message).await,
            Persistence::Unconfigured(reason) => {
                Err(StoreError::ConfigurationMissing(reason.clone()))
            }
        }
    }
}

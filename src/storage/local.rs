use crate::errors::Result;
use crate::models::Snapshot;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Whole-file JSON store: `{"entries": [...], "revision": null}`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Snapshot> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                let mut snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                snapshot.revision = None;
                debug!(path = %self.path.display(), entries = snapshot.entries.len(), "loaded local data");
                Ok(snapshot)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no data file yet, starting empty");
                Ok(Snapshot::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<Option<String>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let document = Snapshot {
            entries: snapshot.entries.clone(),
            revision: None,
        };
        let payload = serde_json::to_vec_pretty(&document)?;
        fs::write(&self.path, payload).await?;
        Ok(None)
    }
}

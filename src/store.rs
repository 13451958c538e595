use crate::errors::{Result, StoreError};
use crate::models::{Category, Event, Snapshot};
use crate::storage::Persistence;
use chrono::{DateTime, Utc};
use tracing::info;

/// The in-memory event log and the backend that persists it.
///
/// Mutations build a candidate snapshot, persist it, and only then replace
/// the visible one, so a failed save never leaves a partial change behind.
/// A store whose initial load failed refuses writes until a reload succeeds,
/// since saving its empty snapshot would overwrite the persisted log.
#[derive(Debug)]
pub struct EventStore {
    backend: Persistence,
    snapshot: Snapshot,
    last_id: i64,
    load_error: Option<String>,
}

impl EventStore {
    pub fn new(backend: Persistence) -> Self {
        Self {
            backend,
            snapshot: Snapshot::default(),
            last_id: 0,
            load_error: None,
        }
    }

    /// An empty store for a backend that could not be read. Reads work,
    /// writes fail with `Unloaded` until `reload` succeeds.
    pub fn unloaded(backend: Persistence, err: &StoreError) -> Self {
        Self {
            load_error: Some(err.to_string()),
            ..Self::new(backend)
        }
    }

    pub async fn open(backend: Persistence) -> Result<Self> {
        let mut store = Self::new(backend);
        store.reload().await?;
        Ok(store)
    }

    /// Replaces the in-memory snapshot with the persisted one.
    pub async fn reload(&mut self) -> Result<usize> {
        let snapshot = self.backend.load().await?;
        info!(
            mode = self.backend.mode(),
            entries = snapshot.entries.len(),
            revision = ?snapshot.revision,
            "loaded event log"
        );
        self.snapshot = snapshot;
        self.load_error = None;
        Ok(self.snapshot.entries.len())
    }

    pub fn is_loaded(&self) -> bool {
        self.load_error.is_none()
    }

    pub fn backend(&self) -> &Persistence {
        &self.backend
    }

    pub fn list(&self) -> &[Event] {
        &self.snapshot.entries
    }

    pub fn revision(&self) -> Option<&str> {
        self.snapshot.revision.as_deref()
    }

    /// All entries, newest first; ties fall back to id order.
    pub fn newest_first(&self) -> Vec<Event> {
        let mut entries = self.snapshot.entries.clone();
        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        entries
    }

    pub async fn add(&mut self, category: Category) -> Result<Event> {
        self.add_at(category, Utc::now()).await
    }

    pub async fn add_at(&mut self, category: Category, now: DateTime<Utc>) -> Result<Event> {
        if !category.is_known() {
            return Err(StoreError::Validation(format!("unknown category '{category}'")));
        }
        self.ensure_loaded()?;

        let id = self.next_id(now);
        let event = Event {
            id: id.to_string(),
            timestamp: now,
            category,
        };
        let mut entries = self.snapshot.entries.clone();
        entries.push(event.clone());

        self.commit(entries, &format!("Log {}", event.category)).await?;
        self.last_id = id;
        info!(id = %event.id, category = %event.category, "logged entry");
        Ok(event)
    }

    /// Returns false, without touching storage, when `id` is unknown.
    pub async fn remove(&mut self, id: &str) -> Result<bool> {
        self.ensure_loaded()?;
        let Some(position) = self.snapshot.entries.iter().position(|event| event.id == id) else {
            return Ok(false);
        };
        let mut entries = self.snapshot.entries.clone();
        entries.remove(position);

        self.commit(entries, &format!("Remove entry {id}")).await?;
        info!(%id, "removed entry");
        Ok(true)
    }

    fn ensure_loaded(&self) -> Result<()> {
        match &self.load_error {
            Some(reason) => Err(StoreError::Unloaded(reason.clone())),
            None => Ok(()),
        }
    }

    async fn commit(&mut self, entries: Vec<Event>, message: &str) -> Result<()> {
        let candidate = Snapshot {
            entries,
            revision: self.snapshot.revision.clone(),
        };
        let revision = self.backend.save(&candidate, message).await?;
        self.snapshot = Snapshot {
            entries: candidate.entries,
            revision,
        };
        Ok(())
    }

    /// Millisecond clock value, bumped past anything already issued or stored.
    fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let mut id = now.timestamp_millis().max(self.last_id + 1);
        while self.snapshot.entries.iter().any(|event| event.id == id.to_string()) {
            id += 1;
        }
        id
    }
}

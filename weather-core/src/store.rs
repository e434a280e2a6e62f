use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, fmt::Debug, io::ErrorKind, path::PathBuf};
use tracing::debug;

use crate::{error::QueryError, model::Location};

/// Saved locations, keyed by the name the weather service reports.
#[async_trait]
pub trait LocationStore: Send + Sync + Debug {
    async fn find_by_name(&self, name: &str) -> Result<Option<Location>, QueryError>;

    async fn save(&self, location: Location) -> Result<(), QueryError>;
}

#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    locations: Mutex<HashMap<String, Location>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, location: Location) {
        self.locations.lock().insert(location.name.clone(), location);
    }

    pub fn len(&self) -> usize {
        self.locations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.lock().is_empty()
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Location>, QueryError> {
        Ok(self.locations.lock().get(name).cloned())
    }

    async fn save(&self, location: Location) -> Result<(), QueryError> {
        self.insert(location);
        Ok(())
    }
}

/// Locations kept as a JSON array in a single file.
///
/// The whole file is rewritten on every save; writes are serialized so two
/// concurrent saves cannot drop each other's entry.
#[derive(Debug)]
pub struct JsonFileLocationStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// All saved locations in insertion order. A missing file is empty.
    pub async fn list(&self) -> Result<Vec<Location>, QueryError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        serde_json::from_str(&contents).map_err(|err| {
            QueryError::Store(format!("corrupt location file {}: {err}", self.path.display()))
        })
    }
}

#[async_trait]
impl LocationStore for JsonFileLocationStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Location>, QueryError> {
        Ok(self.list().await?.into_iter().find(|loc| loc.name == name))
    }

    async fn save(&self, location: Location) -> Result<(), QueryError> {
        let _guard = self.write_lock.lock().await;

        let mut locations = self.list().await?;
        locations.retain(|loc| loc.name != location.name);
        debug!(name = %location.name, path = %self.path.display(), "saving location");
        locations.push(location);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&locations)
            .map_err(|err| QueryError::Store(err.to_string()))?;
        tokio::fs::write(&self.path, json).await?;

        Ok(())
    }
}

//! services/api/src/adapters/json_file.rs
//!
//! A persistence adapter that keeps the widget snapshot in a single JSON file.
//! This is the concrete implementation of the `PersistenceAdapter` port used by
//! the service binary.

use async_trait::async_trait;
use chat_widget_core::{PersistenceAdapter, PortError, PortResult, WidgetState};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Stores the snapshot at `path`, replacing it atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    /// Creates a new `JsonFilePersistence`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "widget_state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

//=========================================================================================
// `PersistenceAdapter` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceAdapter for JsonFilePersistence {
    async fn load(&self) -> PortResult<Option<WidgetState>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PortError::Unavailable(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let state = serde_json::from_slice::<WidgetState>(&data).map_err(|e| {
            PortError::Corrupt(format!("failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(state))
    }

    async fn save(&self, state: &WidgetState) -> PortResult<()> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| PortError::Unexpected(format!("failed to serialize snapshot: {}", e)))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(|e| {
                PortError::Unavailable(format!("failed to create {}: {}", dir.display(), e))
            })?;
        }

        let tmp_path = self.temp_path();
        fs::write(&tmp_path, bytes).await.map_err(|e| {
            PortError::Unavailable(format!("failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            PortError::Unavailable(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Widget snapshot written to {}", self.path.display());
        Ok(())
    }
}

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};

/// Settings key holding the cursor of a loader.
pub const LAST_LOADED_ID_KEY: &str = "last_loaded_id";

/// Cursor value of a loader that has never committed a batch.
pub const COLD_START_CURSOR: i64 = -1;

/// Open settings mapping stored with a checkpoint, serialized as JSON text.
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// A named checkpoint record.
///
/// There is at most one per `workflow_key`. It is created lazily on the first
/// successful run and only ever mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSetting {
    /// Surrogate id assigned by the store, 0 until first persisted.
    pub id: i64,
    pub workflow_key: String,
    pub settings: Settings,
}

impl WorkflowSetting {
    /// The in-memory setting of a loader that has no stored checkpoint yet.
    pub fn cold(workflow_key: impl Into<String>) -> Self {
        let mut settings = Settings::new();
        settings.insert(LAST_LOADED_ID_KEY.to_string(), COLD_START_CURSOR.into());
        Self {
            id: 0,
            workflow_key: workflow_key.into(),
            settings,
        }
    }

    /// Read the cursor.
    ///
    /// A stored setting without an integer `last_loaded_id` is corrupt, not
    /// absent, and is reported as a checkpoint error.
    pub fn cursor(&self) -> LoadResult<i64> {
        let value = self.settings.get(LAST_LOADED_ID_KEY).ok_or_else(|| {
            LoadError::checkpoint(format!(
                "checkpoint '{}' has no '{}' entry",
                self.workflow_key, LAST_LOADED_ID_KEY
            ))
        })?;

        value.as_i64().ok_or_else(|| {
            LoadError::checkpoint(format!(
                "checkpoint '{}' has a non-integer '{}': {}",
                self.workflow_key, LAST_LOADED_ID_KEY, value
            ))
        })
    }

    /// Move the cursor forward to `sequence_key`. The cursor never decreases.
    pub fn advance(&mut self, sequence_key: i64) -> LoadResult<i64> {
        let next = self.cursor()?.max(sequence_key);
        self.settings
            .insert(LAST_LOADED_ID_KEY.to_string(), next.into());
        Ok(next)
    }

    /// Whether this setting came from the store rather than a cold start.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// Persistence of workflow checkpoints.
///
/// Both operations run inside the caller's transaction `Tx`; a store never
/// begins or commits one itself.
pub trait CheckpointStore<Tx>: Send + Sync {
    /// Look up the checkpoint for a key. `None` means no run has committed yet.
    fn get(
        &self,
        tx: &mut Tx,
        workflow_key: &str,
    ) -> impl Future<Output = LoadResult<Option<WorkflowSetting>>> + Send;

    /// Insert or overwrite the settings stored for a key.
    fn save(
        &self,
        tx: &mut Tx,
        workflow_key: &str,
        settings: &Settings,
    ) -> impl Future<Output = LoadResult<()>> + Send;
}

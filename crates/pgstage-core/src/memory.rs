//! An in-memory warehouse with real commit and rollback semantics.
//!
//! Transactions work on a private copy of the state and publish it on commit,
//! so a failed run leaves the shared state untouched. Used by the loader tests
//! and by anything that needs a warehouse without a database.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::checkpoint::{CheckpointStore, Settings, WorkflowSetting};
use crate::error::{LoadError, LoadResult};
use crate::record::{Batch, SourceRecord};
use crate::sink::SinkWriter;
use crate::source::SourceReader;
use crate::transaction::{Transaction, Warehouse};
use crate::types::{RowMap, ToRow, Value};

/// Everything a memory warehouse holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub checkpoints: BTreeMap<String, WorkflowSetting>,
    pub tables: BTreeMap<String, Vec<RowMap>>,
    next_checkpoint_id: i64,
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the committed state.
    pub fn snapshot(&self) -> MemoryState {
        lock(&self.state).clone()
    }

    /// Committed rows of a table.
    pub fn rows(&self, table: &str) -> Vec<RowMap> {
        lock(&self.state)
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Committed checkpoint for a key.
    pub fn checkpoint(&self, workflow_key: &str) -> Option<WorkflowSetting> {
        lock(&self.state).checkpoints.get(workflow_key).cloned()
    }

    /// Store a checkpoint outside any transaction.
    pub fn seed_checkpoint(&self, workflow_key: &str, settings: Settings) {
        let mut state = lock(&self.state);
        upsert_checkpoint(&mut state, workflow_key, settings);
    }

    /// Store a row outside any transaction.
    pub fn seed_row(&self, table: &str, row: RowMap) {
        lock(&self.state)
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }
}

fn upsert_checkpoint(state: &mut MemoryState, workflow_key: &str, settings: Settings) {
    if let Some(existing) = state.checkpoints.get_mut(workflow_key) {
        existing.settings = settings;
        return;
    }
    state.next_checkpoint_id += 1;
    state.checkpoints.insert(
        workflow_key.to_string(),
        WorkflowSetting {
            id: state.next_checkpoint_id,
            workflow_key: workflow_key.to_string(),
            settings,
        },
    );
}

impl Warehouse for MemoryWarehouse {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> LoadResult<MemoryTransaction> {
        let working = self.snapshot();
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.state),
            working,
        })
    }
}

/// A transaction over a [`MemoryWarehouse`]. Dropping it discards its writes.
#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<Mutex<MemoryState>>,
    working: MemoryState,
}

impl Transaction for MemoryTransaction {
    async fn commit(self) -> LoadResult<()> {
        *lock(&self.shared) = self.working;
        Ok(())
    }

    async fn rollback(self) -> LoadResult<()> {
        Ok(())
    }
}

/// Checkpoint store backed by the transaction's working state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    fail_on_save: Option<String>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `save` always fails.
    pub fn failing_save(message: impl Into<String>) -> Self {
        Self {
            fail_on_save: Some(message.into()),
        }
    }
}

impl CheckpointStore<MemoryTransaction> for MemoryCheckpointStore {
    async fn get(
        &self,
        tx: &mut MemoryTransaction,
        workflow_key: &str,
    ) -> LoadResult<Option<WorkflowSetting>> {
        Ok(tx.working.checkpoints.get(workflow_key).cloned())
    }

    async fn save(
        &self,
        tx: &mut MemoryTransaction,
        workflow_key: &str,
        settings: &Settings,
    ) -> LoadResult<()> {
        if let Some(ref message) = self.fail_on_save {
            return Err(LoadError::checkpoint(message.clone()));
        }
        upsert_checkpoint(&mut tx.working, workflow_key, settings.clone());
        Ok(())
    }
}

/// Append-only sink into a named table.
#[derive(Debug, Clone)]
pub struct MemoryInsertSink {
    table: String,
    fail_on: Option<i64>,
}

impl MemoryInsertSink {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fail_on: None,
        }
    }

    /// Fail when asked to write the record with this sequence key.
    pub fn failing_on(mut self, sequence_key: i64) -> Self {
        self.fail_on = Some(sequence_key);
        self
    }
}

impl<R> SinkWriter<MemoryTransaction, R> for MemoryInsertSink
where
    R: ToRow + Send + Sync,
{
    async fn write(&self, tx: &mut MemoryTransaction, record: &SourceRecord<R>) -> LoadResult<()> {
        if self.fail_on == Some(record.sequence_key) {
            return Err(LoadError::write(format!(
                "rejected record {} for {}",
                record.sequence_key, self.table
            )));
        }
        tx.working
            .tables
            .entry(self.table.clone())
            .or_default()
            .push(record.payload.to_row());
        Ok(())
    }
}

/// Upsert sink keyed by a set of columns. Non-key columns are overwritten.
#[derive(Debug, Clone)]
pub struct MemoryUpsertSink {
    table: String,
    key_columns: Vec<String>,
}

impl MemoryUpsertSink {
    pub fn new<I, K>(table: impl Into<String>, key_columns: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            table: table.into(),
            key_columns: key_columns.into_iter().map(Into::into).collect(),
        }
    }

    fn key_of<'a>(&self, row: &'a RowMap) -> Vec<Option<&'a Value>> {
        self.key_columns.iter().map(|c| row.get(c)).collect()
    }
}

impl<R> SinkWriter<MemoryTransaction, R> for MemoryUpsertSink
where
    R: ToRow + Send + Sync,
{
    async fn write(&self, tx: &mut MemoryTransaction, record: &SourceRecord<R>) -> LoadResult<()> {
        let row = record.payload.to_row();
        if let Some(missing) = self.key_columns.iter().find(|c| !row.contains_key(*c)) {
            return Err(LoadError::write(format!(
                "row for {} has no key column '{}'",
                self.table, missing
            )));
        }

        let rows = tx.working.tables.entry(self.table.clone()).or_default();
        let key = self.key_of(&row);
        match rows.iter().position(|existing| self.key_of(existing) == key) {
            Some(index) => rows[index] = row,
            None => rows.push(row),
        }
        Ok(())
    }
}

/// A source over a fixed list of records.
#[derive(Debug)]
pub struct VecSource<R> {
    records: Vec<SourceRecord<R>>,
    fail_with: Option<String>,
    ignore_limit: bool,
    keep_order: bool,
    thresholds: Mutex<Vec<i64>>,
}

impl<R> VecSource<R> {
    pub fn new(records: Vec<SourceRecord<R>>) -> Self {
        Self {
            records,
            fail_with: None,
            ignore_limit: false,
            keep_order: false,
            thresholds: Mutex::new(Vec::new()),
        }
    }

    /// A source whose every fetch fails.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut source = Self::new(Vec::new());
        source.fail_with = Some(message.into());
        source
    }

    /// Return every record past the threshold regardless of the limit.
    pub fn ignoring_limit(mut self) -> Self {
        self.ignore_limit = true;
        self
    }

    /// Return records in the order given instead of ascending by key.
    pub fn unsorted(mut self) -> Self {
        self.keep_order = true;
        self
    }

    /// Thresholds passed to each fetch so far.
    pub fn thresholds(&self) -> Vec<i64> {
        self.thresholds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<R> SourceReader for VecSource<R>
where
    R: Clone + Send + Sync,
{
    type Record = R;

    async fn fetch(&self, threshold: i64, limit: usize) -> LoadResult<Batch<R>> {
        self.thresholds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(threshold);

        if let Some(ref message) = self.fail_with {
            return Err(LoadError::source(message.clone()));
        }

        let mut records: Vec<SourceRecord<R>> = self
            .records
            .iter()
            .filter(|r| r.sequence_key > threshold)
            .cloned()
            .collect();
        if !self.keep_order {
            records.sort_by_key(|r| r.sequence_key);
        }
        if !self.ignore_limit {
            records.truncate(limit);
        }
        Ok(Batch::new(records))
    }
}

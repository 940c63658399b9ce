//! The transactional load cycle.
//!
//! One run reads the checkpoint, fetches the next batch past it, writes every
//! record and saves the advanced checkpoint, all inside a single transaction.
//! Either the writes and the new cursor commit together or neither does.

use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointStore, WorkflowSetting};
use crate::error::{LoadError, LoadResult};
use crate::record::Batch;
use crate::sink::SinkWriter;
use crate::source::SourceReader;
use crate::transaction::{Transaction, Warehouse};

/// Result of a committed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub workflow_key: String,
    /// Cursor read at the start of the run.
    pub previous_cursor: i64,
    /// Cursor committed by the run. Equal to `previous_cursor` when nothing loaded.
    pub cursor: i64,
    /// Number of records written.
    pub loaded: usize,
}

impl RunOutcome {
    /// Whether the run found nothing new upstream.
    pub fn is_empty(&self) -> bool {
        self.loaded == 0
    }
}

/// Binds a source, a sink and a checkpoint store under one workflow key.
pub struct Loader<S, W, C> {
    workflow_key: String,
    batch_limit: usize,
    source: S,
    sink: W,
    checkpoints: C,
}

impl<S, W, C> Loader<S, W, C>
where
    S: SourceReader,
{
    pub fn new(
        workflow_key: impl Into<String>,
        batch_limit: usize,
        source: S,
        sink: W,
        checkpoints: C,
    ) -> LoadResult<Self> {
        let workflow_key = workflow_key.into();
        if workflow_key.is_empty() {
            return Err(LoadError::InvalidConfig("workflow key is empty".into()));
        }
        if batch_limit == 0 {
            return Err(LoadError::InvalidConfig(format!(
                "batch limit for '{}' must be at least 1",
                workflow_key
            )));
        }

        Ok(Self {
            workflow_key,
            batch_limit,
            source,
            sink,
            checkpoints,
        })
    }

    pub fn workflow_key(&self) -> &str {
        &self.workflow_key
    }

    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Begin a transaction on `warehouse` and run one load cycle in it.
    pub async fn run<D>(&self, warehouse: &D) -> LoadResult<RunOutcome>
    where
        D: Warehouse,
        W: SinkWriter<D::Tx, S::Record>,
        C: CheckpointStore<D::Tx>,
    {
        let tx = warehouse.begin().await?;
        self.run_in(tx).await
    }

    /// Run one load cycle inside `tx`, then commit it or roll it back.
    pub async fn run_in<T>(&self, mut tx: T) -> LoadResult<RunOutcome>
    where
        T: Transaction,
        W: SinkWriter<T, S::Record>,
        C: CheckpointStore<T>,
    {
        match self.load(&mut tx).await {
            Ok(outcome) => {
                tx.commit().await?;
                if outcome.is_empty() {
                    info!(workflow = %self.workflow_key, cursor = outcome.cursor, "No new records");
                } else {
                    info!(
                        workflow = %self.workflow_key,
                        loaded = outcome.loaded,
                        from = outcome.previous_cursor,
                        to = outcome.cursor,
                        "Load committed"
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    workflow = %self.workflow_key,
                    kind = e.kind(),
                    error = %e,
                    "Load failed, rolling back"
                );
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        workflow = %self.workflow_key,
                        error = %rollback_err,
                        "Rollback failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn load<T>(&self, tx: &mut T) -> LoadResult<RunOutcome>
    where
        T: Transaction,
        W: SinkWriter<T, S::Record>,
        C: CheckpointStore<T>,
    {
        let mut setting = self
            .checkpoints
            .get(tx, &self.workflow_key)
            .await?
            .unwrap_or_else(|| WorkflowSetting::cold(self.workflow_key.as_str()));
        let previous_cursor = setting.cursor()?;

        debug!(
            workflow = %self.workflow_key,
            cursor = previous_cursor,
            limit = self.batch_limit,
            "Fetching batch"
        );
        let batch: Batch<S::Record> = self.source.fetch(previous_cursor, self.batch_limit).await?;

        if batch.len() > self.batch_limit {
            return Err(LoadError::source(format!(
                "source returned {} records for a limit of {}",
                batch.len(),
                self.batch_limit
            )));
        }

        let Some(max_key) = batch.max_sequence_key() else {
            return Ok(RunOutcome {
                workflow_key: self.workflow_key.clone(),
                previous_cursor,
                cursor: previous_cursor,
                loaded: 0,
            });
        };

        if !batch.is_strictly_ascending() {
            warn!(
                workflow = %self.workflow_key,
                "Batch keys are not strictly ascending, advancing to the batch maximum"
            );
        }

        for record in batch.records() {
            self.sink.write(tx, record).await?;
        }

        let cursor = setting.advance(max_key)?;
        self.checkpoints
            .save(tx, &self.workflow_key, &setting.settings)
            .await?;

        Ok(RunOutcome {
            workflow_key: self.workflow_key.clone(),
            previous_cursor,
            cursor,
            loaded: batch.len(),
        })
    }
}

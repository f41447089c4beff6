//! LeaseStore trait and its table-backed implementation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use backon::BackoffBuilder;
use tracing::{debug, error, info};

use super::backend::{BatchGetRequest, TableBackend};
use super::provision::{CancelSignal, TableProvisioner};
use super::record::ShardLeaseRecord;
use super::schema::{validate_schema, TableDescriptor, RECORD_PROJECTION};
use super::{Result, StorageError};
use crate::config::LeaseTableConfig;
use crate::utils::retry::unprocessed_keys_backoff;

/// Most keys a single BatchGetItem call accepts.
pub const MAX_BATCH_GET_KEYS: usize = 100;

/// Interface for shard lease and checkpoint persistence.
///
/// Holds no mutable state of its own, so one instance can be shared between
/// tasks and called concurrently, including for the same shard.
///
/// # Implementations
///
/// - `ShardLeaseStore<DynamoTableBackend>`: DynamoDB lease table
/// - `ShardLeaseStore<MockTableBackend>`: In-memory store for testing
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Check that the lease table exists with the exact expected schema.
    ///
    /// Returns `TableNotFound` when it does not exist and `SchemaMismatch`
    /// when it exists with any other shape.
    async fn validate_table(&self) -> Result<()>;

    /// Create the lease table and wait until it is ACTIVE.
    async fn provision_table(&self, cancel: CancelSignal) -> Result<()>;

    /// Validate the table, provisioning it only if it does not exist.
    ///
    /// Lookup failures other than `TableNotFound` are returned and never
    /// lead to creation.
    async fn ensure_table(&self, cancel: CancelSignal) -> Result<()> {
        match self.validate_table().await {
            Err(e) if e.is_not_found() => self.provision_table(cancel).await,
            other => other,
        }
    }

    /// Store progress and ownership of one shard.
    ///
    /// Unconditional whole-record upsert: concurrent writers for the same
    /// shard all succeed and the last one wins. Not retried.
    async fn checkpoint(
        &self,
        shard_id: &str,
        sequence_number: &str,
        lease_expiration: i64,
        worker_id: &str,
    ) -> Result<()>;

    /// Read the records of all given shards.
    ///
    /// Shards that were never written are absent from the result. Either
    /// every requested shard was read or the call fails; partial results are
    /// never returned.
    async fn get_shard_data(
        &self,
        shard_ids: &[String],
    ) -> Result<HashMap<String, ShardLeaseRecord>>;
}

/// LeaseStore over any [`TableBackend`].
pub struct ShardLeaseStore<B> {
    backend: B,
    table_name: String,
    provisioner: TableProvisioner,
}

impl<B: TableBackend> ShardLeaseStore<B> {
    /// Create a store for the configured table on the given backend.
    pub fn new(backend: B, config: &LeaseTableConfig) -> Self {
        Self {
            backend,
            table_name: config.table_name.clone(),
            provisioner: TableProvisioner::from_config(config),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn check_schema(&self, descriptor: &TableDescriptor) -> Result<()> {
        validate_schema(Some(descriptor)).map_err(|reason| {
            error!(table = %self.table_name, reason = %reason, "Lease table schema mismatch");
            StorageError::SchemaMismatch {
                table: self.table_name.clone(),
                reason,
            }
        })
    }
}

#[async_trait]
impl<B: TableBackend> LeaseStore for ShardLeaseStore<B> {
    async fn validate_table(&self) -> Result<()> {
        let descriptor = self.backend.describe_table(&self.table_name).await?;
        self.check_schema(&descriptor)?;
        debug!(table = %self.table_name, status = %descriptor.status, "Lease table schema validated");
        Ok(())
    }

    async fn provision_table(&self, cancel: CancelSignal) -> Result<()> {
        let descriptor = self
            .provisioner
            .provision(&self.backend, &self.table_name, cancel)
            .await?;
        // Another worker may have created it first.
        self.check_schema(&descriptor)
    }

    /// Also waits when the table exists but is still being created by
    /// another worker.
    async fn ensure_table(&self, cancel: CancelSignal) -> Result<()> {
        let descriptor = match self.backend.describe_table(&self.table_name).await {
            Ok(descriptor) => descriptor,
            Err(e) if e.is_not_found() => {
                info!(table = %self.table_name, "Lease table not found, creating");
                return self.provision_table(cancel).await;
            }
            Err(e) => {
                error!(table = %self.table_name, error = %e, "Unable to describe lease table");
                return Err(e);
            }
        };

        self.check_schema(&descriptor)?;
        if !descriptor.is_active() {
            info!(table = %self.table_name, status = %descriptor.status, "Lease table exists but is not ACTIVE, waiting");
            self.provisioner
                .wait_until_active(&self.backend, &self.table_name, cancel)
                .await?;
        }
        Ok(())
    }

    async fn checkpoint(
        &self,
        shard_id: &str,
        sequence_number: &str,
        lease_expiration: i64,
        worker_id: &str,
    ) -> Result<()> {
        let record = ShardLeaseRecord::new(shard_id, sequence_number, lease_expiration, worker_id);
        self.backend.put_item(&self.table_name, &record).await?;

        debug!(
            table = %self.table_name,
            shard_id = %shard_id,
            checkpoint = %sequence_number,
            lease_expiration = lease_expiration,
            worker_id = %worker_id,
            "Stored shard checkpoint"
        );

        Ok(())
    }

    async fn get_shard_data(
        &self,
        shard_ids: &[String],
    ) -> Result<HashMap<String, ShardLeaseRecord>> {
        if shard_ids.is_empty() {
            return Ok(HashMap::new());
        }

        // The service rejects duplicate keys within one request.
        let mut seen = HashSet::with_capacity(shard_ids.len());
        let mut pending: VecDeque<String> = shard_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let mut records = HashMap::with_capacity(pending.len());
        let mut pauses = unprocessed_keys_backoff().build();
        let mut round = 0;

        while !pending.is_empty() {
            round += 1;
            let take = pending.len().min(MAX_BATCH_GET_KEYS);
            let request = BatchGetRequest {
                table_name: self.table_name.clone(),
                shard_ids: pending.drain(..take).collect(),
                projection: RECORD_PROJECTION,
                consistent_read: true,
            };

            let output = self.backend.batch_get_item(request).await.map_err(|e| {
                error!(table = %self.table_name, round = round, error = %e, "Unable to batch get shard records");
                StorageError::BatchRead {
                    table: self.table_name.clone(),
                    round,
                    source: Box::new(e),
                }
            })?;

            let returned = output.records.len();
            for record in output.records {
                records.insert(record.shard_id.clone(), record);
            }

            debug!(
                table = %self.table_name,
                round = round,
                returned = returned,
                unprocessed = output.unprocessed.len(),
                pending = pending.len(),
                "Batch get round complete"
            );

            if !output.unprocessed.is_empty() {
                pending.extend(output.unprocessed);
                let pause = pauses.next().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(pause).await;
            }
        }

        Ok(records)
    }
}

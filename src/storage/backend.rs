//! TableBackend trait definition.

use async_trait::async_trait;

use super::record::ShardLeaseRecord;
use super::schema::TableDescriptor;
use super::Result;

/// One BatchGetItem call against the lease table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGetRequest {
    pub table_name: String,
    pub shard_ids: Vec<String>,
    pub projection: &'static str,
    pub consistent_read: bool,
}

/// Outcome of one BatchGetItem call.
///
/// The service may serve only part of a request. Keys it skipped come back
/// in `unprocessed` and must be requested again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchGetOutput {
    pub records: Vec<ShardLeaseRecord>,
    pub unprocessed: Vec<String>,
}

/// Raw access to the key-value service hosting the lease table.
///
/// One method per service call, no retries and no interpretation beyond
/// converting to and from lease records. Retry, pagination and schema
/// policy live in [`ShardLeaseStore`](super::ShardLeaseStore).
///
/// # Implementations
///
/// - `DynamoTableBackend`: Amazon DynamoDB (feature `dynamo`)
/// - `MockTableBackend`: In-memory, scriptable backend for testing
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Describe a table.
    ///
    /// Returns `StorageError::TableNotFound` when it does not exist; any
    /// other failure is `StorageError::Service`.
    async fn describe_table(&self, table_name: &str) -> Result<TableDescriptor>;

    /// Issue table creation. Returns once the service accepted the request,
    /// typically while the table is still `CREATING`.
    async fn create_table(&self, table: &TableDescriptor) -> Result<()>;

    /// Unconditionally write a whole record.
    async fn put_item(&self, table_name: &str, record: &ShardLeaseRecord) -> Result<()>;

    /// Read up to one batch of records.
    async fn batch_get_item(&self, request: BatchGetRequest) -> Result<BatchGetOutput>;
}

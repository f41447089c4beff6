//! Mock table backend for testing.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{BatchGetOutput, BatchGetRequest, TableBackend};
use super::schema::{TableDescriptor, TableStatus, Throughput};
use super::{Result, ShardLeaseRecord, StorageError, MAX_BATCH_GET_KEYS};

/// Scripted answer for the next DescribeTable call.
#[derive(Debug, Clone)]
pub enum DescribeOutcome {
    /// Report the stored table with this status.
    Status(TableStatus),
    /// Report the table as absent.
    NotFound,
    /// Fail with a service error.
    Fail(String),
}

/// Scripted answer for the next BatchGetItem call.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Serve the request but hold back these keys as unprocessed.
    Withhold(Vec<String>),
    /// Fail with a service error.
    Fail(String),
}

/// Mock backend that keeps tables and items in memory.
///
/// Without scripts it behaves like a healthy service: created tables are
/// ACTIVE immediately and batch reads serve every key. Scripts override
/// the next calls one at a time.
#[derive(Default)]
pub struct MockTableBackend {
    tables: RwLock<HashMap<String, TableDescriptor>>,
    items: RwLock<HashMap<String, HashMap<String, ShardLeaseRecord>>>,
    describe_script: RwLock<VecDeque<DescribeOutcome>>,
    batch_script: RwLock<VecDeque<BatchOutcome>>,
    fail_on_create: RwLock<bool>,
    fail_on_put: RwLock<bool>,
    describe_calls: RwLock<usize>,
    create_calls: RwLock<usize>,
    put_calls: RwLock<usize>,
    batch_requests: RwLock<Vec<BatchGetRequest>>,
}

impl MockTableBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that already hosts an ACTIVE lease table.
    pub async fn with_lease_table(table_name: &str) -> Self {
        let backend = Self::new();
        let mut descriptor = TableDescriptor::lease_table(
            table_name,
            Throughput {
                read_capacity: 5,
                write_capacity: 5,
            },
        );
        descriptor.status = TableStatus::Active;
        backend.insert_table(descriptor).await;
        backend
    }

    /// Register a table with an arbitrary shape.
    pub async fn insert_table(&self, descriptor: TableDescriptor) {
        self.tables
            .write()
            .await
            .insert(descriptor.name.clone(), descriptor);
    }

    /// Store a record directly, bypassing call counters.
    pub async fn insert_record(&self, table_name: &str, record: ShardLeaseRecord) {
        self.items
            .write()
            .await
            .entry(table_name.to_string())
            .or_default()
            .insert(record.shard_id.clone(), record);
    }

    pub async fn push_describe(&self, outcome: DescribeOutcome) {
        self.describe_script.write().await.push_back(outcome);
    }

    pub async fn push_batch(&self, outcome: BatchOutcome) {
        self.batch_script.write().await.push_back(outcome);
    }

    pub async fn set_fail_on_create(&self, fail: bool) {
        *self.fail_on_create.write().await = fail;
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    pub async fn describe_calls(&self) -> usize {
        *self.describe_calls.read().await
    }

    pub async fn create_calls(&self) -> usize {
        *self.create_calls.read().await
    }

    pub async fn put_calls(&self) -> usize {
        *self.put_calls.read().await
    }

    pub async fn batch_requests(&self) -> Vec<BatchGetRequest> {
        self.batch_requests.read().await.clone()
    }

    pub async fn table(&self, table_name: &str) -> Option<TableDescriptor> {
        self.tables.read().await.get(table_name).cloned()
    }

    fn not_found(table_name: &str) -> StorageError {
        StorageError::TableNotFound {
            table: table_name.to_string(),
        }
    }
}

#[async_trait]
impl TableBackend for MockTableBackend {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescriptor> {
        *self.describe_calls.write().await += 1;

        let stored = self.tables.read().await.get(table_name).cloned();
        match self.describe_script.write().await.pop_front() {
            Some(DescribeOutcome::Status(status)) => {
                let mut descriptor = stored.ok_or_else(|| Self::not_found(table_name))?;
                descriptor.status = status;
                Ok(descriptor)
            }
            Some(DescribeOutcome::NotFound) => Err(Self::not_found(table_name)),
            Some(DescribeOutcome::Fail(message)) => {
                Err(StorageError::service("DescribeTable", table_name, message))
            }
            None => stored.ok_or_else(|| Self::not_found(table_name)),
        }
    }

    async fn create_table(&self, table: &TableDescriptor) -> Result<()> {
        *self.create_calls.write().await += 1;

        if *self.fail_on_create.read().await {
            return Err(StorageError::service(
                "CreateTable",
                &table.name,
                "LimitExceededException: too many tables being created",
            ));
        }

        let mut tables = self.tables.write().await;
        if tables.contains_key(&table.name) {
            return Err(StorageError::TableAlreadyExists {
                table: table.name.clone(),
            });
        }
        let mut descriptor = table.clone();
        descriptor.status = TableStatus::Active;
        tables.insert(table.name.clone(), descriptor);
        Ok(())
    }

    async fn put_item(&self, table_name: &str, record: &ShardLeaseRecord) -> Result<()> {
        *self.put_calls.write().await += 1;

        if *self.fail_on_put.read().await {
            return Err(StorageError::service(
                "PutItem",
                table_name,
                "ProvisionedThroughputExceededException",
            ));
        }

        self.insert_record(table_name, record.clone()).await;
        Ok(())
    }

    async fn batch_get_item(&self, request: BatchGetRequest) -> Result<BatchGetOutput> {
        self.batch_requests.write().await.push(request.clone());

        let table_name = request.table_name.as_str();
        if request.shard_ids.len() > MAX_BATCH_GET_KEYS {
            return Err(StorageError::service(
                "BatchGetItem",
                table_name,
                "ValidationException: too many items requested",
            ));
        }
        let mut distinct = HashSet::new();
        if !request.shard_ids.iter().all(|id| distinct.insert(id)) {
            return Err(StorageError::service(
                "BatchGetItem",
                table_name,
                "ValidationException: provided list of item keys contains duplicates",
            ));
        }

        let withheld = match self.batch_script.write().await.pop_front() {
            Some(BatchOutcome::Fail(message)) => {
                return Err(StorageError::service("BatchGetItem", table_name, message));
            }
            Some(BatchOutcome::Withhold(keys)) => keys,
            None => Vec::new(),
        };

        let items = self.items.read().await;
        let stored = items.get(table_name);
        let mut output = BatchGetOutput::default();
        for shard_id in request.shard_ids {
            if withheld.contains(&shard_id) {
                output.unprocessed.push(shard_id);
            } else if let Some(record) = stored.and_then(|records| records.get(&shard_id)) {
                output.records.push(record.clone());
            }
        }
        Ok(output)
    }
}

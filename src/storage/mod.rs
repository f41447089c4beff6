//! Lease table storage.
//!
//! [`LeaseStore`] is the interface workers use. [`ShardLeaseStore`] implements
//! it over a [`TableBackend`], which performs the raw service calls.

use std::sync::Arc;

#[cfg(feature = "dynamo")]
use tracing::info;

use crate::config::LeaseTableConfig;

mod backend;
mod error;
mod lease_store;
mod provision;
mod record;
pub mod schema;

#[cfg(feature = "dynamo")]
pub mod dynamo;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;


pub use backend::{BatchGetOutput, BatchGetRequest, TableBackend};
pub use error::{BoxError, Result, StorageError};
pub use lease_store::{LeaseStore, ShardLeaseStore, MAX_BATCH_GET_KEYS};
pub use provision::{never_cancelled, CancelSignal, TableProvisioner};
pub use record::ShardLeaseRecord;
pub use schema::{validate_schema, SchemaViolation, TableDescriptor};

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoTableBackend;

/// Connect to the configured DynamoDB lease table.
///
/// Does not touch the table; call [`LeaseStore::ensure_table`] before use.
#[cfg(feature = "dynamo")]
pub async fn init_lease_store(config: &LeaseTableConfig) -> Arc<dyn LeaseStore> {
    let backend = DynamoTableBackend::connect(config).await;
    info!(table = %config.table_name, "Lease store: dynamo");
    Arc::new(ShardLeaseStore::new(backend, config))
}

/// Build a lease store over an arbitrary backend.
pub fn lease_store_with<B>(backend: B, config: &LeaseTableConfig) -> Arc<dyn LeaseStore>
where
    B: TableBackend + 'static,
{
    Arc::new(ShardLeaseStore::new(backend, config))
}

//! Storage errors.

use std::time::Duration;

use super::schema::SchemaViolation;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Boxed cause from the underlying client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during lease table operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The table does not exist. Only this error triggers provisioning.
    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    /// Creation raced with another worker creating the same table.
    #[error("Table already exists: {table}")]
    TableAlreadyExists { table: String },

    #[error("Table {table} has an incompatible schema: {reason}")]
    SchemaMismatch {
        table: String,
        #[source]
        reason: SchemaViolation,
    },

    #[error("Table {table} is {status}, not ACTIVE")]
    NotActive { table: String, status: String },

    /// Any other store-side failure (throttling, network, internal).
    #[error("{operation} failed on table {table}: {source}")]
    Service {
        operation: &'static str,
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("BatchGetItem round {round} failed on table {table}: {source}")]
    BatchRead {
        table: String,
        round: usize,
        #[source]
        source: Box<StorageError>,
    },

    #[error("Table {table} did not become ACTIVE within {waited:?}")]
    ProvisionTimeout { table: String, waited: Duration },

    #[error("Provisioning of table {table} was cancelled")]
    Cancelled { table: String },

    #[error("Malformed lease record in table {table}: {reason}")]
    MalformedRecord { table: String, reason: String },
}

impl StorageError {
    /// Wrap a client failure with operation and table context.
    pub fn service(
        operation: &'static str,
        table: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        StorageError::Service {
            operation,
            table: table.into(),
            source: source.into(),
        }
    }

    /// True for `TableNotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::TableNotFound { .. })
    }
}

//! Lease table schema.
//!
//! ```text
//! Table: shard_leases (configurable)
//!
//! Primary Key:
//!   - shard_id (String, Partition Key)
//!
//! Attributes:
//!   - shard_id: String (PK)
//!   - checkpoint: String - last processed position, opaque to this crate
//!   - lease_expiration: Number - time after which the lease may be taken over
//!   - worker_id: String - current or last claiming worker
//! ```
//!
//! The table is shared by every worker of a deployment and may have been
//! created by someone else. Only the exact shape above is accepted.

use std::fmt;

/// Partition key attribute.
pub const ATTR_SHARD_ID: &str = "shard_id";

/// Last processed position within the shard.
pub const ATTR_CHECKPOINT: &str = "checkpoint";

/// Lease expiry, stored as a number.
pub const ATTR_LEASE_EXPIRATION: &str = "lease_expiration";

/// Claiming worker.
pub const ATTR_WORKER_ID: &str = "worker_id";

/// Projection used by batch reads: exactly the four record attributes.
pub const RECORD_PROJECTION: &str = "shard_id,checkpoint,lease_expiration,worker_id";

/// Scalar type of a key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    Binary,
    Other(String),
}

impl AttributeType {
    /// Parse the service's wire code (`S`, `N`, `B`).
    pub fn from_code(code: &str) -> Self {
        match code {
            "S" => AttributeType::String,
            "N" => AttributeType::Number,
            "B" => AttributeType::Binary,
            other => AttributeType::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
            AttributeType::Other(code) => code,
        }
    }
}

/// Role of a key-schema element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
    Other(String),
}

impl KeyType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "HASH" => KeyType::Hash,
            "RANGE" => KeyType::Range,
            other => KeyType::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            KeyType::Hash => "HASH",
            KeyType::Range => "RANGE",
            KeyType::Other(code) => code,
        }
    }
}

/// Table lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other(String),
}

impl TableStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "CREATING" => TableStatus::Creating,
            "ACTIVE" => TableStatus::Active,
            "UPDATING" => TableStatus::Updating,
            "DELETING" => TableStatus::Deleting,
            other => TableStatus::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            TableStatus::Creating => "CREATING",
            TableStatus::Active => "ACTIVE",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub name: String,
    pub attribute_type: AttributeType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchemaElement {
    pub name: String,
    pub key_type: KeyType,
}

/// Provisioned read/write capacity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read_capacity: i64,
    pub write_capacity: i64,
}

/// Backend-neutral view of a table description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub throughput: Option<Throughput>,
    pub status: TableStatus,
}

impl TableDescriptor {
    /// The only shape the lease table may have, as issued at creation.
    pub fn lease_table(name: impl Into<String>, throughput: Throughput) -> Self {
        Self {
            name: name.into(),
            attribute_definitions: vec![AttributeDefinition {
                name: ATTR_SHARD_ID.to_string(),
                attribute_type: AttributeType::String,
            }],
            key_schema: vec![KeySchemaElement {
                name: ATTR_SHARD_ID.to_string(),
                key_type: KeyType::Hash,
            }],
            throughput: Some(throughput),
            status: TableStatus::Creating,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TableStatus::Active
    }
}

/// Why a table description was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("no table description")]
    Missing,

    #[error("expected exactly 1 attribute definition, found {0}")]
    AttributeCount(usize),

    #[error("attribute definition is {0:?}, expected \"shard_id\"")]
    AttributeName(String),

    #[error("attribute shard_id has type {0}, expected S")]
    AttributeType(String),

    #[error("expected exactly 1 key schema element, found {0}")]
    KeyCount(usize),

    #[error("key schema element is {0:?}, expected \"shard_id\"")]
    KeyName(String),

    #[error("key shard_id has type {0}, expected HASH")]
    KeyType(String),
}

/// Strict compatibility gate for an existing lease table.
///
/// Accepts only one string attribute `shard_id` used as the sole partition
/// key. Any extra attribute definition, any sort key, a renamed key or a
/// non-string key type is rejected.
pub fn validate_schema(descriptor: Option<&TableDescriptor>) -> Result<(), SchemaViolation> {
    let descriptor = descriptor.ok_or(SchemaViolation::Missing)?;

    let [attribute] = descriptor.attribute_definitions.as_slice() else {
        return Err(SchemaViolation::AttributeCount(
            descriptor.attribute_definitions.len(),
        ));
    };
    if attribute.name != ATTR_SHARD_ID {
        return Err(SchemaViolation::AttributeName(attribute.name.clone()));
    }
    if attribute.attribute_type != AttributeType::String {
        return Err(SchemaViolation::AttributeType(
            attribute.attribute_type.code().to_string(),
        ));
    }

    let [key] = descriptor.key_schema.as_slice() else {
        return Err(SchemaViolation::KeyCount(descriptor.key_schema.len()));
    };
    if key.name != ATTR_SHARD_ID {
        return Err(SchemaViolation::KeyName(key.name.clone()));
    }
    if key.key_type != KeyType::Hash {
        return Err(SchemaViolation::KeyType(key.key_type.code().to_string()));
    }

    Ok(())
}

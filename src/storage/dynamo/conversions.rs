//! Conversions between DynamoDB types and lease table types.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, TableDescription};

use crate::storage::schema::{
    AttributeDefinition, AttributeType, KeySchemaElement, KeyType, TableDescriptor, TableStatus,
    Throughput, ATTR_CHECKPOINT, ATTR_LEASE_EXPIRATION, ATTR_SHARD_ID, ATTR_WORKER_ID,
};
use crate::storage::{Result, ShardLeaseRecord, StorageError};

type Item = HashMap<String, AttributeValue>;

/// Primary key of one shard's item.
pub(super) fn shard_key(shard_id: &str) -> Item {
    HashMap::from([(
        ATTR_SHARD_ID.to_string(),
        AttributeValue::S(shard_id.to_string()),
    )])
}

/// Shard id of an unprocessed key. An undecodable key is an error, since
/// dropping it would lose the shard from the read.
pub(super) fn shard_id_from_key(table: &str, key: &Item) -> Result<String> {
    string_attr(table, key, ATTR_SHARD_ID).cloned()
}

pub(super) fn record_to_item(record: &ShardLeaseRecord) -> Item {
    HashMap::from([
        (
            ATTR_SHARD_ID.to_string(),
            AttributeValue::S(record.shard_id.clone()),
        ),
        (
            ATTR_CHECKPOINT.to_string(),
            AttributeValue::S(record.checkpoint.clone()),
        ),
        (
            ATTR_LEASE_EXPIRATION.to_string(),
            AttributeValue::N(record.lease_expiration.to_string()),
        ),
        (
            ATTR_WORKER_ID.to_string(),
            AttributeValue::S(record.worker_id.clone()),
        ),
    ])
}

fn string_attr<'a>(table: &str, item: &'a Item, name: &str) -> Result<&'a String> {
    match item.get(name) {
        Some(value) => value.as_s().map_err(|_| StorageError::MalformedRecord {
            table: table.to_string(),
            reason: format!("attribute {} is not a string", name),
        }),
        None => Err(StorageError::MalformedRecord {
            table: table.to_string(),
            reason: format!("attribute {} is missing", name),
        }),
    }
}

/// Decode an item. All four attributes must be present with their wire types.
pub(super) fn record_from_item(table: &str, item: &Item) -> Result<ShardLeaseRecord> {
    let shard_id = string_attr(table, item, ATTR_SHARD_ID)?;
    let malformed = |reason: String| StorageError::MalformedRecord {
        table: table.to_string(),
        reason: format!("shard {}: {}", shard_id, reason),
    };

    let checkpoint = string_attr(table, item, ATTR_CHECKPOINT)?;
    let worker_id = string_attr(table, item, ATTR_WORKER_ID)?;
    let lease_expiration = item
        .get(ATTR_LEASE_EXPIRATION)
        .ok_or_else(|| malformed(format!("attribute {} is missing", ATTR_LEASE_EXPIRATION)))?
        .as_n()
        .map_err(|_| malformed(format!("attribute {} is not a number", ATTR_LEASE_EXPIRATION)))?
        .parse::<i64>()
        .map_err(|e| malformed(format!("attribute {}: {}", ATTR_LEASE_EXPIRATION, e)))?;

    Ok(ShardLeaseRecord {
        shard_id: shard_id.clone(),
        checkpoint: checkpoint.clone(),
        lease_expiration,
        worker_id: worker_id.clone(),
    })
}

pub(super) fn descriptor_from_description(
    table_name: &str,
    description: &TableDescription,
) -> TableDescriptor {
    TableDescriptor {
        name: description.table_name().unwrap_or(table_name).to_string(),
        attribute_definitions: description
            .attribute_definitions()
            .iter()
            .map(|attribute| AttributeDefinition {
                name: attribute.attribute_name().to_string(),
                attribute_type: AttributeType::from_code(attribute.attribute_type().as_str()),
            })
            .collect(),
        key_schema: description
            .key_schema()
            .iter()
            .map(|key| KeySchemaElement {
                name: key.attribute_name().to_string(),
                key_type: KeyType::from_code(key.key_type().as_str()),
            })
            .collect(),
        throughput: description.provisioned_throughput().map(|throughput| Throughput {
            read_capacity: throughput.read_capacity_units().unwrap_or_default(),
            write_capacity: throughput.write_capacity_units().unwrap_or_default(),
        }),
        status: description
            .table_status()
            .map(|status| TableStatus::from_code(status.as_str()))
            .unwrap_or_else(|| TableStatus::Other("UNKNOWN".to_string())),
    }
}

//! DynamoDB lease table backend.

mod conversions;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, KeySchemaElement, KeyType, KeysAndAttributes, ProvisionedThroughput,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use crate::config::LeaseTableConfig;
use crate::storage::backend::{BatchGetOutput, BatchGetRequest, TableBackend};
use crate::storage::schema::TableDescriptor;
use crate::storage::{Result, ShardLeaseRecord, StorageError};

use conversions::{
    descriptor_from_description, record_from_item, record_to_item, shard_id_from_key, shard_key,
};

/// DynamoDB implementation of TableBackend.
#[derive(Clone)]
pub struct DynamoTableBackend {
    client: Client,
}

impl std::fmt::Debug for DynamoTableBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoTableBackend").finish_non_exhaustive()
    }
}

impl DynamoTableBackend {
    /// Connect using the default AWS config chain plus the region and
    /// endpoint overrides from `config`.
    pub async fn connect(config: &LeaseTableConfig) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);

        if let Some(region) = &config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            table = %config.table_name,
            endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
            "Connected to DynamoDB for shard leases"
        );

        Self::from_client(Client::from_conf(builder.build()))
    }

    /// Wrap a pre-built client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn sdk_failure<E, R>(operation: &'static str, table: &str, err: SdkError<E, R>) -> StorageError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    StorageError::service(operation, table, DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl TableBackend for DynamoTableBackend {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescriptor> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception())
                {
                    StorageError::TableNotFound {
                        table: table_name.to_string(),
                    }
                } else {
                    sdk_failure("DescribeTable", table_name, e)
                }
            })?;

        let description = output.table().ok_or_else(|| {
            StorageError::service("DescribeTable", table_name, "response carried no table")
        })?;

        Ok(descriptor_from_description(table_name, description))
    }

    async fn create_table(&self, table: &TableDescriptor) -> Result<()> {
        let name = table.name.as_str();
        let build_failure = |e| StorageError::service("CreateTable", name, e);

        let mut request = self.client.create_table().table_name(name);
        for attribute in &table.attribute_definitions {
            request = request.attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(&attribute.name)
                    .attribute_type(ScalarAttributeType::from(attribute.attribute_type.code()))
                    .build()
                    .map_err(build_failure)?,
            );
        }
        for key in &table.key_schema {
            request = request.key_schema(
                KeySchemaElement::builder()
                    .attribute_name(&key.name)
                    .key_type(KeyType::from(key.key_type.code()))
                    .build()
                    .map_err(build_failure)?,
            );
        }
        if let Some(throughput) = table.throughput {
            request = request.provisioned_throughput(
                ProvisionedThroughput::builder()
                    .read_capacity_units(throughput.read_capacity)
                    .write_capacity_units(throughput.write_capacity)
                    .build()
                    .map_err(build_failure)?,
            );
        }

        let output = request.send().await.map_err(|e| {
            if e.as_service_error()
                .is_some_and(|se| se.is_resource_in_use_exception())
            {
                StorageError::TableAlreadyExists {
                    table: name.to_string(),
                }
            } else {
                sdk_failure("CreateTable", name, e)
            }
        })?;

        debug!(
            table = %name,
            status = output
                .table_description()
                .and_then(|d| d.table_status())
                .map(|s| s.as_str())
                .unwrap_or("unknown"),
            "CreateTable accepted"
        );

        Ok(())
    }

    async fn put_item(&self, table_name: &str, record: &ShardLeaseRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|e| sdk_failure("PutItem", table_name, e))?;

        Ok(())
    }

    async fn batch_get_item(&self, request: BatchGetRequest) -> Result<BatchGetOutput> {
        let table_name = request.table_name.as_str();

        let keys = request.shard_ids.iter().map(|id| shard_key(id)).collect();
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .projection_expression(request.projection)
            .consistent_read(request.consistent_read)
            .build()
            .map_err(|e| StorageError::service("BatchGetItem", table_name, e))?;

        let output = self
            .client
            .batch_get_item()
            .request_items(table_name, keys_and_attributes)
            .send()
            .await
            .map_err(|e| sdk_failure("BatchGetItem", table_name, e))?;

        let records = output
            .responses()
            .and_then(|responses| responses.get(table_name))
            .map(|items| {
                items
                    .iter()
                    .map(|item| record_from_item(table_name, item))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        let unprocessed = output
            .unprocessed_keys()
            .and_then(|unprocessed| unprocessed.get(table_name))
            .map(|pending| {
                pending
                    .keys()
                    .iter()
                    .map(|key| shard_id_from_key(table_name, key))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(BatchGetOutput {
            records,
            unprocessed,
        })
    }
}

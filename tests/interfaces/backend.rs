//! Backend factory for interface tests.
//!
//! Provides a unified interface to create lease stores based on environment configuration.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shardlease::config::LeaseTableConfig;
use shardlease::storage::mock::MockTableBackend;
use shardlease::storage::{lease_store_with, LeaseStore};

#[cfg(feature = "dynamo")]
use std::time::Duration;

#[cfg(feature = "dynamo")]
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    GenericImage, ImageExt,
};

static TABLE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mock,
    Dynamo,
}

impl StorageBackend {
    pub fn from_env() -> Self {
        match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "mock".to_string())
            .to_lowercase()
            .as_str()
        {
            "dynamo" | "dynamodb" => StorageBackend::Dynamo,
            _ => StorageBackend::Mock,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Mock => "mock",
            StorageBackend::Dynamo => "dynamo",
        }
    }
}

/// Container handles to keep containers alive during tests.
#[allow(dead_code)]
#[derive(Debug)]
pub enum ContainerHandle {
    None,
    #[cfg(feature = "dynamo")]
    Dynamo(testcontainers::ContainerAsync<GenericImage>),
}

/// Holds the lease store for a backend.
pub struct StorageContext {
    pub lease_store: Arc<dyn LeaseStore>,
    /// Container handle to keep container alive.
    #[allow(dead_code)]
    container: ContainerHandle,
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("lease_store", &"<dyn LeaseStore>")
            .field("container", &self.container)
            .finish()
    }
}

/// Unique table per scenario so scenarios sharing a service stay isolated.
fn scenario_config() -> LeaseTableConfig {
    let n = TABLE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut config =
        LeaseTableConfig::for_table(format!("shard-leases-{}-{}", std::process::id(), n));
    config.provisioning.poll_interval_ms = 200;
    config.provisioning.timeout_secs = 60;
    config
}

impl StorageContext {
    /// Create a storage context for the configured backend.
    pub async fn new(backend: StorageBackend) -> Self {
        match backend {
            StorageBackend::Mock => Self::create_mock(),
            StorageBackend::Dynamo => Self::create_dynamo().await,
        }
    }

    fn create_mock() -> Self {
        StorageContext {
            lease_store: lease_store_with(MockTableBackend::new(), &scenario_config()),
            container: ContainerHandle::None,
        }
    }

    #[cfg(feature = "dynamo")]
    async fn create_dynamo() -> Self {
        use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
        use shardlease::storage::DynamoTableBackend;

        let image = GenericImage::new("amazon/dynamodb-local", "2.5.2")
            .with_exposed_port(8000.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Initializing DynamoDB Local"));

        let container = image
            .with_startup_timeout(Duration::from_secs(60))
            .start()
            .await
            .expect("Failed to start DynamoDB Local container");

        // Brief delay for full readiness
        tokio::time::sleep(Duration::from_secs(1)).await;

        let host_port = container
            .get_host_port_ipv4(8000)
            .await
            .expect("Failed to get port");

        let host = container.get_host().await.expect("Failed to get host");

        let dynamo_config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("local", "local", None, None, "static"))
            .endpoint_url(format!("http://{}:{}", host, host_port))
            .build();
        let backend =
            DynamoTableBackend::from_client(aws_sdk_dynamodb::Client::from_conf(dynamo_config));

        StorageContext {
            lease_store: lease_store_with(backend, &scenario_config()),
            container: ContainerHandle::Dynamo(container),
        }
    }

    #[cfg(not(feature = "dynamo"))]
    async fn create_dynamo() -> Self {
        panic!("DynamoDB feature not enabled. Build with --features dynamo");
    }
}

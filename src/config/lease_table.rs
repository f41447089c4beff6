//! Lease table configuration types.

use std::time::Duration;

use serde::Deserialize;

use super::ConfigError;

/// Lease table configuration.
///
/// The table is shared by every worker of a deployment, so all workers must
/// agree on `table_name`. Capacities only matter when this process is the one
/// that creates the table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaseTableConfig {
    /// Name of the lease table.
    pub table_name: String,
    /// Provisioned read capacity units used at creation.
    pub read_capacity: i64,
    /// Provisioned write capacity units used at creation.
    pub write_capacity: i64,
    /// AWS region override. Uses the SDK default chain when unset.
    pub region: Option<String>,
    /// Endpoint override (DynamoDB Local, LocalStack).
    pub endpoint_url: Option<String>,
    /// Readiness wait after table creation.
    pub provisioning: ProvisioningConfig,
}

impl Default for LeaseTableConfig {
    fn default() -> Self {
        Self {
            table_name: "shard_leases".to_string(),
            read_capacity: 5,
            write_capacity: 5,
            region: None,
            endpoint_url: None,
            provisioning: ProvisioningConfig::default(),
        }
    }
}

impl LeaseTableConfig {
    /// Config for a named table with default capacity and provisioning.
    pub fn for_table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Check values the service would reject anyway, before any call is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.table_name;
        if name.len() < 3 || name.len() > 255 {
            return Err(ConfigError::Invalid {
                field: "table_name",
                reason: format!("length {} outside 3..=255", name.len()),
            });
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(ConfigError::Invalid {
                field: "table_name",
                reason: format!("character {:?} not allowed", c),
            });
        }
        if self.read_capacity < 1 {
            return Err(ConfigError::Invalid {
                field: "read_capacity",
                reason: format!("must be at least 1, got {}", self.read_capacity),
            });
        }
        if self.write_capacity < 1 {
            return Err(ConfigError::Invalid {
                field: "write_capacity",
                reason: format!("must be at least 1, got {}", self.write_capacity),
            });
        }
        if self.provisioning.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "provisioning.poll_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.provisioning.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "provisioning.timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Readiness wait configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Delay between table status polls.
    /// Default: 1000
    pub poll_interval_ms: u64,
    /// Upper bound on the whole wait.
    /// Default: 300
    pub timeout_secs: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            timeout_secs: 300,
        }
    }
}

impl ProvisioningConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

//! shardlease-provision: Lease table bootstrap
//!
//! Validates the shared lease table and creates it when it does not exist,
//! blocking until it is ACTIVE. Intended as an init step before workers
//! start.
//!
//! ## Configuration
//! - SHARDLEASE_CONFIG: Path to a YAML config file (optional)
//! - SHARDLEASE__LEASE_TABLE__TABLE_NAME, SHARDLEASE__LEASE_TABLE__READ_CAPACITY, ...:
//!   per-field overrides
//! - SHARDLEASE_LOG: tracing filter (default: info)
//!
//! Ctrl-C cancels the readiness wait.

use tokio::sync::watch;
use tracing::{info, warn};

use shardlease::config::Config;
use shardlease::storage::init_lease_store;
use shardlease::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;
    let table = &config.lease_table;
    info!(
        table = %table.table_name,
        read_capacity = table.read_capacity,
        write_capacity = table.write_capacity,
        "shardlease-provision started"
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    let store = init_lease_store(table).await;
    store.ensure_table(cancel_rx).await?;

    info!(table = %table.table_name, "Lease table ready");
    Ok(())
}

//! Interface tests for lease store backends using Cucumber.
//!
//! These tests verify that every table backend gives the same LeaseStore
//! contract. Select a backend via environment variable:
//!
//! ```bash
//! # In-memory (default)
//! cargo test --test interfaces --features test-utils
//!
//! # DynamoDB Local (uses testcontainers)
//! STORAGE_BACKEND=dynamo cargo test --test interfaces --features test-utils,dynamo
//! ```

mod backend;
mod steps;

use cucumber::World;
use steps::lease_store::LeaseStoreWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running LeaseStore Interface Tests ===\n");
    LeaseStoreWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/interfaces/features/lease_store.feature")
        .await;
}

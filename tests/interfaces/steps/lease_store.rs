//! LeaseStore interface step definitions.

use std::collections::HashMap;

use cucumber::{given, then, when, World};
use shardlease::storage::{never_cancelled, LeaseStore, ShardLeaseRecord};

use crate::backend::{StorageBackend, StorageContext};

/// Test context for LeaseStore scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct LeaseStoreWorld {
    backend: StorageBackend,
    context: Option<StorageContext>,
    last_read: HashMap<String, ShardLeaseRecord>,
    last_error: Option<String>,
}

impl LeaseStoreWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            last_read: HashMap::new(),
            last_error: None,
        }
    }

    fn store(&self) -> &dyn LeaseStore {
        self.context
            .as_ref()
            .expect("Storage context not initialized")
            .lease_store
            .as_ref()
    }

    async fn read(&mut self, shard_ids: Vec<String>) {
        let result = self.store().get_shard_data(&shard_ids).await;
        match result {
            Ok(records) => {
                self.last_read = records;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }
}

fn shard_name(index: usize) -> String {
    format!("shardId-{:012}", index)
}

// --- Background ---

#[given("a LeaseStore backend")]
async fn given_lease_store_backend(world: &mut LeaseStoreWorld) {
    println!("Using backend: {}", world.backend.name());
    let ctx = StorageContext::new(world.backend).await;
    world.context = Some(ctx);
}

#[given("the lease table has been ensured")]
async fn given_table_ensured(world: &mut LeaseStoreWorld) {
    world
        .store()
        .ensure_table(never_cancelled())
        .await
        .expect("Failed to ensure lease table");
}

// --- When steps ---

#[when("I ensure the lease table again")]
async fn when_ensure_again(world: &mut LeaseStoreWorld) {
    if let Err(e) = world.store().ensure_table(never_cancelled()).await {
        world.last_error = Some(e.to_string());
    }
}

#[when(
    expr = "worker {string} checkpoints shard {string} at {string} with lease expiration {int}"
)]
async fn when_checkpoint(
    world: &mut LeaseStoreWorld,
    worker_id: String,
    shard_id: String,
    sequence_number: String,
    lease_expiration: i64,
) {
    world
        .store()
        .checkpoint(&shard_id, &sequence_number, lease_expiration, &worker_id)
        .await
        .expect("Failed to checkpoint");
}

#[when(expr = "worker {string} checkpoints {int} shards")]
async fn when_checkpoint_many(world: &mut LeaseStoreWorld, worker_id: String, count: usize) {
    for i in 0..count {
        world
            .store()
            .checkpoint(&shard_name(i), &format!("seq-{}", i), 1000, &worker_id)
            .await
            .expect("Failed to checkpoint");
    }
}

#[when(expr = "I read shards {string}")]
async fn when_read_shards(world: &mut LeaseStoreWorld, shard_ids: String) {
    let ids = shard_ids.split(',').map(|s| s.trim().to_string()).collect();
    world.read(ids).await;
}

#[when("I read no shards")]
async fn when_read_nothing(world: &mut LeaseStoreWorld) {
    world.read(Vec::new()).await;
}

#[when(expr = "I read the first {int} shards")]
async fn when_read_first(world: &mut LeaseStoreWorld, count: usize) {
    world.read((0..count).map(shard_name).collect()).await;
}

// --- Then steps ---

#[then("the lease table is valid")]
async fn then_table_valid(world: &mut LeaseStoreWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
    world
        .store()
        .validate_table()
        .await
        .expect("Lease table failed validation");
}

#[then(expr = "shard {string} has checkpoint {string} with lease expiration {int} owned by {string}")]
fn then_shard_has(
    world: &mut LeaseStoreWorld,
    shard_id: String,
    checkpoint: String,
    lease_expiration: i64,
    worker_id: String,
) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
    let record = world
        .last_read
        .get(&shard_id)
        .unwrap_or_else(|| panic!("Shard {} missing from read", shard_id));
    assert_eq!(
        record,
        &ShardLeaseRecord::new(shard_id.as_str(), checkpoint, lease_expiration, worker_id)
    );
}

#[then(expr = "the read returns {int} shards")]
fn then_read_count(world: &mut LeaseStoreWorld, expected: usize) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
    assert_eq!(world.last_read.len(), expected);
}

#[then(expr = "shard {string} is absent")]
fn then_shard_absent(world: &mut LeaseStoreWorld, shard_id: String) {
    assert!(!world.last_read.contains_key(&shard_id));
}

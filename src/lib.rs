//! shardlease - lease and checkpoint persistence for stream-shard consumers
//!
//! Stores one record per shard (`shard_id`, `checkpoint`, `lease_expiration`,
//! `worker_id`) in a shared key-value table. Workers use it to validate or
//! provision the table at startup, upsert progress and ownership, and read
//! the current state of many shards before making assignment decisions.

pub mod config;
pub mod storage;
pub mod utils;

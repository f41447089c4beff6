//! Shard lease record.

use std::fmt;

/// Lease and checkpoint state of one shard.
///
/// A record either does not exist (the shard was never claimed) or has all
/// four fields set. Every write replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLeaseRecord {
    pub shard_id: String,
    /// Last processed position. Opaque to storage.
    pub checkpoint: String,
    /// Time after which another worker may take the lease. The caller owns
    /// the clock and the comparison.
    pub lease_expiration: i64,
    pub worker_id: String,
}

impl ShardLeaseRecord {
    pub fn new(
        shard_id: impl Into<String>,
        checkpoint: impl Into<String>,
        lease_expiration: i64,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            shard_id: shard_id.into(),
            checkpoint: checkpoint.into(),
            lease_expiration,
            worker_id: worker_id.into(),
        }
    }
}

impl fmt::Display for ShardLeaseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shard_id={}, checkpoint={}, lease_expiration={}, worker_id={}",
            self.shard_id, self.checkpoint, self.lease_expiration, self.worker_id
        )
    }
}

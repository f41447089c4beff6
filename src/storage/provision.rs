//! Lease table creation and readiness wait.

use std::time::Duration;

use backon::Retryable;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::backend::TableBackend;
use super::schema::{TableDescriptor, Throughput};
use super::{Result, StorageError};
use crate::config::LeaseTableConfig;
use crate::utils::retry::readiness_backoff;

/// Cancellation signal for the readiness wait. Sending `true` stops it.
pub type CancelSignal = watch::Receiver<bool>;

/// A signal that never fires.
pub fn never_cancelled() -> CancelSignal {
    let (_tx, rx) = watch::channel(false);
    rx
}

/// Resolves once the signal carries `true`. A dropped sender never cancels.
async fn cancelled(signal: &mut CancelSignal) {
    loop {
        if *signal.borrow_and_update() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Creates the lease table and waits for it to become usable.
#[derive(Debug, Clone)]
pub struct TableProvisioner {
    throughput: Throughput,
    poll_interval: Duration,
    timeout: Duration,
}

impl TableProvisioner {
    pub fn new(throughput: Throughput, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            throughput,
            poll_interval,
            timeout,
        }
    }

    pub fn from_config(config: &LeaseTableConfig) -> Self {
        Self::new(
            Throughput {
                read_capacity: config.read_capacity,
                write_capacity: config.write_capacity,
            },
            config.provisioning.poll_interval(),
            config.provisioning.timeout(),
        )
    }

    /// Issue creation of the lease table, then wait until it is ACTIVE.
    ///
    /// Nothing is created when `cancel` already carries `true`. A failing
    /// create call is returned as is. If another worker won the
    /// creation race the wait still runs and the resulting description is
    /// returned for the caller to validate.
    pub async fn provision<B>(
        &self,
        backend: &B,
        table_name: &str,
        cancel: CancelSignal,
    ) -> Result<TableDescriptor>
    where
        B: TableBackend + ?Sized,
    {
        if *cancel.borrow() {
            warn!(table = %table_name, "Lease table provisioning cancelled before creation");
            return Err(StorageError::Cancelled {
                table: table_name.to_string(),
            });
        }

        let descriptor = TableDescriptor::lease_table(table_name, self.throughput);

        match backend.create_table(&descriptor).await {
            Ok(()) => {
                info!(
                    table = %table_name,
                    read_capacity = self.throughput.read_capacity,
                    write_capacity = self.throughput.write_capacity,
                    "Created lease table"
                );
            }
            Err(StorageError::TableAlreadyExists { .. }) => {
                info!(table = %table_name, "Lease table created concurrently by another worker");
            }
            Err(e) => {
                error!(table = %table_name, error = %e, "Unable to create lease table");
                return Err(e);
            }
        }

        self.wait_until_active(backend, table_name, cancel).await
    }

    /// Poll the table status until ACTIVE.
    ///
    /// Failed polls and non-ACTIVE statuses are skipped. Stops with
    /// `ProvisionTimeout` once the configured timeout elapses and with
    /// `Cancelled` as soon as `cancel` turns true.
    pub async fn wait_until_active<B>(
        &self,
        backend: &B,
        table_name: &str,
        mut cancel: CancelSignal,
    ) -> Result<TableDescriptor>
    where
        B: TableBackend + ?Sized,
    {
        let poll = || async move {
            let descriptor = backend.describe_table(table_name).await?;
            debug!(table = %table_name, status = %descriptor.status, "Polled lease table status");
            if descriptor.is_active() {
                Ok(descriptor)
            } else {
                Err(StorageError::NotActive {
                    table: table_name.to_string(),
                    status: descriptor.status.to_string(),
                })
            }
        };

        let wait = poll
            .retry(readiness_backoff(self.poll_interval, self.timeout))
            .notify(|err: &StorageError, delay: Duration| match err {
                StorageError::NotActive { .. } | StorageError::TableNotFound { .. } => {
                    debug!(table = %table_name, error = %err, delay = ?delay, "Lease table not ready");
                }
                _ => {
                    warn!(table = %table_name, error = %err, delay = ?delay, "Lease table status poll failed, retrying");
                }
            });

        let started = tokio::time::Instant::now();
        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                warn!(table = %table_name, "Lease table readiness wait cancelled");
                Err(StorageError::Cancelled {
                    table: table_name.to_string(),
                })
            }
            outcome = tokio::time::timeout(self.timeout, wait) => match outcome {
                Ok(Ok(descriptor)) => {
                    info!(table = %table_name, waited = ?started.elapsed(), "Lease table is ACTIVE");
                    Ok(descriptor)
                }
                Ok(Err(last)) => {
                    error!(table = %table_name, error = %last, "Lease table never became ACTIVE");
                    Err(StorageError::ProvisionTimeout {
                        table: table_name.to_string(),
                        waited: started.elapsed(),
                    })
                }
                Err(_) => {
                    error!(table = %table_name, timeout = ?self.timeout, "Lease table readiness wait timed out");
                    Err(StorageError::ProvisionTimeout {
                        table: table_name.to_string(),
                        waited: self.timeout,
                    })
                }
            }
        }
    }
}

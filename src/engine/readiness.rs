// src/engine/readiness.rs

//! Waiting for the data store to accept connections.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

use crate::errors::{DevstackError, Result};

/// How to decide that the data store is ready for the application server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Sleep for a fixed time and assume it is up.
    FixedDelay(Duration),
    /// Poll `address` with TCP connects every `interval` until one succeeds
    /// or `timeout` has elapsed.
    Probe {
        address: String,
        interval: Duration,
        timeout: Duration,
    },
}

impl Readiness {
    pub async fn wait(&self) -> Result<()> {
        match self {
            Readiness::FixedDelay(delay) => {
                debug!(?delay, "waiting fixed delay for data store");
                sleep(*delay).await;
                Ok(())
            }
            Readiness::Probe {
                address,
                interval,
                timeout,
            } => probe(address, *interval, *timeout).await,
        }
    }
}

async fn probe(address: &str, interval: Duration, limit: Duration) -> Result<()> {
    let started = Instant::now();
    let deadline = started + limit;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining.min(interval), TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => {
                info!(
                    address,
                    attempts,
                    elapsed = ?started.elapsed(),
                    "data store is accepting connections"
                );
                return Ok(());
            }
            Ok(Err(e)) => debug!(address, attempts, error = %e, "data store not ready yet"),
            Err(_) => debug!(address, attempts, "connect attempt timed out"),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(DevstackError::DependencyNotReady {
                address: address.to_string(),
                waited: now - started,
            });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

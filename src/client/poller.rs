//! Polling loop: fetch pending messages, deliver them, confirm each success.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::deliver::Deliverer;
use super::RelayClient;
use crate::error::{Error, Result};

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Poller {
    client: RelayClient,
    deliverer: Arc<dyn Deliverer>,
    interval: Duration,
}

impl Poller {
    pub fn new(client: RelayClient, deliverer: Arc<dyn Deliverer>, interval: Duration) -> Self {
        Self {
            client,
            deliverer,
            interval,
        }
    }

    /// One cycle. Messages that fail to deliver stay pending and are retried
    /// on the next poll.
    pub async fn run_once(&self) -> Result<PollReport> {
        let messages = self.client.poll().await?;
        let mut report = PollReport::default();

        if !messages.is_empty() {
            tracing::debug!("Polled {} pending message(s)", messages.len());
        }

        for message in messages {
            if let Err(e) = self.deliverer.deliver(&message).await {
                tracing::warn!("{} failed to deliver {}: {}", self.deliverer.name(), message.id, e);
                report.failed += 1;
                continue;
            }

            match self.client.confirm(&message.id).await {
                Ok(()) => {
                    tracing::info!("Delivered {} to {}", message.id, message.to);
                    report.delivered += 1;
                }
                Err(Error::NotFound(_)) => {
                    // Another client confirmed it between our poll and confirm.
                    tracing::warn!("Message {} was already confirmed", message.id);
                    report.delivered += 1;
                }
                Err(e) => {
                    tracing::error!("Delivered {} but confirm failed: {}", message.id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Poll every interval until `shutdown` resolves.
    ///
    /// A rejected token stops the loop; other poll failures are logged and retried.
    /// `shutdown` is honoured even while a cycle is in flight; the interrupted
    /// cycle's unconfirmed messages stay pending on the relay.
    pub async fn run(&self, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            "Polling {} every {}s via {}",
            self.client.base_url(),
            self.interval.as_secs(),
            self.deliverer.name()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Poller stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    // A cycle blocked on a slow relay or delivery must not hold off shutdown.
                    let cycle = tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!("Poller stopped mid-cycle");
                            return Ok(());
                        }
                        cycle = self.run_once() => cycle,
                    };

                    match cycle {
                        Ok(_) => {}
                        Err(Error::Unauthorized) => return Err(Error::Unauthorized),
                        Err(e) => tracing::warn!("Poll failed: {}", e),
                    }
                }
            }
        }
    }
}

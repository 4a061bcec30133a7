//! Delivery backends: what the polling client does with each pending message.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use crate::core::Message;
use crate::error::{Error, Result};

/// Hands a message to the outside world (an SMS gateway, a modem, a log).
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Deliver one message. An error leaves the message pending on the relay.
    async fn deliver(&self, message: &Message) -> Result<()>;
}

/// Build the deliverer for an optional command line.
pub fn create_deliverer(
    command: Option<Vec<String>>,
    timeout: Duration,
) -> Result<Arc<dyn Deliverer>> {
    match command {
        Some(argv) => Ok(Arc::new(CommandDeliverer::new(argv)?.with_timeout(timeout))),
        None => Ok(Arc::new(LogDeliverer)),
    }
}

/// Prints each message instead of sending it.
pub struct LogDeliverer;

#[async_trait]
impl Deliverer for LogDeliverer {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, message: &Message) -> Result<()> {
        tracing::info!("Delivering {} to {}", message.id, message.to);
        println!("[{}] -> {}: {}", message.id, message.to, message.body);
        Ok(())
    }
}

/// Runs an external program per message, e.g.
/// `termux-sms-send -n {to} {body}`.
///
/// `{to}`, `{body}` and `{id}` are replaced inside each argument; the
/// arguments are passed directly, never through a shell. A run that outlives
/// the timeout is killed and counts as a failed delivery.
pub struct CommandDeliverer {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandDeliverer {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            return Err(Error::Config("Delivery command is empty".to_string()));
        }
        Ok(Self {
            argv,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn render(&self, message: &Message) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{to}", &message.to)
                    .replace("{body}", &message.body)
                    .replace("{id}", &message.id)
            })
            .collect()
    }
}

#[async_trait]
impl Deliverer for CommandDeliverer {
    fn name(&self) -> &str {
        &self.argv[0]
    }

    async fn deliver(&self, message: &Message) -> Result<()> {
        let args = self.render(message);
        let run = Command::new(&args[0])
            .args(&args[1..])
            .kill_on_drop(true)
            .output();

        // Dropping the timed-out future kills the child.
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                Error::Delivery(format!(
                    "{} timed out after {}s",
                    args[0],
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| Error::Delivery(format!("Failed to run {}: {}", args[0], e)))?;

        if output.status.success() {
            tracing::debug!("{} delivered {}", args[0], message.id);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Error::Delivery(format!(
                "{} exited with {}: {}",
                args[0],
                output.status,
                stderr.trim()
            )))
        }
    }
}

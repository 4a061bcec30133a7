//! In-memory outbound message queue.
//!
//! Two partitions behind one lock:
//! - pending: waiting for a client to pick up, in insertion order
//! - sent   : confirmed deliveries, append-only, in confirmation order

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::message::Message;
use crate::error::Error;

#[derive(Default)]
struct Partitions {
    pending: Vec<Message>,
    sent: Vec<Message>,
}

/// Queue operations. Every method holds the lock for its whole duration,
/// so a confirm's move between partitions is never observed half-done.
#[derive(Default)]
pub struct MessageQueue {
    inner: Mutex<Partitions>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // No operation panics mid-mutation, so a poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Partitions> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a message for delivery.
    pub fn enqueue(&self, to: &str, body: &str) -> Result<Message, Error> {
        let to = to.trim();
        let body = body.trim();
        if to.is_empty() || body.is_empty() {
            return Err(Error::Validation);
        }

        let message = Message::new(to.to_string(), body.to_string());
        self.lock().pending.push(message.clone());

        tracing::debug!("Enqueued message {} for {}", message.id, message.to);
        Ok(message)
    }

    /// Snapshot of pending messages, oldest first.
    pub fn pending(&self) -> Vec<Message> {
        self.lock().pending.clone()
    }

    /// Mark a pending message as sent and move it to the sent log.
    ///
    /// Fails with [`Error::NotFound`] when the id is unknown or was already
    /// confirmed; confirming twice is an error, not a no-op.
    pub fn confirm(&self, id: &str) -> Result<Message, Error> {
        let mut parts = self.lock();

        let index = parts
            .pending
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let mut message = parts.pending.remove(index);
        message.mark_sent();
        parts.sent.push(message.clone());
        drop(parts);

        tracing::debug!("Confirmed message {}", id);
        Ok(message)
    }

    /// Every message, newest `created_at` first.
    ///
    /// The sort is stable over `sent ++ pending`, so equal timestamps list
    /// sent messages before pending ones, each in partition order.
    pub fn all(&self) -> Vec<Message> {
        let mut messages = {
            let parts = self.lock();
            let mut all = Vec::with_capacity(parts.sent.len() + parts.pending.len());
            all.extend(parts.sent.iter().cloned());
            all.extend(parts.pending.iter().cloned());
            all
        };

        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages
    }

    /// Get queue statistics.
    pub fn stats(&self) -> QueueStats {
        let parts = self.lock();
        QueueStats {
            pending: parts.pending.len(),
            sent: parts.sent.len(),
            total: parts.pending.len() + parts.sent.len(),
        }
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueueStats {
    pub pending: usize,
    pub sent: usize,
    pub total: usize,
}

impl std::fmt::Display for QueueStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Queue Stats:")?;
        writeln!(f, "  Pending: {}", self.pending)?;
        writeln!(f, "  Sent:    {}", self.sent)?;
        write!(f, "  Total:   {}", self.total)
    }
}

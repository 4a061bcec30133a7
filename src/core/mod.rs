//! Core module - the message queue and its records.
//!
//! Messages are created pending, handed to a polling client, and moved to
//! the append-only sent log once the client confirms delivery.

pub mod message;
pub mod queue;

pub use message::{Message, MessageStatus};
pub use queue::{MessageQueue, QueueStats};

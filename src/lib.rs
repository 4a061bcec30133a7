//! SMS Bridge library root.

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod web;

pub use cli::Commands;
pub use client::{Deliverer, Poller, RelayClient};
pub use config::{load_settings, Settings};
pub use crate::core::{Message, MessageQueue, MessageStatus, QueueStats};
pub use error::{Error, Result};

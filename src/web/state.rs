//! Shared state handed to every request handler.

use std::sync::Arc;

use crate::core::MessageQueue;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<MessageQueue>,
    /// Expected value of the `X-Token` header.
    pub token: Arc<str>,
}

impl AppState {
    pub fn new(queue: Arc<MessageQueue>, token: impl Into<Arc<str>>) -> Self {
        Self {
            queue,
            token: token.into(),
        }
    }
}

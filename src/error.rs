//! Error types for SMS Bridge.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Enqueue request with a blank destination or body.
    #[error("Missing 'to' or 'body'")]
    Validation,

    #[error("Payload too large")]
    PayloadTooLarge,

    /// Confirm of an id that is not pending (unknown or already sent).
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Unexpected response: {0}")]
    Response(String),
}

//! Client side of the relay: API calls, delivery backends and the polling loop.

pub mod deliver;
pub mod poller;

pub use deliver::{create_deliverer, CommandDeliverer, Deliverer, LogDeliverer};
pub use poller::{PollReport, Poller};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::core::{Message, QueueStats};
use crate::error::{Error, Result};
use crate::web::api::messages::{LogResponse, OkResponse, PollResponse};
use crate::web::auth::TOKEN_HEADER;

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    body: &'a str,
}

/// HTTP client for a running relay server.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Connect and request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

impl RelayClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    /// Every call fails with [`Error::Http`] once `timeout` passes, so a relay
    /// that accepts connections but never answers cannot stall the caller.
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    /// Map the relay's error statuses onto crate errors.
    fn check(response: Response, subject: &str) -> Result<Response> {
        match response.status() {
            StatusCode::BAD_REQUEST => Err(Error::Validation),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
            StatusCode::NOT_FOUND => Err(Error::NotFound(subject.to_string())),
            _ => Ok(response.error_for_status()?),
        }
    }

    /// Queue a message, returning its id.
    pub async fn send(&self, to: &str, body: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("/send"))
            .json(&SendRequest { to, body })
            .send()
            .await?;

        let ok: OkResponse = Self::check(response, "/send")?.json().await?;
        ok.id
            .ok_or_else(|| Error::Response("send response carried no id".to_string()))
    }

    /// Fetch pending messages.
    pub async fn poll(&self) -> Result<Vec<Message>> {
        let response = self.authed(self.client.get(self.url("/poll"))).send().await?;
        let poll: PollResponse = Self::check(response, "/poll")?.json().await?;
        Ok(poll.messages)
    }

    /// Confirm delivery of a message.
    pub async fn confirm(&self, id: &str) -> Result<()> {
        let response = self
            .authed(self.client.post(self.url(&format!("/confirm/{}", id))))
            .send()
            .await?;

        let ok: OkResponse = Self::check(response, id)?.json().await?;
        if ok.ok {
            Ok(())
        } else {
            Err(Error::Response(format!("confirm of {} not acknowledged", id)))
        }
    }

    /// Fetch the full log, newest first.
    pub async fn log(&self) -> Result<Vec<Message>> {
        let response = self.client.get(self.url("/log")).send().await?;
        let log: LogResponse = Self::check(response, "/log")?.json().await?;
        Ok(log.log)
    }

    pub async fn stats(&self) -> Result<QueueStats> {
        let response = self.client.get(self.url("/stats")).send().await?;
        Ok(Self::check(response, "/stats")?.json().await?)
    }
}

//! API endpoints for the message queue.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::core::{Message, QueueStats};
use crate::error::Error;
use crate::web::auth::Authorized;
use crate::web::state::AppState;

/// Send request from the dashboard.
#[derive(Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Plain acknowledgement, optionally carrying the new message id.
#[derive(Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct PollResponse {
    pub messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
pub struct LogResponse {
    pub log: Vec<Message>,
}

/// Queue a message. An unreadable body counts as missing fields.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, Error> {
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!("Rejected send body: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::PayloadTooLarge
        } else {
            Error::Validation
        }
    })?;

    let to = payload.to.unwrap_or_default();
    let body = payload.body.unwrap_or_default();
    let message = state.queue.enqueue(&to, &body)?;

    Ok(Json(OkResponse {
        ok: true,
        id: Some(message.id),
    }))
}

/// Pending messages for the delivering client.
pub async fn poll_messages(_auth: Authorized, State(state): State<AppState>) -> Json<PollResponse> {
    Json(PollResponse {
        messages: state.queue.pending(),
    })
}

/// Confirm that a message was delivered.
pub async fn confirm_message(
    _auth: Authorized,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, Error> {
    state.queue.confirm(&id)?;
    Ok(Json(OkResponse { ok: true, id: None }))
}

/// Every message, newest first.
pub async fn message_log(State(state): State<AppState>) -> Json<LogResponse> {
    Json(LogResponse {
        log: state.queue.all(),
    })
}

pub async fn queue_stats(State(state): State<AppState>) -> Json<QueueStats> {
    Json(state.queue.stats())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::core::MessageQueue;
    use crate::web::router::create_app_router;
    use crate::web::state::AppState;

    const TOKEN: &str = "test-token";

    fn app() -> (Router, Arc<MessageQueue>) {
        let queue = Arc::new(MessageQueue::new());
        let router = create_app_router(AppState::new(Arc::clone(&queue), TOKEN));
        (router, queue)
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn send(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/send")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authed(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("X-Token", token);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_send_returns_id() {
        let (app, queue) = app();

        let (status, body) = call(&app, send(r#"{"to": "+15551234567", "body": "hi"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(body["id"], pending[0].id.as_str());
    }

    #[tokio::test]
    async fn test_send_rejects_missing_fields() {
        let (app, queue) = app();
        let expected = json!({"error": "Missing 'to' or 'body'"});

        for payload in [
            r#"{"to": "", "body": "hello"}"#,
            r#"{"to": "  ", "body": "hello"}"#,
            r#"{"to": "+1555"}"#,
            r#"{"to": null, "body": "hello"}"#,
            r#"{}"#,
            "not json",
        ] {
            let (status, body) = call(&app, send(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
            assert_eq!(body, expected, "payload: {}", payload);
        }
        assert_eq!(queue.stats().total, 0);
    }

    #[tokio::test]
    async fn test_send_oversized_body_is_json_413() {
        let (app, queue) = app();
        let huge = "x".repeat(crate::web::router::MAX_BODY_BYTES + 1);
        let payload = json!({"to": "+1555", "body": huge}).to_string();

        let (status, body) = call(&app, send(&payload)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({"error": "Payload too large"}));
        assert_eq!(queue.stats().total, 0);
    }

    #[tokio::test]
    async fn test_confirm_unknown_id_is_404() {
        let (app, queue) = app();
        queue.enqueue("+1555", "hello").unwrap();

        let (status, body) = call(
            &app,
            authed(Method::POST, "/confirm/00000000-0000-0000-0000-000000000000", Some(TOKEN)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found"}));
        assert_eq!(queue.stats().pending, 1);
    }

    #[tokio::test]
    async fn test_poll_requires_token() {
        let (app, _) = app();
        let unauthorized = json!({"error": "Unauthorized"});

        let (status, body) = call(&app, authed(Method::GET, "/poll", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized);

        let (status, body) = call(&app, authed(Method::GET, "/poll", Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized);
    }

    #[tokio::test]
    async fn test_confirm_requires_token() {
        let (app, queue) = app();
        let id = queue.enqueue("+1555", "hello").unwrap().id;

        let (status, _) = call(&app, authed(Method::POST, &format!("/confirm/{}", id), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(queue.stats().pending, 1);
    }

    #[tokio::test]
    async fn test_delivery_scenario() {
        let (app, _) = app();

        let (_, sent) = call(&app, send(r#"{"to": "+15551234567", "body": "hello"}"#)).await;
        let id = sent["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, authed(Method::GET, "/poll", Some(TOKEN))).await;
        assert_eq!(status, StatusCode::OK);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["id"], id.as_str());
        assert_eq!(messages[0]["to"], "+15551234567");
        assert_eq!(messages[0]["body"], "hello");
        assert_eq!(messages[0]["status"], "pending");
        assert!(messages[0].get("sent_at").is_none());

        let confirm = format!("/confirm/{}", id);
        let (status, body) = call(&app, authed(Method::POST, &confirm, Some(TOKEN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, body) = call(&app, authed(Method::POST, &confirm, Some(TOKEN))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found"}));

        let (_, body) = call(&app, authed(Method::GET, "/poll", Some(TOKEN))).await;
        assert_eq!(body, json!({"messages": []}));

        let (status, body) = call(&app, authed(Method::GET, "/log", None)).await;
        assert_eq!(status, StatusCode::OK);
        let log = body["log"].as_array().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["status"], "sent");
        assert!(log[0]["sent_at"].is_string());
    }

    #[tokio::test]
    async fn test_log_newest_first() {
        let (app, queue) = app();
        for body in ["first", "second", "third"] {
            queue.enqueue("+1555", body).unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let (_, body) = call(&app, authed(Method::GET, "/log", None)).await;
        let bodies: Vec<&str> = body["log"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["body"].as_str().unwrap())
            .collect();
        assert_eq!(bodies, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_stats_and_health() {
        let (app, queue) = app();
        let id = queue.enqueue("+1555", "a").unwrap().id;
        queue.enqueue("+1555", "b").unwrap();
        queue.confirm(&id).unwrap();

        let (status, body) = call(&app, authed(Method::GET, "/stats", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"pending": 1, "sent": 1, "total": 2}));

        let response = app
            .clone()
            .oneshot(authed(Method::GET, "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

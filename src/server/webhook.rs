//! Webhook endpoint handler.
//!
//! Each delivery runs through the same fixed sequence and stops at the first
//! failing step:
//!
//! 1. read the event and signature headers
//! 2. parse the signature header
//! 3. verify the signature against the raw body
//! 4. accept only `create` events
//! 5. decode the payload
//! 6. list the local tags
//! 7. compare the newest tag with the incoming ref
//!
//! No state is kept between deliveries. Two overlapping deliveries may both
//! report that an update is needed; serializing the update itself is left to
//! whatever acts on that answer.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::tags::{TagSource, decide};
use crate::webhooks::{CREATE_EVENT, CreateEvent, SignatureHeader, SignatureHeaderError, verify};

/// Header name for GitHub event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that end a webhook request early.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The signature header is not `sha256=<digest>`.
    #[error("misunderstandable signature header {value:?}: {source}")]
    MalformedSignatureHeader {
        value: String,
        #[source]
        source: SignatureHeaderError,
    },

    /// The body was not signed with the shared secret.
    #[error("bad signature")]
    BadSignature,

    /// Any event other than `create`.
    #[error("unwanted event {0:?}")]
    UnwantedEvent(String),

    /// The body is not a `create` payload.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::BadSignature => StatusCode::UNAUTHORIZED,
            WebhookError::MissingHeader(_)
            | WebhookError::MalformedSignatureHeader { .. }
            | WebhookError::UnwantedEvent(_)
            | WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

/// Success body, `{"info": "..."}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoBody {
    pub info: String,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: must be `create` to be acted on
///   - `X-Hub-Signature-256`: `sha256=<hex HMAC of the body>`
/// - Body: JSON `create` payload (`ref`, `sender.login`)
///
/// # Response
///
/// - 200 OK: `{"info": "update to 3.0.0"}` or `{"info": "The last tag is the same: 2.0.0"}`
/// - 400 Bad Request: missing or malformed header, unwanted event, bad payload
/// - 401 Unauthorized: signature mismatch
pub async fn webhook_handler<S>(
    State(app_state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InfoBody>, WebhookError>
where
    S: TagSource + Send + Sync + 'static,
{
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let signature_value = get_header(&headers, HEADER_SIGNATURE)?;

    debug!(event_type = %event_type, body_len = body.len(), "Received webhook");

    let signature = SignatureHeader::parse(&signature_value).map_err(|source| {
        warn!(error = %source, "Malformed signature header");
        WebhookError::MalformedSignatureHeader {
            value: signature_value.clone(),
            source,
        }
    })?;

    // Nothing from the body is trusted until the signature checks out.
    if !verify(app_state.webhook_secret(), &body, signature.digest()) {
        warn!(event_type = %event_type, "Invalid webhook signature");
        return Err(WebhookError::BadSignature);
    }

    if event_type != CREATE_EVENT {
        info!(event_type = %event_type, "Ignoring unwanted event");
        return Err(WebhookError::UnwantedEvent(event_type));
    }

    let event = CreateEvent::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Malformed create payload");
        WebhookError::MalformedPayload(e)
    })?;

    info!(
        sender = %event.sender.login,
        event_type = %event_type,
        git_ref = %event.git_ref,
        ref_type = ?event.ref_type,
        "Ref created"
    );

    let tags = app_state.tags().sorted_tags().await;
    let decision = decide(&tags, &event.git_ref);

    match decision.latest_tag() {
        Some(latest) if decision.needs_update() => {
            info!(from = %latest, to = %event.git_ref, "Local checkout is behind");
        }
        Some(latest) => {
            info!(tag = %latest, "Local checkout already has the newest tag");
        }
        None => {
            info!(git_ref = %event.git_ref, "No local tags to compare with");
        }
    }

    Ok(Json(InfoBody {
        info: decision.info_message(&event.git_ref),
    }))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", "create".parse().unwrap());

        let result = get_header(&headers, HEADER_EVENT).unwrap();
        assert_eq!(result, "create");
    }

    #[test]
    fn get_header_missing() {
        let headers = HeaderMap::new();

        let result = get_header(&headers, HEADER_SIGNATURE);
        assert!(matches!(
            result,
            Err(WebhookError::MissingHeader("x-hub-signature-256"))
        ));
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            WebhookError::MissingHeader(HEADER_EVENT).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MalformedSignatureHeader {
                value: "abc".into(),
                source: SignatureHeaderError::Malformed("abc".into()),
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::BadSignature.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::UnwantedEvent("push".into()).status(),
            StatusCode::BAD_REQUEST
        );

        let json_err = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        assert_eq!(
            WebhookError::MalformedPayload(json_err).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unwanted_event_message_names_the_event() {
        assert_eq!(
            WebhookError::UnwantedEvent("push".into()).to_string(),
            "unwanted event \"push\""
        );
    }
}

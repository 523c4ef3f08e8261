//! Wire protocol for the cookie gateway.
//!
//! All communication is JSON text frames over a WebSocket. A client sends
//! exactly one request and receives exactly one terminal message:
//! - `{"type": "cookie"}` — client → server, the only recognized request
//! - `{"type": "cookies", "cookie": "..."}` — server → client success
//! - `{"type": "error", "error": "..."}` — server → client absorbed failure
//!
//! Every other outcome is signalled through the close frame (see [`close`]).

use {
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

// ── Constants ────────────────────────────────────────────────────────────────

/// Minimum interval between accepted requests on one connection.
pub const RATE_LIMIT_SECS: u64 = 10;
/// Default listen port, overridable via `PORT`.
pub const DEFAULT_PORT: u16 = 8765;
/// How long a fresh connection may sit idle before it is closed.
pub const FIRST_MESSAGE_TIMEOUT_MS: u64 = 30_000;

// ── Close codes and reasons ──────────────────────────────────────────────────

/// WebSocket close codes and the fixed reason strings sent with them.
pub mod close {
    /// Normal completion after the terminal response has been sent.
    pub const NORMAL: u16 = 1000;
    /// Policy violation: rate limit, malformed input, idle connection.
    pub const POLICY_VIOLATION: u16 = 1008;

    pub const REASON_DONE: &str = "Done";
    pub const REASON_RATE_LIMIT: &str = "Rate limit exceeded";
    pub const REASON_INVALID_JSON: &str = "Invalid JSON";
    pub const REASON_MALFORMED: &str = "Malformed request";
    pub const REASON_NO_MESSAGE: &str = "No message received";
}

// ── Client → server ──────────────────────────────────────────────────────────

/// The single recognized request shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    #[serde(rename = "cookie")]
    Cookie,
}

/// Why an inbound payload was rejected. Each variant maps onto exactly one
/// close reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("payload is not valid JSON")]
    InvalidJson,
    #[error("payload is not a recognized request")]
    MalformedRequest,
}

impl RequestError {
    /// The close reason sent to the client for this rejection.
    pub fn close_reason(&self) -> &'static str {
        match self {
            RequestError::InvalidJson => close::REASON_INVALID_JSON,
            RequestError::MalformedRequest => close::REASON_MALFORMED,
        }
    }
}

/// Classify a raw text payload.
///
/// Two-stage decode so the client can tell syntactic garbage apart from a
/// structurally valid message it should not have sent: anything that is not
/// JSON is `InvalidJson`; JSON whose `type` is missing or not `"cookie"` is
/// `MalformedRequest`.
pub fn classify(text: &str) -> Result<ClientRequest, RequestError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_| RequestError::InvalidJson)?;
    serde_json::from_value(value).map_err(|_| RequestError::MalformedRequest)
}

// ── Server → client ──────────────────────────────────────────────────────────

/// Terminal message sent to the client before the normal close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Cookie extraction succeeded.
    #[serde(rename = "cookies")]
    Cookies { cookie: String },
    /// The browser collaborator failed; the message is the human-readable
    /// error for the client to diagnose the remote automation failure.
    #[serde(rename = "error")]
    Error { error: String },
}

// ── Cookie header ────────────────────────────────────────────────────────────

/// One cookie as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

impl CookiePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Join cookies into a `Cookie:` header value, preserving the order the
/// browser returned them in.
pub fn cookie_header(pairs: &[CookiePair]) -> String {
    pairs
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_cookie_request() {
        assert_eq!(classify(r#"{"type":"cookie"}"#), Ok(ClientRequest::Cookie));
    }

    #[test]
    fn classify_ignores_extra_fields() {
        // Unknown fields are tolerated; `type` alone decides.
        assert_eq!(
            classify(r#"{"type":"cookie","nonce":42}"#),
            Ok(ClientRequest::Cookie)
        );
    }

    #[test]
    fn classify_rejects_non_json() {
        assert_eq!(classify("not json"), Err(RequestError::InvalidJson));
        assert_eq!(classify(""), Err(RequestError::InvalidJson));
    }

    #[test]
    fn classify_rejects_unknown_type() {
        assert_eq!(
            classify(r#"{"type":"ping"}"#),
            Err(RequestError::MalformedRequest)
        );
    }

    #[test]
    fn classify_rejects_missing_type() {
        assert_eq!(classify(r#"{}"#), Err(RequestError::MalformedRequest));
        assert_eq!(classify(r#"[1,2,3]"#), Err(RequestError::MalformedRequest));
    }

    #[test]
    fn close_reasons_match_spec_strings() {
        assert_eq!(RequestError::InvalidJson.close_reason(), "Invalid JSON");
        assert_eq!(
            RequestError::MalformedRequest.close_reason(),
            "Malformed request"
        );
    }

    #[test]
    fn cookie_header_joins_in_order() {
        let pairs = vec![CookiePair::new("a", "1"), CookiePair::new("b", "2")];
        assert_eq!(cookie_header(&pairs), "a=1; b=2");
    }

    #[test]
    fn cookie_header_single_and_empty() {
        assert_eq!(
            cookie_header(&[CookiePair::new("session", "xyz")]),
            "session=xyz"
        );
        assert_eq!(cookie_header(&[]), "");
    }

    #[test]
    fn server_message_wire_shapes() {
        let ok = serde_json::to_value(ServerMessage::Cookies {
            cookie: "session=xyz".into(),
        })
        .unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"type": "cookies", "cookie": "session=xyz"})
        );

        let err = serde_json::to_value(ServerMessage::Error {
            error: "navigation failed".into(),
        })
        .unwrap();
        assert_eq!(
            err,
            serde_json::json!({"type": "error", "error": "navigation failed"})
        );
    }
}

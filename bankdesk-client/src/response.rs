//! HTTP status and body handling shared by every endpoint

use bankdesk_core::FetchError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Human-readable reason from an error body.
///
/// Tries FastAPI's `{"detail": ...}` (string or validation list), then
/// `{"message": ...}` / `{"error": ...}`, then the raw text.
pub fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail") {
            match detail {
                Value::String(s) => return s.clone(),
                Value::Array(errors) => {
                    let messages: Vec<&str> = errors
                        .iter()
                        .filter_map(|e| e.get("msg").and_then(Value::as_str))
                        .collect();
                    if !messages.is_empty() {
                        return messages.join("; ");
                    }
                }
                _ => {}
            }
        }
        for key in ["message", "error"] {
            if let Some(s) = value.get(key).and_then(Value::as_str) {
                return s.to_string();
            }
        }
    }

    let text = body.trim();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        text.to_string()
    }
}

/// Parse the list endpoint's `"Page N exceeds total pages M"` rejection.
fn page_overflow(detail: &str) -> Option<(u32, u32)> {
    let rest = detail.trim().strip_prefix("Page ")?;
    let (requested, total_pages) = rest.split_once(" exceeds total pages ")?;
    Some((requested.trim().parse().ok()?, total_pages.trim().parse().ok()?))
}

/// Map a non-success status onto the collaborator failure kinds.
pub fn classify_status(status: StatusCode, body: &str) -> FetchError {
    let detail = error_detail(status, body);
    match status {
        StatusCode::UNAUTHORIZED => FetchError::Unauthenticated,
        StatusCode::FORBIDDEN => FetchError::forbidden(detail),
        StatusCode::BAD_REQUEST => match page_overflow(&detail) {
            Some((requested, total_pages)) => FetchError::PageOutOfRange {
                requested,
                total_pages,
            },
            None => FetchError::network(format!("{}: {}", status, detail)),
        },
        _ => FetchError::network(format!("{}: {}", status, detail)),
    }
}

/// Decode a 2xx body. An empty body reads as `{}`.
pub fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FetchError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| FetchError::malformed(e.to_string()))
}

pub(crate) fn transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::network("request timed out")
    } else if err.is_connect() {
        FetchError::network(format!("could not connect to API: {}", err))
    } else {
        FetchError::network(err.to_string())
    }
}

pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, FetchError> {
    let status = response.status();
    let url = response.url().path().to_string();
    let bytes = response.bytes().await.map_err(transport)?;

    if status.is_success() {
        decode_body(&bytes)
    } else {
        let body = String::from_utf8_lossy(&bytes);
        debug!(%status, endpoint = %url, "request rejected");
        Err(classify_status(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankdesk_core::MutationReceipt;

    #[test]
    fn status_mapping() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, r#"{"detail":"Could not validate credentials"}"#),
            FetchError::Unauthenticated
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, r#"{"detail":"Admin access required"}"#),
            FetchError::forbidden("Admin access required")
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, r#"{"detail":"User not found"}"#),
            FetchError::network("404 Not Found: User not found")
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            FetchError::network("502 Bad Gateway: Bad Gateway")
        );
    }

    #[test]
    fn page_overflow_is_recognised() {
        assert_eq!(
            classify_status(
                StatusCode::BAD_REQUEST,
                r#"{"detail":"Page 3 exceeds total pages 2"}"#
            ),
            FetchError::PageOutOfRange {
                requested: 3,
                total_pages: 2
            }
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"detail":"Email already registered"}"#),
            FetchError::network("400 Bad Request: Email already registered")
        );
        assert_eq!(page_overflow("Page x exceeds total pages 2"), None);
        assert_eq!(page_overflow("Page 9 exceeds total pages 4"), Some((9, 4)));
    }

    #[test]
    fn detail_sources() {
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            error_detail(
                status,
                r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"field required"}]}"#
            ),
            "value is not a valid email address; field required"
        );
        assert_eq!(error_detail(status, r#"{"message":"Email exists"}"#), "Email exists");
        assert_eq!(error_detail(status, r#"{"error":"nope"}"#), "nope");
        assert_eq!(error_detail(status, "  plain failure \n"), "plain failure");
        assert_eq!(error_detail(status, "{}"), "{}");
    }

    #[test]
    fn empty_success_body_is_a_receipt() {
        let receipt: MutationReceipt = decode_body(b"").unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.id(), None);
    }

    #[test]
    fn undecodable_success_body_is_malformed() {
        let err = decode_body::<MutationReceipt>(b"<html>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }
}

//! Error types for the PocketBase client.
//!
//! # Design
//! PocketBase answers every failed request with the same JSON envelope
//! (`code`, `message`, per-field `data`). `check_status` decodes that envelope
//! whenever it can, so callers get the server's own explanation. A 404 gets a
//! dedicated variant because "no such record" is the one failure callers
//! routinely branch on. A 429 never reaches the envelope decoder.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::HttpResponse;

pub(crate) const RATE_LIMIT_STATUS: u16 = 429;

/// Validation detail for a single field in an error envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// The error envelope PocketBase returns with every non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocketBaseError {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub data: HashMap<String, ErrorInfo>,
}

impl PocketBaseError {
    pub fn field_error(&self, field: &str) -> Option<&ErrorInfo> {
        self.data.get(field)
    }
}

impl fmt::Display for PocketBaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        if !self.data.is_empty() {
            let mut fields: Vec<_> = self.data.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            for (field, info) in fields {
                write!(f, "; {field}: {}", info.message)?;
            }
        }
        Ok(())
    }
}

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, I/O).
    #[error("transport failed: {0}")]
    Transport(#[from] ureq::Error),

    /// The server answered 429.
    #[error("request-limit-reached")]
    RateLimited,

    /// The server answered 404.
    #[error("resource not found: {0}")]
    NotFound(PocketBaseError),

    /// Unexpected status with a decodable PocketBase error envelope.
    #[error("PocketBase returned HTTP {status}: {error}")]
    Api { status: u16, error: PocketBaseError },

    /// Unexpected status with a body that is not an error envelope.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] serde_json::Error),

    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// The HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimited => Some(RATE_LIMIT_STATUS),
            ApiError::NotFound(_) => Some(404),
            ApiError::Api { status, .. } | ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The decoded error envelope, if there is one.
    pub fn envelope(&self) -> Option<&PocketBaseError> {
        match self {
            ApiError::NotFound(error) | ApiError::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Map a status other than `expected` to the matching `ApiError` variant.
pub(crate) fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == RATE_LIMIT_STATUS {
        return Err(ApiError::RateLimited);
    }

    let envelope = serde_json::from_str::<PocketBaseError>(&response.body).ok();
    Err(match (response.status, envelope) {
        (404, Some(error)) => ApiError::NotFound(error),
        (404, None) => ApiError::NotFound(PocketBaseError {
            code: 404,
            message: response.body.clone(),
            data: HashMap::new(),
        }),
        (status, Some(error)) => ApiError::Api { status, error },
        (status, None) => ApiError::HttpError {
            status,
            body: response.body.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_status_passes() {
        assert!(check_status(&HttpResponse::new(204, ""), 204).is_ok());
    }

    #[test]
    fn rate_limit_ignores_body() {
        let err = check_status(&HttpResponse::new(429, r#"{"code":429,"message":"x","data":{}}"#), 200)
            .unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
        assert_eq!(err.to_string(), "request-limit-reached");
    }

    #[test]
    fn envelope_is_decoded_with_field_errors() {
        let body = r#"{"code":400,"message":"Failed to authenticate.","data":{"identity":{"code":"validation_required","message":"Cannot be blank."}}}"#;
        let err = check_status(&HttpResponse::new(400, body), 200).unwrap_err();
        let envelope = err.envelope().unwrap();
        assert_eq!(envelope.message, "Failed to authenticate.");
        assert_eq!(
            envelope.field_error("identity").map(|e| e.code.as_str()),
            Some("validation_required")
        );
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn not_found_without_envelope_keeps_body() {
        let err = check_status(&HttpResponse::new(404, "gone"), 200).unwrap_err();
        match err {
            ApiError::NotFound(envelope) => {
                assert_eq!(envelope.code, 404);
                assert_eq!(envelope.message, "gone");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undecodable_body_becomes_http_error() {
        let err = check_status(&HttpResponse::new(502, "bad gateway"), 200).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 502, .. }));
        assert!(err.envelope().is_none());
    }

    #[test]
    fn decode_failures_keep_the_serde_error() {
        use std::error::Error as _;

        let source = serde_json::from_str::<PocketBaseError>("not json").unwrap_err();
        let err = ApiError::DeserializationError(source);
        assert!(err.to_string().starts_with("deserialization failed: "));
        assert!(err.source().is_some_and(|s| s.is::<serde_json::Error>()));
    }

    #[test]
    fn envelope_display_lists_fields_in_order() {
        let mut data = HashMap::new();
        data.insert(
            "password".to_string(),
            ErrorInfo { code: "validation_required".into(), message: "Cannot be blank.".into() },
        );
        data.insert(
            "email".to_string(),
            ErrorInfo { code: "validation_is_email".into(), message: "Must be a valid email address.".into() },
        );
        let envelope = PocketBaseError { code: 400, message: "Something went wrong.".into(), data };
        assert_eq!(
            envelope.to_string(),
            "Something went wrong. (code 400); email: Must be a valid email address.; password: Cannot be blank."
        );
    }
}

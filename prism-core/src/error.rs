//! Error types for Prism client operations.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::transport::TransportError;

/// Field name to list of messages, as returned by the backend on 400.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Error returned by every dispatched request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The credential pair is invalid or absent and could not be renewed.
    /// Sign-out has already been triggered.
    #[error("session expired, please sign in again")]
    AuthExpired,

    /// The backend rejected the request (4xx other than 401/404).
    #[error("request rejected ({status}): {}", .detail.as_deref().unwrap_or("validation failed"))]
    ValidationFailed {
        status: u16,
        detail: Option<String>,
        field_errors: FieldErrors,
    },

    /// The requested resource does not exist.
    #[error("not found: {}", .detail.as_deref().unwrap_or("resource does not exist"))]
    NotFound { detail: Option<String> },

    /// The backend failed (5xx).
    #[error("server error ({status}): {}", .detail.as_deref().unwrap_or("internal error"))]
    ServerError { status: u16, detail: Option<String> },

    /// No response was received.
    #[error("network unavailable: {message}")]
    NetworkUnavailable { message: String },

    /// The caller cancelled the request before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// A request body could not be serialized.
    #[error("failed to encode request body: {message}")]
    Encode { message: String },

    /// A response body did not have the expected shape.
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    /// Persisting or clearing the credential pair failed.
    #[error("credential storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Build the error for a non-success, non-401 response.
    ///
    /// `body` is the raw response body; DRF-style `{"detail": ...}`,
    /// `{"error": ...}` and `{"field": ["msg", ...]}` shapes are recognised.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let detail = parsed.as_ref().and_then(extract_detail);

        match status {
            404 => Self::NotFound { detail },
            500..=599 => Self::ServerError { status, detail },
            _ => Self::ValidationFailed {
                status,
                detail,
                field_errors: parsed.as_ref().map(extract_field_errors).unwrap_or_default(),
            },
        }
    }

    /// Message suitable for showing to a user.
    ///
    /// Prefers the backend-supplied detail, then the first field error,
    /// then a generic message for the error kind.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthExpired => "Your session has expired. Please sign in again.".to_string(),
            Self::ValidationFailed {
                detail,
                field_errors,
                ..
            } => detail
                .clone()
                .or_else(|| {
                    field_errors.iter().find_map(|(field, messages)| {
                        messages.first().map(|m| format!("{}: {}", field, m))
                    })
                })
                .unwrap_or_else(|| "The request could not be completed.".to_string()),
            Self::NotFound { detail } => detail
                .clone()
                .unwrap_or_else(|| "The requested item was not found.".to_string()),
            Self::ServerError { detail, .. } => detail.clone().unwrap_or_else(|| {
                "The server encountered an error. Please try again later.".to_string()
            }),
            Self::NetworkUnavailable { .. } => {
                "Unable to reach the server. Check your connection.".to_string()
            }
            Self::Cancelled => "The request was cancelled.".to_string(),
            Self::Encode { .. } | Self::Decode { .. } | Self::Store(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }

    /// Whether this error ended the session.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}

fn extract_detail(value: &serde_json::Value) -> Option<String> {
    let object = value.as_object()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| object.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .or_else(|| {
            object
                .get("non_field_errors")
                .and_then(|v| v.as_array())
                .and_then(|a| a.first())
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
}

fn extract_field_errors(value: &serde_json::Value) -> FieldErrors {
    let Some(object) = value.as_object() else {
        return FieldErrors::new();
    };

    object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "detail" | "error" | "message"))
        .filter_map(|(key, value)| {
            let messages: Vec<String> = match value {
                serde_json::Value::String(s) => vec![s.clone()],
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => return None,
            };
            (!messages.is_empty()).then(|| (key.clone(), messages))
        })
        .collect()
}

/// Top-level error type encompassing all Prism errors.
#[derive(Debug, Error)]
pub enum PrismError {
    /// Error from a backend request.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Error from secret storage operations.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP transport could not be set up.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_response(404, "{}"),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            ApiError::from_response(503, ""),
            ApiError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            ApiError::from_response(400, "{}"),
            ApiError::ValidationFailed { status: 400, .. }
        ));
        assert!(matches!(
            ApiError::from_response(403, "{}"),
            ApiError::ValidationFailed { status: 403, .. }
        ));
    }

    #[test]
    fn test_field_errors_are_collected() {
        let err = ApiError::from_response(
            400,
            r#"{"name": ["You already have an account with this name."], "balance": "too large"}"#,
        );

        let ApiError::ValidationFailed { field_errors, detail, .. } = &err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert!(detail.is_none());
        assert_eq!(field_errors["balance"], vec!["too large"]);
        assert_eq!(
            err.user_message(),
            "balance: too large",
            "first field in key order wins"
        );
    }

    #[test]
    fn test_user_message_prefers_detail() {
        let err = ApiError::from_response(
            400,
            r#"{"detail": "Cannot delete account with existing transactions", "name": ["x"]}"#,
        );
        assert_eq!(
            err.user_message(),
            "Cannot delete account with existing transactions"
        );
    }

    #[test]
    fn test_user_message_uses_error_key() {
        let body = r#"{"error": "Invalid start_date format. Use YYYY-MM-DD"}"#;
        let err = ApiError::from_response(400, body);
        assert_eq!(err.user_message(), "Invalid start_date format. Use YYYY-MM-DD");
    }

    #[test]
    fn test_user_message_generic_fallback() {
        let err = ApiError::from_response(502, "<html>bad gateway</html>");
        assert_eq!(
            err.user_message(),
            "The server encountered an error. Please try again later."
        );

        let err = ApiError::from_response(404, "");
        assert_eq!(err.user_message(), "The requested item was not found.");
    }

    #[test]
    fn test_non_field_errors_become_detail() {
        let body = r#"{"non_field_errors": ["End date must be after start date."]}"#;
        let err = ApiError::from_response(400, body);
        assert_eq!(err.user_message(), "End date must be after start date.");
    }
}

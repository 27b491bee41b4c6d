//! Client error types.
//!
//! Every failure is classified once, at the transport boundary, into one
//! [`Error`] variant. Each variant projects onto the normalized [`ApiError`]
//! shape that callers and user-facing layers consume.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages;

/// Code reserved for failures where no response reached the client.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Code used when the server did not supply one.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Normalized error shape surfaced to every caller of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// HTTP status code, or `0` when no response was received.
    pub status_code: u16,
    /// Human readable message.
    pub message: String,
    /// Machine readable error code.
    pub code: String,
    /// Individual error details (validation messages and the like).
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ApiError {
    /// Create an error with no detail list.
    pub fn new(status_code: u16, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            code: code.into(),
            errors: Vec::new(),
        }
    }

    /// The no-response shape.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, message, NETWORK_ERROR_CODE)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status_code, self.code, self.message)
    }
}

/// Client error type.
///
/// Errors are `Clone` so a single refresh failure can reject every request
/// queued behind it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// No response reached the client (connection failure, timeout).
    #[error("Network error: {}", .0.message)]
    Network(ApiError),

    /// 401 that the client did not (or could not) recover from.
    #[error("Unauthorized: {}", .0.message)]
    Unauthorized(ApiError),

    /// The session could not be refreshed; stored credentials were cleared.
    #[error("Session expired: {}", .0.message)]
    SessionExpired(ApiError),

    /// 403 from the server.
    #[error("Forbidden: {}", .0.message)]
    Forbidden(ApiError),

    /// Any other non-success response.
    #[error("API error ({}): {}", .0.status_code, .0.message)]
    Api(ApiError),

    /// A success response whose body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A request rejected locally before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The token store could not be read or written.
    #[error("Token store error: {0}")]
    Store(String),
}

impl Error {
    /// Build an error from a failed HTTP status and normalized body.
    pub fn from_status(error: ApiError) -> Self {
        match error.status_code {
            401 => Error::Unauthorized(error),
            403 => Error::Forbidden(error),
            _ => Error::Api(error),
        }
    }

    /// Session-ending error with one of the auth messages.
    pub(crate) fn session_expired(message: &str, code: &str) -> Self {
        Error::SessionExpired(ApiError::new(401, message, code))
    }

    /// Project onto the normalized error shape.
    pub fn api_error(&self) -> ApiError {
        match self {
            Error::Network(e)
            | Error::Unauthorized(e)
            | Error::SessionExpired(e)
            | Error::Forbidden(e)
            | Error::Api(e) => e.clone(),
            Error::InvalidRequest(message) => ApiError::new(
                400,
                message.clone(),
                "INVALID_REQUEST",
            ),
            Error::Decode(_) | Error::InvalidUrl(_) | Error::Config(_) | Error::Store(_) => {
                ApiError::new(500, messages::INTERNAL_ERROR, UNKNOWN_ERROR_CODE)
            }
        }
    }

    /// HTTP status of the underlying failure (`0` for network errors).
    pub fn status_code(&self) -> u16 {
        self.api_error().status_code
    }

    /// Check if this is a network error.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(e) if e.status_code == 404)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Unauthorized(_) | Error::SessionExpired(_))
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api(e) if e.status_code >= 500)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body as the server sends it.
///
/// Validation failures carry `message` as a list; every other failure uses a
/// single string.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<MessageField>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MessageField {
    One(String),
    Many(Vec<String>),
}

impl ErrorBody {
    /// Parse a response body, tolerating empty or non-JSON payloads.
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    /// The message the server supplied, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.message {
            Some(MessageField::One(m)) if !m.is_empty() => Some(m),
            Some(MessageField::Many(list)) => list.first().map(String::as_str),
            _ => None,
        }
    }

    /// Normalize into the shared error shape.
    pub fn into_api_error(self, status: u16) -> ApiError {
        let message = self
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| messages::for_status(status).to_string());

        let mut errors = self.errors.unwrap_or_default();
        if errors.is_empty()
            && let Some(MessageField::Many(list)) = self.message
        {
            errors = list;
        }

        ApiError {
            status_code: status,
            message,
            code: self.code.unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string()),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_with_string_message() {
        let body = ErrorBody::parse(br#"{"message":"Todo with ID 3 not found","code":"NOT_FOUND"}"#);
        let err = body.into_api_error(404);
        assert_eq!(err.status_code, 404);
        assert_eq!(err.message, "Todo with ID 3 not found");
        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.errors.is_empty());
    }

    #[test]
    fn test_error_body_with_validation_list() {
        let body = ErrorBody::parse(
            br#"{"message":["title should not be empty","content must be a string"],"error":"Bad Request","statusCode":400}"#,
        );
        assert_eq!(body.message(), Some("title should not be empty"));

        let err = body.into_api_error(400);
        assert_eq!(err.message, "title should not be empty");
        assert_eq!(err.code, UNKNOWN_ERROR_CODE);
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn test_error_body_falls_back_to_status_message() {
        let err = ErrorBody::parse(b"<html>bad gateway</html>").into_api_error(502);
        assert_eq!(err.message, messages::for_status(502));
        assert_eq!(err.code, UNKNOWN_ERROR_CODE);
    }

    #[test]
    fn test_from_status_variants() {
        assert!(matches!(
            Error::from_status(ApiError::new(401, "x", "y")),
            Error::Unauthorized(_)
        ));
        assert!(matches!(
            Error::from_status(ApiError::new(403, "x", "y")),
            Error::Forbidden(_)
        ));
        let not_found = Error::from_status(ApiError::new(404, "x", "y"));
        assert!(not_found.is_not_found());
        assert!(Error::from_status(ApiError::new(503, "x", "y")).is_server_error());
    }

    #[test]
    fn test_network_error_shape() {
        let err = Error::Network(ApiError::network(messages::CONNECTION_ERROR));
        let shape = err.api_error();
        assert_eq!(shape.status_code, 0);
        assert_eq!(shape.code, NETWORK_ERROR_CODE);
        assert!(err.is_network());
    }

    #[test]
    fn test_api_error_serializes_camel_case() {
        let json = serde_json::to_value(ApiError::new(409, "dup", "CONFLICT")).unwrap();
        assert_eq!(json["statusCode"], 409);
        assert_eq!(json["errors"], serde_json::json!([]));
    }
}

//! The request and response stages of the client pipeline.
//!
//! Both stages are plain functions over a [`RequestDescriptor`]; the client
//! composes them around the transport and owns all side effects.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::error::{ApiError, Error, ErrorBody};
use crate::hooks::Severity;
use crate::messages;
use crate::request::RequestDescriptor;

/// Which credential the request stage attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Basic,
    Bearer,
    /// The caller (or a replay) already set the auth header.
    Existing,
    Anonymous,
}

/// Whether the request stage will want a stored access token.
///
/// Lets the client skip the token-store read for requests that would ignore it.
pub fn wants_token(request: &RequestDescriptor) -> bool {
    request.basic_auth.is_none() && !request.skip_auth && !request.has_authorization()
}

/// Request stage: attach credentials.
///
/// Basic auth wins over everything. `skip_auth` requests go out bare. An
/// existing auth header is left alone. Otherwise `token` becomes a bearer
/// header if present. Never fails.
pub fn apply_credentials(request: &mut RequestDescriptor, token: Option<&str>) -> Credential {
    if let Some(basic) = &request.basic_auth {
        let encoded = STANDARD.encode(format!("{}:{}", basic.username, basic.password));
        match HeaderValue::from_str(&format!("Basic {}", encoded)) {
            Ok(value) => {
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!(path = %request.path, "Unencodable basic credentials"),
        }
        return Credential::Basic;
    }

    if request.skip_auth {
        return Credential::Anonymous;
    }

    if request.has_authorization() {
        return Credential::Existing;
    }

    match token {
        Some(token) if !token.is_empty() => {
            request.set_bearer(token);
            Credential::Bearer
        }
        _ => Credential::Anonymous,
    }
}

/// A message the client should hand to its notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// What the client should do with a failed response.
#[derive(Debug)]
pub enum Verdict {
    /// Recoverable 401: go through the refresh coordinator and replay.
    Refresh,
    /// The refresh endpoint itself was rejected: end the session and fail.
    EndSession(Error),
    /// Terminal failure for this caller.
    Reject { error: Error, notices: Vec<Notice> },
}

/// Response stage: classify a non-success response.
pub(crate) fn classify(
    request: &RequestDescriptor,
    status: StatusCode,
    body: ErrorBody,
    refresh_path: &str,
) -> Verdict {
    let status = status.as_u16();

    if status == 401 && !request.skip_auth && !request.retried {
        if same_path(&request.path, refresh_path) {
            return Verdict::EndSession(Error::Unauthorized(body.into_api_error(status)));
        }
        return Verdict::Refresh;
    }

    let mut notices = Vec::new();
    if status == 403 {
        notices.push(Notice::error(messages::FORBIDDEN));
    }
    if let Some(message) = body.message()
        && message != messages::FORBIDDEN
    {
        notices.push(Notice::error(message));
    }

    Verdict::Reject {
        error: Error::from_status(body.into_api_error(status)),
        notices,
    }
}

/// Classify a transport failure (no response received).
pub fn transport_error(e: &reqwest::Error) -> Error {
    if e.is_builder() {
        return Error::InvalidRequest(e.to_string());
    }

    let message = if e.is_timeout() {
        messages::NETWORK_TIMEOUT
    } else {
        messages::CONNECTION_ERROR
    };
    let mut error = ApiError::network(message);
    error.errors.push(e.to_string());
    Error::Network(error)
}

/// Compare API paths ignoring leading/trailing slashes and query strings.
pub fn same_path(a: &str, b: &str) -> bool {
    fn normalize(p: &str) -> &str {
        let p = p.split('?').next().unwrap_or(p);
        p.trim_matches('/')
    }
    normalize(a) == normalize(b)
}

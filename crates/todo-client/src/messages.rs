//! User-facing messages.

pub const BAD_REQUEST: &str = "The request was invalid. Please check your input.";
pub const UNAUTHORIZED: &str = "Authentication is required. Please log in again.";
pub const FORBIDDEN: &str = "You do not have permission to access this resource.";
pub const NOT_FOUND: &str = "The requested resource could not be found.";
pub const METHOD_NOT_ALLOWED: &str = "This request method is not allowed.";
pub const REQUEST_TIMEOUT: &str = "The request timed out. Please try again.";
pub const CONFLICT: &str = "The data already exists.";
pub const PAYLOAD_TOO_LARGE: &str = "The payload is too large.";
pub const VALIDATION_FAILED: &str = "Input validation failed.";
pub const TOO_MANY_REQUESTS: &str = "Too many requests. Please try again later.";

pub const INTERNAL_ERROR: &str = "A server error occurred. Please try again later.";
pub const BAD_GATEWAY: &str = "There was a problem connecting to the server.";
pub const SERVICE_UNAVAILABLE: &str = "The service is temporarily unavailable.";
pub const GATEWAY_TIMEOUT: &str = "The server took too long to respond.";

pub const CONNECTION_ERROR: &str = "Please check your network connection.";
pub const NETWORK_TIMEOUT: &str = "The request timed out.";

pub const NO_VALID_SESSION: &str = "There is no valid session.";
pub const NO_REFRESH_TOKEN: &str = "There is no refresh token.";
pub const TOKEN_REFRESH_FAILED: &str = "Failed to renew the session. Please log in again.";

/// Default message for a failed status when the body carries none.
pub fn for_status(status: u16) -> &'static str {
    match status {
        400 => BAD_REQUEST,
        401 => UNAUTHORIZED,
        403 => FORBIDDEN,
        404 => NOT_FOUND,
        405 => METHOD_NOT_ALLOWED,
        408 => REQUEST_TIMEOUT,
        409 => CONFLICT,
        413 => PAYLOAD_TOO_LARGE,
        422 => VALIDATION_FAILED,
        429 => TOO_MANY_REQUESTS,
        502 => BAD_GATEWAY,
        503 => SERVICE_UNAVAILABLE,
        504 => GATEWAY_TIMEOUT,
        _ => INTERNAL_ERROR,
    }
}

use http::StatusCode;
use thiserror::Error;

/// HTTP result type, T is typically a hyper::Response
/// HttpError is used to generate a synthetic error response
pub(crate) type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong while handling a tracking request
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    #[error("No matching route")]
    NoMatchingRoute,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to read request body: {0}")]
    InvalidBody(String),

    #[error("Request body exceeds the size limit")]
    PayloadTooLarge,

    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("Analytics API request failed: {0}")]
    Upstream(String),

    #[error("Script is not available")]
    ScriptUnavailable,

    #[error("Request handling timed out")]
    Timeout,
}

impl HttpError {
    pub fn error_type(&self) -> &'static str {
        match self {
            HttpError::NoMatchingRoute => "no_matching_route",
            HttpError::MethodNotAllowed => "method_not_allowed",
            HttpError::InvalidBody(_) => "invalid_body",
            HttpError::PayloadTooLarge => "payload_too_large",
            HttpError::InvalidPayload(_) => "invalid_payload",
            HttpError::Upstream(_) => "upstream",
            HttpError::ScriptUnavailable => "script_unavailable",
            HttpError::Timeout => "timeout",
        }
    }
}

impl From<HttpError> for StatusCode {
    fn from(e: HttpError) -> StatusCode {
        match e {
            HttpError::NoMatchingRoute => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            HttpError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            HttpError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::ScriptUnavailable => StatusCode::NOT_FOUND,
            HttpError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

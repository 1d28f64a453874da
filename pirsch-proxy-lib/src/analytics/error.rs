use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url}: received status code {status} on request: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("error refreshing token (attempt {attempt}/{max}): {message}")]
    Token { attempt: u32, max: u32, message: String },

    #[error("domain not found")]
    DomainNotFound,
}

impl AnalyticsError {
    /// Short label for metrics
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Status { .. } => "status",
            Self::Token { .. } => "token",
            Self::DomainNotFound => "domain_not_found",
        }
    }
}

use thiserror::Error;

/// Every failure the fetch and extraction layers can report.
#[derive(Error, Debug)]
pub enum AppError {
    /// The transport rejected or failed the request.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Connection setup, DNS or a reset mid-transfer.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// No response within the configured timeout, in seconds.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A CAPTCHA resolution stage failed.
    #[error("CAPTCHA error: {0}")]
    CaptchaError(String),

    /// The proxy list could not be refreshed.
    #[error("Proxy error: {0}")]
    ProxyError(String),

    /// A document could not be parsed or queried during extraction.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A solver reply or metadata block was not the JSON we expected.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is worth retrying.
    ///
    /// Misuse errors (bad URLs, bad configuration) fail the same way on every
    /// attempt and are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AppError::InvalidUrl(_) | AppError::ConfigError(_))
    }

    /// Returns true for connection and timeout failures.
    pub fn is_transient_network(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}

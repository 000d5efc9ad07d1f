//! Error types for the registry client.

/// All errors that can occur when talking to the registry.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid client configuration.
    #[error("registry config error: {0}")]
    Config(String),

    /// The registry rejected the request with an HTTP error.
    #[error("registry error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Classification tag from the error body, when the registry sent one.
        kind: Option<String>,
        /// Error message from the registry.
        message: String,
    },

    /// Authentication failed (401/403).
    #[error("registry auth error: {0}")]
    Auth(String),

    /// Request timed out.
    #[error("registry request timed out")]
    Timeout,

    /// Network or HTTP client error.
    #[error("registry network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("registry json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Stable snake_case classification tag for this error.
    ///
    /// For [`ApiError::Api`] the registry's own tag is used when present,
    /// falling back to `"api"`.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Config(_) => "config",
            Self::Api { kind, .. } => kind.as_deref().unwrap_or("api"),
            Self::Auth(_) => "unauthorized",
            Self::Timeout => "timeout",
            Self::Network(_) => "network",
            Self::Json(_) => "json",
        }
    }
}

use thiserror::Error;
use serde::Serialize;

/// Common error type for Replygen with clear taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// Client request errors (4xx)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Boot-time errors (fatal, abort startup)
    #[error("Failed to launch inference server: {0}")]
    Launch(String),

    #[error("Inference server not reachable after {0} attempts")]
    StartupTimeout(u32),

    #[error("Failed to provision model '{model}': {detail}")]
    Provision { model: String, detail: String },

    /// Per-request errors (isolated to the request)
    #[error("Inference server unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed upstream stream: {0}")]
    StreamDecode(String),

    #[error("Template error: {0}")]
    Template(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// IO and serialization errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic anyhow error for flexibility
    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            // 4xx Client Errors
            Error::BadRequest(_) => 400,

            // Upstream failures during a request
            Error::UpstreamUnavailable(_) => 503,
            Error::StreamDecode(_) => 502,

            // Boot errors only surface over HTTP if something is badly wired
            Error::Launch(_) | Error::StartupTimeout(_) | Error::Provision { .. } => 503,

            // Internal Errors
            Error::Template(_) => 500,
            Error::Internal(_) => 500,
            Error::Config(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::Anyhow(_) => 500,
        }
    }

    /// Get error type for metrics/logging
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "bad_request",
            Error::Launch(_) => "launch_failed",
            Error::StartupTimeout(_) => "startup_timeout",
            Error::Provision { .. } => "provision_failed",
            Error::UpstreamUnavailable(_) => "upstream_unavailable",
            Error::StreamDecode(_) => "stream_decode",
            Error::Template(_) => "template",
            Error::Internal(_) => "internal",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Anyhow(_) => "unknown",
        }
    }

    /// Check if the error aborts startup rather than a single request
    pub fn is_fatal_at_boot(&self) -> bool {
        matches!(
            self,
            Error::Launch(_) | Error::StartupTimeout(_) | Error::Provision { .. }
        )
    }
}

/// Error response for HTTP API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: u16,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        ErrorResponse {
            error: ErrorDetail {
                message: err.to_string(),
                r#type: err.error_type().to_string(),
                code: err.status_code(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

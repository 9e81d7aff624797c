use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

// Constants for validation
const MAX_EMAIL_CHARS: usize = 100_000;
const DEFAULT_CHAR_LIMIT: u32 = 500;

fn default_char_limit() -> u32 {
    DEFAULT_CHAR_LIMIT
}

/// Request to generate an email reply.
///
/// Every field is optional on the wire; absent fields fall back to an empty
/// string, and `char_limit` to 500.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub action_instruction: String,
    #[serde(default = "default_char_limit")]
    pub char_limit: u32,
    #[serde(default)]
    pub email: String,
}

impl GenerateRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<()> {
        if self.char_limit == 0 {
            return Err(Error::BadRequest("char_limit must be greater than 0".into()));
        }
        if self.email.len() > MAX_EMAIL_CHARS {
            return Err(Error::BadRequest(
                format!("email too long (max {} chars)", MAX_EMAIL_CHARS),
            ));
        }
        Ok(())
    }
}

/// The single aggregated reply for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Health status values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Starting,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: HealthStatus::Ok }
    }
}

//! Client error types

use thiserror::Error;

/// Client error type
///
/// Every variant carries only owned data so errors can be kept in the cache
/// (display-while-error) and cloned back out to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The server could not be reached (connect/timeout)
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected as malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload exceeds the server's size ceiling
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Upload is not an accepted image type
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Server-side failure (5xx)
    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Whether a user-triggered retry is worthwhile.
    ///
    /// Transient transport and server failures are; domain rejections are not.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkUnreachable(_) | ClientError::Server(_, _)
        )
    }

    /// Human-readable copy for the UI layer
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NetworkUnreachable(_) => {
                "Network error. Check your connection and try again.".to_string()
            }
            ClientError::NotFound(_) => "The requested product was not found.".to_string(),
            ClientError::Validation(msg) => {
                format!("Please check the entered data: {msg}")
            }
            ClientError::Conflict(msg) => msg.clone(),
            ClientError::PayloadTooLarge => {
                "The file exceeds the maximum allowed size (10MB).".to_string()
            }
            ClientError::UnsupportedMediaType(_) => {
                "Please choose an image file (JPG, PNG or GIF).".to_string()
            }
            ClientError::Server(_, _) => {
                "Temporary server problem. Try again later.".to_string()
            }
            ClientError::InvalidResponse(_) => {
                "Unexpected server response. Try again later.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            // connect/timeout/request construction failures are all
            // "the server never answered"
            ClientError::NetworkUnreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

//! Error handling for the lead intake and routing core
//!
//! This module provides idiomatic Rust error types using thiserror for
//! better error messages and proper error chain handling.

use thiserror::Error;

/// Main error type for the intake system
#[derive(Error, Debug)]
pub enum CrmError {
    #[error("Payload error: {message}")]
    Payload { message: String },

    #[error("Not authorized: {operation}")]
    Unauthorized { operation: String },

    #[error("Upstream service error {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrmError {
    pub fn payload(message: impl Into<String>) -> Self {
        CrmError::Payload {
            message: message.into(),
        }
    }

    pub fn upstream(status: u16, detail: impl Into<String>) -> Self {
        CrmError::Upstream {
            status,
            detail: detail.into(),
        }
    }
}

/// Result type alias for convenience
pub type CrmResult<T> = Result<T, CrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let err = CrmError::payload("missing submissionData");
        assert!(matches!(err, CrmError::Payload { .. }));
        assert_eq!(
            err.to_string(),
            "Payload error: missing submissionData"
        );
    }

    #[test]
    fn test_upstream_display() {
        let err = CrmError::upstream(503, "CMS did not respond");
        assert_eq!(
            err.to_string(),
            "Upstream service error 503: CMS did not respond"
        );
    }
}

//! Error types for Callwave
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Callwave
#[derive(Debug, Error)]
pub enum CallwaveError {
    /// Campaign not found in storage
    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    /// Assistant referenced by a campaign does not exist
    #[error("Assistant not found: {0}")]
    AssistantNotFound(String),

    /// Any other record missing from storage
    #[error("Record not found: {collection}/{id}")]
    RecordNotFound { collection: String, id: String },

    /// Campaign or assistant is misconfigured (fatal to a run)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Voice provider error surfaced outside the dispatcher
    #[error("Provider error: {0}")]
    Provider(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CallwaveError {
    /// Shorthand for a missing record in a named collection
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::RecordNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result type alias for Callwave operations
pub type Result<T> = std::result::Result<T, CallwaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_not_found_error() {
        let err = CallwaveError::CampaignNotFound("cmp-1".to_string());
        assert_eq!(err.to_string(), "Campaign not found: cmp-1");
    }

    #[test]
    fn test_configuration_error() {
        let err = CallwaveError::Configuration("assistant has no provider id".to_string());
        assert_eq!(err.to_string(), "Configuration error: assistant has no provider id");
    }

    #[test]
    fn test_record_not_found_error() {
        let err = CallwaveError::not_found("calls", "call-9");
        assert_eq!(err.to_string(), "Record not found: calls/call-9");
    }

    #[test]
    fn test_invalid_state_error() {
        let err = CallwaveError::InvalidState("campaign is cancelled".to_string());
        assert_eq!(err.to_string(), "Invalid state: campaign is cancelled");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CallwaveError = io_err.into();
        assert!(matches!(err, CallwaveError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: CallwaveError = json_err.into();
        assert!(matches!(err, CallwaveError::Json(_)));
    }
}

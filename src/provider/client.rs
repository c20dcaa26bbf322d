//! Voice provider trait and request/response types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outbound-call capability of a voice AI provider
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Ask the provider to dial a customer with the given assistant.
    ///
    /// On success the returned `external_call_id` is what lifecycle events
    /// will carry for this call.
    async fn create_outbound_call(&self, request: OutboundCallRequest) -> Result<OutboundCall, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Customer being dialled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Everything needed to place one outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCallRequest {
    /// Provider-side assistant id
    pub assistant_external_id: String,
    pub customer: Customer,
    /// Correlation hints echoed back in webhook metadata
    pub metadata: serde_json::Value,
}

impl OutboundCallRequest {
    /// Reject requests the provider would refuse anyway
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.assistant_external_id.trim().is_empty() {
            return Err(ProviderError::Validation("assistant id is empty".to_string()));
        }
        let number = self.customer.number.trim();
        if number.is_empty() {
            return Err(ProviderError::Validation("customer number is empty".to_string()));
        }
        let digits = number.strip_prefix('+').unwrap_or(number);
        if !digits.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
            return Err(ProviderError::Validation(format!("invalid customer number: {}", number)));
        }
        Ok(())
    }
}

/// Provider acknowledgement of a created call
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCall {
    pub external_call_id: String,
    pub status: String,
}

/// Errors that can occur while talking to the provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("Invalid request: {0}")]
    Validation(String),
}

impl ProviderError {
    /// Short tag stored on the campaign contact
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::Network(_) => "network_error",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::MissingApiKey { .. } => "missing_api_key",
            ProviderError::Validation(_) => "validation_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(number: &str) -> OutboundCallRequest {
        OutboundCallRequest {
            assistant_external_id: "asst_1".to_string(),
            customer: Customer {
                number: number.to_string(),
                name: None,
            },
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_validate_accepts_e164() {
        assert!(request("+33612345678").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_number() {
        assert!(matches!(request("  ").validate(), Err(ProviderError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_letters() {
        assert!(matches!(request("+33 CALL ME").validate(), Err(ProviderError::Validation(_))));
    }

    #[test]
    fn test_customer_serialization_skips_missing_name() {
        let customer = Customer {
            number: "+15550001".to_string(),
            name: None,
        };
        assert_eq!(serde_json::to_string(&customer).unwrap(), r#"{"number":"+15550001"}"#);
    }

    #[test]
    fn test_error_kind() {
        let err = ProviderError::ApiError {
            status: 400,
            message: "bad".into(),
        };
        assert_eq!(err.kind(), "api_error");
        assert_eq!(err.to_string(), "API error 400: bad");
    }
}

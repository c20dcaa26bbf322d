//! Vapi API client implementation
//!
//! This module implements the VoiceProvider trait for the Vapi REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::provider::client::{OutboundCall, OutboundCallRequest, ProviderError, VoiceProvider};

/// Default Vapi API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.vapi.ai";

/// Default environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "VAPI_API_KEY";

/// Configuration for the Vapi client
#[derive(Debug, Clone)]
pub struct VapiConfig {
    pub base_url: String,
    pub api_key_env: String,
    /// Caller-id number registered with the provider
    pub phone_number_id: Option<String>,
    pub timeout: Duration,
}

impl Default for VapiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            phone_number_id: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Vapi API client
pub struct VapiClient {
    client: Client,
    api_key: String,
    config: VapiConfig,
}

impl VapiClient {
    /// Create a new client, reading the API key from `config.api_key_env`
    pub fn new(config: VapiConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| ProviderError::MissingApiKey {
            env_var: config.api_key_env.clone(),
        })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: VapiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn call_url(&self) -> String {
        format!("{}/call", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for `POST /call`
    fn build_request(&self, request: &OutboundCallRequest) -> Value {
        let mut customer = json!({ "number": request.customer.number });
        if let Some(name) = &request.customer.name {
            customer["name"] = json!(name);
        }

        let mut body = json!({
            "assistantId": request.assistant_external_id,
            "customer": customer,
        });

        if let Some(phone_number_id) = &self.config.phone_number_id {
            body["phoneNumberId"] = json!(phone_number_id);
        }

        if !request.metadata.is_null() {
            body["metadata"] = request.metadata.clone();
        }

        body
    }

    /// Parse the API response into an OutboundCall
    fn parse_response(body: &Value) -> Result<OutboundCall, ProviderError> {
        let external_call_id = body["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("response has no call id".to_string()))?;

        Ok(OutboundCall {
            external_call_id: external_call_id.to_string(),
            status: body["status"].as_str().unwrap_or("queued").to_string(),
        })
    }

    async fn send_request(&self, body: Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(self.call_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl VoiceProvider for VapiClient {
    async fn create_outbound_call(&self, request: OutboundCallRequest) -> Result<OutboundCall, ProviderError> {
        request.validate()?;
        let body = self.build_request(&request);
        log::debug!("Creating outbound call to {}", request.customer.number);
        let response = self.send_request(body).await?;
        Self::parse_response(&response)
    }

    fn name(&self) -> &str {
        "vapi"
    }
}

impl std::fmt::Debug for VapiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapiClient")
            .field("base_url", &self.config.base_url)
            .field("phone_number_id", &self.config.phone_number_id)
            .finish()
    }
}

//! AI gateway configuration.
//!
//! Provides a typed interface over the gateway settings, read from the
//! environment or from a JSON blob, while preserving backend-specific custom
//! fields.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::AppError;

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Standard configuration for decision gateways.
///
/// # Example JSON Config
///
/// ```json
/// {
///   "gateway": "chat_completions",
///   "base_url": "http://localhost:1234/v1",
///   "model": "qwen2.5-7b-instruct",
///   "temperature": 0.4,
///   "max_tokens": 200
/// }
/// ```
///
/// Fields other than the standard ones land in `custom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Registered gateway name; `heuristic` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// RNG seed for gateways with local randomness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Gateway-specific configuration.
    #[serde(flatten)]
    pub custom: JsonValue,
}

impl AiConfig {
    /// Create an AiConfig from optional JSON value, falling back to an empty
    /// config when the value does not deserialize.
    pub fn from_json(config: Option<&JsonValue>) -> Self {
        config
            .and_then(|json| serde_json::from_value(json.clone()).ok())
            .unwrap_or_else(Self::empty)
    }

    /// Read `AI_GATEWAY`, `AI_BASE_URL`, `AI_MODEL`, `AI_API_KEY`, `AI_TEMPERATURE`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let temperature = get("AI_TEMPERATURE")
            .map(|v| {
                v.trim()
                    .parse::<f32>()
                    .map_err(|_| AppError::config(format!("AI_TEMPERATURE '{v}' is not a number")))
            })
            .transpose()?;
        Ok(Self {
            gateway: get("AI_GATEWAY"),
            base_url: get("AI_BASE_URL"),
            model: get("AI_MODEL"),
            api_key: get("AI_API_KEY"),
            temperature,
            seed: None,
            custom: JsonValue::Object(serde_json::Map::new()),
        })
    }

    pub fn gateway_name(&self) -> &str {
        self.gateway.as_deref().unwrap_or("heuristic")
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Get the RNG seed, if configured.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn get_custom(&self, key: &str) -> Option<&JsonValue> {
        self.custom.get(key)
    }

    /// Create an empty configuration (heuristic gateway, no seed, no custom fields).
    pub fn empty() -> Self {
        Self {
            gateway: None,
            base_url: None,
            model: None,
            api_key: None,
            temperature: None,
            seed: None,
            custom: JsonValue::Object(serde_json::Map::new()),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::empty()
    }
}

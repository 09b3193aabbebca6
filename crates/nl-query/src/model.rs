//! Language Model Client

use crate::TranslationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Text generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, TranslationError>;
}

/// Model server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Model name (e.g. "llama3.1")
    pub model: String,
    pub temperature: f64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama `/api/generate` client
pub struct OllamaModel {
    client: Client,
    config: ModelConfig,
}

impl OllamaModel {
    pub fn new(config: ModelConfig) -> Result<Self, TranslationError> {
        info!("Creating language model client: {} at {}", config.model, config.base_url);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslationError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn generate(&self, prompt: &str) -> Result<String, TranslationError> {
        let body = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.config.temperature },
        });

        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslationError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Decode(e.to_string()))?;

        debug!("Model produced {} chars", generated.response.len());
        Ok(generated.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url() {
        let model = OllamaModel::new(ModelConfig {
            base_url: "http://ollama:11434/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(model.generate_url(), "http://ollama:11434/api/generate");
    }

    #[test]
    fn test_decode_generate_response() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"model":"llama3.1","response":"MATCH (n) RETURN n","done":true}"#)
                .unwrap();
        assert_eq!(parsed.response, "MATCH (n) RETURN n");
    }
}

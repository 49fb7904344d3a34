//! Proposer client implementations
//!
//! Provides abstraction for OpenAI and Ollama LLM APIs behind the
//! [`Proposer`] trait. The proposer contract is a single synchronous
//! string reply per prompt; no streaming.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use biokg_core::{BiokgError, LlmConfig, LlmProvider, Proposer, Result};

// ============================================================================
// OpenAI Proposer
// ============================================================================

/// OpenAI API proposer
pub struct OpenAiProposer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiProposer {
    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| BiokgError::Config("OpenAI API key required".to_string()))?;

        let base_url = config
            .openai_base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: api_key.clone(),
            base_url,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Proposer for OpenAiProposer {
    async fn propose(&self, prompt: &str) -> Result<String> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BiokgError::Llm(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BiokgError::Llm(format!("OpenAI error: {error_text}")));
        }

        let result: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| BiokgError::Llm(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| BiokgError::Llm("No response generated".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Ollama Proposer
// ============================================================================

/// Ollama API proposer
pub struct OllamaProposer {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaProposer {
    /// Create a new Ollama proposer
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config.ollama_url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Proposer for OllamaProposer {
    async fn propose(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| BiokgError::Llm(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BiokgError::Llm(format!("Ollama error: {error_text}")));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| BiokgError::Llm(format!("Failed to parse Ollama response: {e}")))?;

        Ok(result.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ============================================================================
// Factory function
// ============================================================================

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BiokgError::Llm(format!("Failed to build HTTP client: {e}")))
}

/// Create a proposer from config
pub fn create_proposer(config: &LlmConfig) -> Result<Arc<dyn Proposer>> {
    match config.provider {
        LlmProvider::OpenAI => Ok(Arc::new(OpenAiProposer::from_config(config)?)),
        LlmProvider::Ollama => Ok(Arc::new(OllamaProposer::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_proposer_requires_api_key() {
        let config = LlmConfig::default();
        assert!(OpenAiProposer::from_config(&config).is_err());
    }

    #[test]
    fn test_openai_proposer_from_config() {
        let config = LlmConfig {
            openai_api_key: Some("test-key".to_string()),
            ..Default::default()
        };

        let proposer = OpenAiProposer::from_config(&config).unwrap();
        assert_eq!(proposer.model, "gpt-4o-mini");
        assert_eq!(proposer.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_ollama_proposer_creation() {
        let proposer = OllamaProposer::new("http://localhost:11434", "medgemma");
        assert_eq!(proposer.model, "medgemma");
    }

    #[test]
    fn test_create_proposer_respects_provider() {
        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            ..Default::default()
        };

        let proposer = create_proposer(&config).unwrap();
        assert_eq!(proposer.name(), "ollama");
    }
}

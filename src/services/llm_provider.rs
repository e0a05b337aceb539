use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LLMConfig;

/// Text-generation backend used for question and feedback prose.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str, options: &ModelOptions) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            model: "llama3".to_string(),
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

impl ModelOptions {
    pub fn from_config(config: &LLMConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Grading wants stable output, so it runs cooler than question writing.
    pub fn for_evaluation(&self) -> Self {
        Self {
            temperature: self.temperature.min(0.2),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl LlmProvider {
    pub fn new(config: &LLMConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Validate LLM configuration at startup.
    pub fn validate_config(config: &LLMConfig) -> Result<(), String> {
        if config.enabled && !config.mock {
            if config.api_url.trim().is_empty() {
                return Err(
                    "LLM_ENABLED=true with LLM_MOCK=false requires LLM_API_URL".to_string(),
                );
            }
            if config.timeout_secs == 0 {
                return Err("LLM_TIMEOUT_SECS must be > 0".to_string());
            }
            if config.model.trim().is_empty() {
                return Err("LLM_MODEL must not be empty".to_string());
            }
        }
        Ok(())
    }

    pub fn default_options(&self) -> ModelOptions {
        ModelOptions::from_config(&self.config)
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for LlmProvider {
    async fn generate_text(&self, prompt: &str, options: &ModelOptions) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }
        if self.config.mock {
            return Ok("Mock LLM response".to_string());
        }

        let body = GenerateRequest {
            model: &options.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await.map_err(LlmError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "LLM backend returned an error status");
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".to_string()));
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm is disabled")]
    Disabled,
    #[error("llm request timed out")]
    Timeout,
    #[error("llm network error: {0}")]
    Network(String),
    #[error("llm api error: status={status}, message={message}")]
    ApiError { status: u16, message: String },
    #[error("llm returned an unusable response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, mock: bool) -> LLMConfig {
        LLMConfig {
            enabled,
            mock,
            api_url: String::new(),
            api_key: String::new(),
            model: "llama3".to_string(),
            temperature: 0.7,
            max_tokens: 256,
            timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn disabled_mode_returns_error() {
        let provider = LlmProvider::new(&config(false, true));
        let result = provider
            .generate_text("prompt", &ModelOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::Disabled)));
    }

    #[tokio::test]
    async fn mock_mode_returns_text() {
        let provider = LlmProvider::new(&config(true, true));
        let result = provider
            .generate_text("prompt", &ModelOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "Mock LLM response");
    }

    #[tokio::test]
    async fn unreachable_backend_is_reported() {
        let mut cfg = config(true, false);
        cfg.api_url = "http://127.0.0.1:1/".to_string();
        let provider = LlmProvider::new(&cfg);
        assert_eq!(provider.endpoint(), "http://127.0.0.1:1/api/generate");
        let result = provider
            .generate_text("prompt", &provider.default_options())
            .await;
        assert!(matches!(
            result,
            Err(LlmError::Network(_)) | Err(LlmError::Timeout)
        ));
    }

    #[test]
    fn real_mode_requires_url() {
        assert!(LlmProvider::validate_config(&config(true, false)).is_err());
        assert!(LlmProvider::validate_config(&config(true, true)).is_ok());
        assert!(LlmProvider::validate_config(&config(false, false)).is_ok());

        let mut cfg = config(true, false);
        cfg.api_url = "http://localhost:11434".to_string();
        assert!(LlmProvider::validate_config(&cfg).is_ok());
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            model: "llama3",
            prompt: "hi",
            stream: false,
            options: GenerateOptions {
                temperature: 0.2,
                num_predict: 64,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 64);
    }

    #[test]
    fn evaluation_options_run_cooler() {
        let opts = ModelOptions::default().for_evaluation();
        assert_eq!(opts.temperature, 0.2);
        assert_eq!(opts.model, "llama3");
    }
}

//! Cerebras inference adapter (OpenAI-compatible chat completions)

use super::{DEFAULT_HTTP_TIMEOUT, ProviderError, failure_from_status, failure_from_transport};
use async_trait::async_trait;
use ensemble_application::BackendAdapter;
use ensemble_domain::{
    BackendFailure, CerebrasProviderConfig, DispatchOptions, Generation, ProviderKind,
    TokenUsage, providers::resolve_api_key,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct CerebrasAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CerebrasAdapter {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_timeout(api_key, base_url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from config, resolving the key from the config or its env var
    pub fn from_config(config: &CerebrasProviderConfig) -> Result<Self, ProviderError> {
        let api_key = resolve_api_key(config.api_key.as_deref(), &config.api_key_env).ok_or_else(
            || ProviderError::MissingApiKey {
                provider: ProviderKind::Cerebras,
                env_var: config.api_key_env.clone(),
            },
        )?;
        Self::new(api_key, config.base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl BackendAdapter for CerebrasAdapter {
    async fn generate(
        &self,
        prompt: &str,
        options: &DispatchOptions,
    ) -> Result<Generation, BackendFailure> {
        let request = ChatCompletionRequest::new(prompt, options);
        debug!("POST {} (model {})", self.endpoint(), options.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| failure_from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| failure_from_transport(&e))?;

        if !status.is_success() {
            return Err(failure_from_status(status, &body));
        }

        parse_response(&body)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(prompt: &'a str, options: &'a DispatchOptions) -> Self {
        Self {
            model: options.model.as_str(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

fn parse_response(body: &str) -> Result<Generation, BackendFailure> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        BackendFailure::MalformedResponse(format!("unparsable chat completion: {}", e))
    })?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| {
            BackendFailure::MalformedResponse("chat completion has no message content".to_string())
        })?;

    let generation = Generation::new(text);
    Ok(match parsed.usage {
        Some(u) => generation.with_usage(TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        None => generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let options = DispatchOptions::new("qwen-3-32b")
            .with_temperature(0.2)
            .with_max_tokens(1000);
        let request = ChatCompletionRequest::new("What is Rust?", &options);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "qwen-3-32b");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "What is Rust?");
        assert_eq!(value["max_tokens"], 1000);
        assert!((value["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_response_with_usage() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Rust is fast."}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }"#;

        let generation = parse_response(body).unwrap();
        assert_eq!(generation.text, "Rust is fast.");
        assert_eq!(generation.usage.unwrap().total_tokens, 8);
    }

    #[test]
    fn test_parse_response_without_choices_is_malformed() {
        let err = parse_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, BackendFailure::MalformedResponse(_)));

        let err = parse_response("<html>").unwrap_err();
        assert!(matches!(err, BackendFailure::MalformedResponse(_)));
    }

    #[test]
    fn test_from_config_without_key_fails() {
        let config = CerebrasProviderConfig {
            api_key_env: "ENSEMBLE_TEST_NO_SUCH_CEREBRAS_KEY".to_string(),
            ..CerebrasProviderConfig::default()
        };
        assert!(matches!(
            CerebrasAdapter::from_config(&config),
            Err(ProviderError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let adapter = CerebrasAdapter::new("k", "https://api.cerebras.ai/").unwrap();
        assert_eq!(adapter.endpoint(), "https://api.cerebras.ai/v1/chat/completions");
    }
}

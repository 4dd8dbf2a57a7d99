//! Google Gemini adapter (`models/{model}:generateContent`)

use super::{DEFAULT_HTTP_TIMEOUT, ProviderError, failure_from_status, failure_from_transport};
use async_trait::async_trait;
use ensemble_application::BackendAdapter;
use ensemble_domain::{
    BackendFailure, DispatchOptions, GeminiProviderConfig, Generation, ProviderKind, TokenUsage,
    providers::resolve_api_key,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiAdapter {
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
    pub fn from_config(config: &GeminiProviderConfig) -> Result<Self, ProviderError> {
        let api_key = resolve_api_key(config.api_key.as_deref(), &config.api_key_env).ok_or_else(
            || ProviderError::MissingApiKey {
                provider: ProviderKind::Gemini,
                env_var: config.api_key_env.clone(),
            },
        )?;
        Self::new(api_key, config.base_url.clone())
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl BackendAdapter for GeminiAdapter {
    async fn generate(
        &self,
        prompt: &str,
        options: &DispatchOptions,
    ) -> Result<Generation, BackendFailure> {
        let url = self.endpoint(options.model.as_str());
        let request = GenerateContentRequest::new(prompt, options);
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
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
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, options: &DispatchOptions) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

fn parse_response(body: &str) -> Result<Generation, BackendFailure> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        BackendFailure::MalformedResponse(format!("unparsable generateContent response: {}", e))
    })?;

    // Text may be split across several parts of the first candidate
    let text = parsed
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            BackendFailure::MalformedResponse("no text in response candidates".to_string())
        })?;

    let generation = Generation::new(text);
    Ok(match parsed.usage_metadata {
        Some(u) => generation.with_usage(TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }),
        None => generation,
    })
}

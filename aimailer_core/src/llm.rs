use crate::config::{Config, ProviderAuth, ProviderConfig, ProviderKind};
use crate::error::GenerationError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text-generation boundary the dispatcher talks to.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http_client: Client,
    provider_name: String,
    kind: ProviderKind,
    api_key: Option<String>,
    base_url: String,
    auth: ProviderAuth,
    temperature: Option<f32>,
}

// --- OpenAI-compatible wire types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

// --- Gemini generateContent wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

// Both Google and OpenAI-style providers wrap failures as {"error": {"message": ...}}.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Falls back to a default client, which has no timeout, when the builder failed.
fn client_or_default<E: std::fmt::Display>(built: Result<Client, E>, timeout: Duration) -> Client {
    built.unwrap_or_else(|err| {
        tracing::warn!(
            error = %err,
            ?timeout,
            "HTTP client setup failed, requests run without a timeout"
        );
        Client::new()
    })
}

impl LlmClient {
    pub fn from_provider(provider: &ProviderConfig, timeout: Duration) -> Self {
        let provider = provider.clone().normalized();
        let http_client = client_or_default(Client::builder().timeout(timeout).build(), timeout);

        Self {
            http_client,
            provider_name: provider.display_name(),
            kind: provider.kind,
            auth: provider.effective_auth(),
            api_key: provider.api_key,
            base_url: provider.base_url,
            temperature: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::from_provider(
            &config.provider,
            Duration::from_secs(config.generation.request_timeout_secs),
        );
        client.temperature = config.generation.temperature;
        client
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    async fn completion(&self, model: &str, prompt: &str) -> Result<String> {
        let model = model.trim();
        if model.is_empty() {
            return Err(anyhow!("No model configured for provider {}", self.provider_name));
        }

        tracing::debug!(
            provider = %self.provider_name,
            model,
            prompt_chars = prompt.chars().count(),
            "sending generation request"
        );

        match self.kind {
            ProviderKind::Gemini => self.execute_gemini_completion(model, prompt).await,
            _ => self.execute_openai_completion(model, prompt).await,
        }
    }

    async fn execute_gemini_completion(&self, model: &str, prompt: &str) -> Result<String> {
        let url = gemini_generate_url(&self.base_url, model);
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: self
                .temperature
                .map(|temperature| GeminiGenerationConfig { temperature }),
        };

        let request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");
        let request = apply_auth_header(request, self)?;
        let response = request
            .json(&request_body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.provider_name))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        parse_gemini_response(&text)
    }

    async fn execute_openai_completion(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request_body = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        let request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");
        let request = apply_auth_header(request, self)?;
        let response = request
            .json(&request_body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.provider_name))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        parse_chat_response(&text)
    }
}

#[async_trait]
impl GenerationClient for LlmClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        self.completion(model, prompt).await.map_err(GenerationError::from)
    }
}

fn gemini_generate_url(base_url: &str, model: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

fn parse_gemini_response(text: &str) -> Result<String> {
    let parsed: GeminiResponse = serde_json::from_str(text).map_err(|e| {
        anyhow!(
            "Failed to parse LLM response: {} | Raw response: {}",
            e,
            truncate_error(text)
        )
    })?;

    let Some(candidate) = parsed.candidates.first() else {
        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(anyhow!("Request blocked by provider safety filter ({})", reason));
        }
        return Err(anyhow!("No candidates returned from LLM"));
    };

    let content: String = candidate
        .content
        .as_ref()
        .map(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if content.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason) => Err(anyhow!("LLM stopped without text. Reason: {}", reason)),
            None => Err(anyhow!("LLM returned empty content")),
        };
    }

    Ok(content)
}

fn parse_chat_response(text: &str) -> Result<String> {
    let chat_response: ChatResponse = serde_json::from_str(text).map_err(|e| {
        anyhow!(
            "Failed to parse LLM response: {} | Raw response: {}",
            e,
            truncate_error(text)
        )
    })?;

    let first_choice = chat_response
        .choices
        .first()
        .ok_or_else(|| anyhow!("No choices returned from LLM"))?;

    match (&first_choice.message, first_choice.finish_reason.as_deref()) {
        (Some(msg), _) if !msg.content.trim().is_empty() => Ok(msg.content.clone()),
        (_, Some(reason)) if reason.to_lowercase().contains("content_filter") => {
            Err(anyhow!("Response blocked by provider content filter"))
        }
        (_, Some(reason)) => Err(anyhow!("LLM stopped without text. Reason: {}", reason)),
        (_, None) => Err(anyhow!("LLM returned empty content")),
    }
}

fn api_error(status: reqwest::StatusCode, body: &str) -> anyhow::Error {
    let detail = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| truncate_error(body));

    let lower = body.to_lowercase();
    let hint = if status.as_u16() == 429 || lower.contains("rate limit") || lower.contains("quota")
    {
        " (quota/rate-limit)"
    } else {
        ""
    };

    anyhow!("LLM API Error (Status {}): {}{}", status, detail, hint)
}

fn apply_auth_header(
    request: reqwest::RequestBuilder,
    client: &LlmClient,
) -> Result<reqwest::RequestBuilder> {
    let key = || {
        client
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Missing API key for provider {}", client.provider_name))
    };

    match client.auth {
        ProviderAuth::None => Ok(request),
        ProviderAuth::Bearer => Ok(request.header("Authorization", format!("Bearer {}", key()?))),
        ProviderAuth::GoogApiKey => Ok(request.header("x-goog-api-key", key()?)),
    }
}

fn truncate_error(text: &str) -> String {
    const MAX: usize = 320;
    if text.len() > MAX {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_url_targets_generate_content() {
        assert_eq!(
            gemini_generate_url("https://generativelanguage.googleapis.com/v1beta/", "gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            gemini_generate_url("https://g.test/v1beta", "models/gemini-pro"),
            "https://g.test/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn gemini_request_serializes_camel_case() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some("hi".to_string()),
                }],
            }],
            generation_config: Some(GeminiGenerationConfig { temperature: 0.5 }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn gemini_response_joins_text_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Subject: Hi\n"},{"text":"Body: Hello"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_gemini_response(raw).unwrap(), "Subject: Hi\nBody: Hello");
    }

    #[test]
    fn gemini_block_reason_is_reported() {
        let raw = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = parse_gemini_response(raw).unwrap_err().to_string();
        assert!(err.contains("SAFETY"));
    }

    #[test]
    fn gemini_empty_candidate_reports_finish_reason() {
        let raw = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        let err = parse_gemini_response(raw).unwrap_err().to_string();
        assert!(err.contains("MAX_TOKENS"));
    }

    #[test]
    fn chat_response_returns_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"A short summary."},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_chat_response(raw).unwrap(), "A short summary.");
    }

    #[test]
    fn chat_content_filter_is_reported() {
        let raw = r#"{"choices":[{"message":null,"finish_reason":"content_filter"}]}"#;
        let err = parse_chat_response(raw).unwrap_err().to_string();
        assert!(err.contains("content filter"));
    }

    #[test]
    fn api_error_prefers_provider_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err = api_error(reqwest::StatusCode::BAD_REQUEST, body).to_string();
        assert!(err.contains("400"));
        assert!(err.contains("API key not valid"));
        assert!(!err.contains("INVALID_ARGUMENT"));
    }

    #[test]
    fn api_error_flags_rate_limits() {
        let err = api_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down").to_string();
        assert!(err.contains("slow down"));
        assert!(err.ends_with("(quota/rate-limit)"));
    }

    #[test]
    fn truncate_error_respects_char_boundaries() {
        let text = "é".repeat(400);
        let out = truncate_error(&text);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 323);
    }

    #[tokio::test]
    async fn failed_builder_falls_back_to_a_default_client() {
        let client = client_or_default(Err("tls backend unavailable"), Duration::from_secs(5));
        let err = client
            .get("http://127.0.0.1:9/unreachable")
            .send()
            .await
            .unwrap_err();
        assert!(err.is_connect() || err.is_request());
    }

    #[tokio::test]
    async fn missing_key_fails_at_first_use() {
        let provider = ProviderConfig::builtin(ProviderKind::Gemini, None);
        let client = LlmClient::from_provider(&provider, Duration::from_secs(5));
        let err = client.generate("gemini-1.5-flash", "hello").await.unwrap_err();
        assert!(err.message.contains("Missing API key"));
    }

    #[tokio::test]
    async fn blank_model_is_rejected_before_sending() {
        let provider = ProviderConfig::builtin(ProviderKind::Ollama, None);
        let client = LlmClient::from_provider(&provider, Duration::from_secs(5));
        let err = client.generate("  ", "hello").await.unwrap_err();
        assert!(err.message.contains("No model configured"));
    }
}

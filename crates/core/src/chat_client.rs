//! OpenAI-compatible `/chat/completions` client for the text-generation
//! collaborator, with bounded retry on transient failures.

use crate::config::TextGenerationConfig;
use crate::error::{EngineError, EngineResult};
use crate::textgen::{GenerationOptions, ResponseFormat, TextGenerator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

const SYSTEM_PROMPT: &str =
    "You are an influencer marketing analyst. Answer with a single JSON object when asked for structured data.";
const MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("response carried no message content")]
    Empty,
}

impl CallError {
    fn is_retriable(&self) -> bool {
        match self {
            CallError::Http(e) => e.is_timeout() || e.is_connect(),
            CallError::Status { status, .. } => is_retriable_status(*status),
            CallError::Empty => false,
        }
    }
}

fn is_retriable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Exponential back-off with ±25 % jitter, capped at 30 s.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let computed = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    let jitter = rand::random::<f64>() * 0.5 + 0.75;
    Duration::from_millis((capped as f64 * jitter) as u64)
}

pub struct ChatCompletionsGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &TextGenerationConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    async fn call_once(&self, prompt: &str, options: &GenerationOptions) -> Result<String, CallError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: match options.response_format {
                ResponseFormat::JsonObject => Some(ResponseFormatBody {
                    kind: "json_object",
                }),
                ResponseFormat::Text => None,
            },
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CallError::Status { status, body });
        }

        let chat: ChatResponse = resp.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CallError::Empty)
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> EngineResult<String> {
        let mut attempt = 0u32;
        loop {
            match self.call_once(prompt, options).await {
                Ok(text) => {
                    metrics::counter!("textgen.requests", "outcome" => "ok").increment(1);
                    debug!(model = %self.model, response_length = text.len(), "Generation received");
                    return Ok(text);
                }
                Err(err) if err.is_retriable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.retry_backoff_ms, attempt);
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient generation error, retrying after back-off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    metrics::counter!("textgen.requests", "outcome" => "error").increment(1);
                    error!(model = %self.model, attempts = attempt + 1, error = %err, "Generation failed");
                    return Err(EngineError::ExternalService(err.to_string()));
                }
            }
        }
    }
}

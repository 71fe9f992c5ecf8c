//! Text-generation collaborator seam and typed decoding of its output.
//!
//! Model output is untrusted free text. [`decode_structured`] turns it into
//! a [`Decoded`] value that is either the parsed schema or the schema's
//! documented placeholder, so callers always receive every field.

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl GenerationOptions {
    pub fn json(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            response_format: ResponseFormat::JsonObject,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> EngineResult<String>;
}

/// Schemas with a documented "unable to analyze" value of the same shape.
pub trait Placeholder {
    fn placeholder() -> Self;
}

/// Tagged result of decoding model output.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Parsed(T),
    Fallback { value: T, reason: String },
}

impl<T> Decoded<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Decoded::Fallback { .. })
    }

    pub fn into_inner(self) -> T {
        match self {
            Decoded::Parsed(value) | Decoded::Fallback { value, .. } => value,
        }
    }
}

/// Returns the JSON object embedded in `raw`, tolerating markdown fences and
/// chatter around it.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

pub fn decode_structured<T>(raw: &str) -> Decoded<T>
where
    T: DeserializeOwned + Placeholder,
{
    let Some(body) = extract_json_object(raw) else {
        return Decoded::Fallback {
            value: T::placeholder(),
            reason: "no JSON object in response".to_string(),
        };
    };
    match serde_json::from_str::<T>(body) {
        Ok(value) => Decoded::Parsed(value),
        Err(e) => Decoded::Fallback {
            value: T::placeholder(),
            reason: e.to_string(),
        },
    }
}

/// Runs a prompt and decodes the answer. Collaborator failures and malformed
/// output are logged and replaced by the placeholder; nothing propagates.
pub async fn generate_structured<T>(
    generator: &dyn TextGenerator,
    purpose: &'static str,
    prompt: &str,
    options: &GenerationOptions,
) -> Decoded<T>
where
    T: DeserializeOwned + Placeholder,
{
    debug!(purpose, prompt_length = prompt.len(), generator = generator.name(), "Requesting generation");
    let decoded = match generator.generate(prompt, options).await {
        Ok(raw) => decode_structured(&raw),
        Err(e) => Decoded::Fallback {
            value: T::placeholder(),
            reason: e.to_string(),
        },
    };
    if let Decoded::Fallback { reason, .. } = &decoded {
        metrics::counter!("textgen.fallbacks", "purpose" => purpose).increment(1);
        warn!(purpose, reason = %reason, "Generation unusable, substituting placeholder");
    }
    decoded
}

/// Generator that replays canned responses, for tests and offline runs.
/// Once the script is exhausted it fails every call.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    fn push(&self, entry: Result<String, String>) {
        self.responses
            .lock()
            .expect("scripted generator mutex poisoned")
            .push_back(entry);
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .expect("scripted generator mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> EngineResult<String> {
        self.prompts
            .lock()
            .expect("scripted generator mutex poisoned")
            .push(prompt.to_string());
        let next = self
            .responses
            .lock()
            .expect("scripted generator mutex poisoned")
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(EngineError::ExternalService(message)),
            None => Err(EngineError::ExternalService("script exhausted".to_string())),
        }
    }
}

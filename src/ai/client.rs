use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::errors::{AiError, AiResult};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Keeps the key out of URLs, which reqwest echoes into its error text.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Temperature used for chat-style agent calls.
pub const CHAT_TEMPERATURE: f32 = 0.7;

/// Seam between the agents and the hosted model.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    fn model(&self) -> &str;

    /// Single prompt in, text out.
    async fn generate_content(&self, prompt: &str) -> AiResult<String>;

    /// System instruction plus one user message.
    async fn invoke(&self, system: &str, input: &str) -> AiResult<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_owned),
            parts: vec![TextPart {
                text: text.to_owned(),
            }],
        }
    }
}

fn transport_error(e: reqwest::Error) -> AiError {
    let e = e.without_url();
    error!(error = %e, "Gemini request failed");
    AiError::Transport(e.to_string())
}

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    api_key: String,
    client: Client,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            model: model.into(),
            base_url: API_BASE_URL.to_owned(),
        }
    }

    /// Point the client at another endpoint (used against mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send(&self, request: &GeminiRequest) -> AiResult<String> {
        debug!(model = %self.model, "sending request to Gemini");
        let response = self
            .client
            .post(self.build_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            error!(%status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "failed to parse Gemini response");
            AiError::Provider {
                status: status.as_u16(),
                message: format!("unreadable response: {e}"),
            }
        })?;

        if let Some(err) = parsed.error {
            return Err(AiError::Provider {
                status: status.as_u16(),
                message: err.message,
            });
        }

        Self::extract_text(parsed)
    }

    fn extract_text(response: GeminiResponse) -> AiResult<String> {
        let content = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .ok_or(AiError::EmptyResponse)?;
        if content.parts.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn map_api_error(status: u16, body: &str) -> AiError {
        let message = serde_json::from_str::<GeminiResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| body.to_owned(), |e| e.message);
        if status == 429 {
            AiError::RateLimited(
                "AI service quota exceeded. Please wait a moment and try again.".to_owned(),
            )
        } else {
            AiError::Provider { status, message }
        }
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate_content(&self, prompt: &str) -> AiResult<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent::text(Some("user"), prompt)],
            system_instruction: None,
            generation_config: None,
        };
        self.send(&request).await
    }

    #[instrument(skip(self, system, input), fields(model = %self.model, input_len = input.len()))]
    async fn invoke(&self, system: &str, input: &str) -> AiResult<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent::text(Some("user"), input)],
            system_instruction: Some(GeminiContent::text(None, system)),
            generation_config: Some(GenerationConfig {
                temperature: CHAT_TEMPERATURE,
            }),
        };
        self.send(&request).await
    }
}

/// One call seen by [`ScriptedClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system: Option<String>,
    pub input: String,
}

/// Offline client that answers every call with a fixed reply and records what it was asked.
pub struct ScriptedClient {
    reply: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, system: Option<&str>, input: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                system: system.map(str::to_owned),
                input: input.to_owned(),
            });
        }
    }
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate_content(&self, prompt: &str) -> AiResult<String> {
        self.record(None, prompt);
        Ok(self.reply.clone())
    }

    async fn invoke(&self, system: &str, input: &str) -> AiResult<String> {
        self.record(Some(system), input);
        Ok(self.reply.clone())
    }
}

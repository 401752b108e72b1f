//! Minimal client for the Gemini `generateContent` REST endpoint
//!
//! Only the slice of the API this application uses is modeled: text
//! generation (optionally grounded through Google Search or constrained by a
//! response schema) and speech synthesis via inline audio data. Errors render
//! the HTTP status and the service's own message so the retry layer can
//! classify them from text alone.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default API endpoint root
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound for one HTTP round trip; generation is slow but must not
/// stall a fetch forever
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Text-generation model used for news and launch content
pub const TEXT_MODEL: &str = "gemini-2.5-flash";

/// Speech-synthesis model
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Errors from the Gemini API client
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Transport-level failure (connect, timeout, broken body)
    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx response, carrying the service's status and message text
    #[error("api error {status} {reason}: {message}")]
    Api {
        status: u16,
        reason: &'static str,
        message: String,
    },
    /// 2xx response whose body was not the expected JSON
    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for issuing `generateContent` calls
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client against the production endpoint
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Creates a client against a different endpoint root (mock servers)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Calls `models/{model}:generateContent` with the given API key
    pub async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or(""),
                message: extract_error_message(&body),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls the human-readable message out of a Gemini error body
///
/// The service wraps errors as `{"error": {"code", "message", "status"}}`;
/// when the body is not that shape the raw text is kept (truncated).
fn extract_error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if !envelope.error.status.is_empty() || !envelope.error.message.is_empty() {
            return format!("{} {}", envelope.error.status, envelope.error.message)
                .trim()
                .to_string();
        }
    }
    body.trim().chars().take(200).collect()
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Request body for `generateContent`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A bare text prompt with no tools or generation config
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content::from_text(prompt)],
            system_instruction: None,
            tools: None,
            generation_config: None,
        }
    }

    /// Attaches a system instruction
    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.system_instruction = Some(Content::from_text(instruction));
        self
    }

    /// Enables the Google Search grounding tool
    pub fn with_google_search(mut self) -> Self {
        self.tools = Some(vec![Tool {
            google_search: Some(GoogleSearch {}),
        }]);
        self
    }

    /// Attaches a generation config
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

/// A piece of conversation content (request prompt or response candidate)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Content holding a single text part
    pub fn from_text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }
    }
}

/// One part of a content block: text or inline binary data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded binary payload (speech audio)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub data: String,
}

/// Tool declaration; only Google Search grounding is used here
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "googleSearch", skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

/// Marker object enabling search grounding
#[derive(Debug, Clone, Serialize)]
pub struct GoogleSearch {}

/// Generation options: structured output and speech settings
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

/// Speech synthesis settings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

impl SpeechConfig {
    /// Config selecting one of the prebuilt voices
    pub fn with_voice(voice_name: &str) -> Self {
        Self {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice_name.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

/// Response body for `generateContent`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Base64 payload of the first inline-data part, if any
    pub fn inline_data(&self) -> Option<&str> {
        let content = self.candidates.first()?.content.as_ref()?;
        content
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.as_str())
    }

    /// Web sources listed in the first candidate's grounding metadata
    pub fn web_sources(&self) -> Vec<&WebSource> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| {
                m.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One generated candidate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Search-grounding data attached to a candidate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

/// A web page the response was grounded on
#[derive(Debug, Clone, Deserialize)]
pub struct WebSource {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

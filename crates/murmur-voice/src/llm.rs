use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::http::{build_client, ensure_success, join_url};
use async_trait::async_trait;
use murmur_types::Turn;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A text-generation capability that answers a whole conversation.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generates the next model reply for `history`.
    ///
    /// `history` is only read; the caller decides when turns are appended.
    async fn generate(
        &self,
        history: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn build_request<'a>(
    history: &'a [Turn],
    system_instruction: Option<&'a str>,
) -> GenerateContentRequest<'a> {
    let contents = history
        .iter()
        .map(|turn| Content {
            role: turn.role().as_str(),
            parts: vec![Part { text: turn.text() }],
        })
        .collect();

    GenerateContentRequest {
        contents,
        system_instruction: system_instruction
            .filter(|s| !s.trim().is_empty())
            .map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
    }
}

/// Text of the first candidate; its parts are concatenated.
fn first_candidate_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::NoCandidates)?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::NoCandidates);
    }
    Ok(text)
}

/// HTTP client for a Gemini-style `generateContent` API.
#[derive(Debug, Clone)]
pub struct LlmService {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = build_client(config.request_timeout()).map_err(LlmError::Config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[async_trait]
impl LanguageModel for LlmService {
    async fn generate(
        &self,
        history: &[Turn],
        system_instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LlmError::Config("GEMINI_API_KEY is not configured".to_string()))?;

        let url = join_url(
            &self.config.base_url,
            &format!("/v1beta/models/{}:generateContent", self.config.model),
        );
        let body = build_request(history, system_instruction);

        debug!(model = %self.config.model, turns = history.len(), "requesting generation");
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, "generateContent")
            .await
            .map_err(LlmError::Upstream)?;
        let parsed: GenerateContentResponse = response.json().await?;
        first_candidate_text(parsed)
    }
}

use crate::config::TtsConfig;
use crate::error::TtsError;
use crate::http::{build_client, ensure_success, join_url};
use async_trait::async_trait;
use murmur_types::{AudioReference, VoiceInfo, VoiceProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// A speech-synthesis capability, called once per text chunk.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesizes one chunk and returns where the audio can be fetched.
    async fn synthesize(&self, chunk: &str) -> Result<AudioReference, TtsError>;

    /// Voices the provider offers.
    async fn voices(&self) -> Result<Vec<VoiceInfo>, TtsError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize)]
struct GenerateSpeechRequest<'a> {
    voice_id: &'a str,
    text: &'a str,
    output_format: &'static str,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateSpeechResponse {
    #[serde(rename = "audioFile", default)]
    audio_file: Option<String>,
}

/// HTTP client for a Murf-style speech generation API.
#[derive(Debug, Clone)]
pub struct TtsService {
    config: TtsConfig,
    profile: VoiceProfile,
    client: reqwest::Client,
}

impl TtsService {
    pub fn new(config: TtsConfig) -> Result<Self, TtsError> {
        let client = build_client(config.request_timeout()).map_err(TtsError::Config)?;
        let profile = config.profile();
        Ok(Self {
            config,
            profile,
            client,
        })
    }

    /// Returns the voice used for synthesis.
    pub fn profile(&self) -> &VoiceProfile {
        &self.profile
    }

    fn api_key(&self) -> Result<&str, TtsError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TtsError::Config("MURF_API_KEY is not configured".to_string()))
    }
}

#[async_trait]
impl TextToSpeech for TtsService {
    async fn synthesize(&self, chunk: &str) -> Result<AudioReference, TtsError> {
        let text = chunk.trim();
        if text.is_empty() {
            return Err(TtsError::InvalidInput("text is empty".to_string()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(TtsError::InvalidInput(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }
        let api_key = self.api_key()?;

        let body = GenerateSpeechRequest {
            voice_id: &self.profile.voice_id,
            text,
            output_format: self.profile.output_format.as_str(),
            style: &self.profile.style,
        };
        debug!(
            voice_id = %self.profile.voice_id,
            chars = text.chars().count(),
            "requesting speech"
        );

        let response = self
            .client
            .post(join_url(&self.config.base_url, "/v1/speech/generate"))
            .header("api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, "speech generation")
            .await
            .map_err(TtsError::Upstream)?;
        let parsed: GenerateSpeechResponse = response.json().await?;

        parsed
            .audio_file
            .filter(|url| !url.trim().is_empty())
            .map(AudioReference::new)
            .ok_or(TtsError::NoAudio)
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>, TtsError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(join_url(&self.config.base_url, "/v1/speech/voices"))
            .header("accept", "application/json")
            .header("api-key", api_key)
            .send()
            .await?;
        let response = ensure_success(response, "voice listing")
            .await
            .map_err(TtsError::Upstream)?;
        Ok(response.json().await?)
    }
}

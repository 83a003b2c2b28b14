//! Voice profile and catalogue definitions.
//!
//! A `VoiceProfile` selects how synthesized replies sound. `VoiceInfo` is one
//! entry of the provider's voice catalogue.

use serde::{Deserialize, Serialize};

/// Audio container requested from the synthesis provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
}

impl AudioFormat {
    /// Returns the wire label sent upstream.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }
}

/// A voice profile configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Provider voice identifier (e.g. `en-UK-hazel`).
    pub voice_id: String,
    /// Speaking style understood by the provider.
    pub style: String,
    /// Output container.
    #[serde(default)]
    pub output_format: AudioFormat,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            voice_id: "en-UK-hazel".to_string(),
            style: "Conversational".to_string(),
            output_format: AudioFormat::Mp3,
        }
    }
}

/// One voice offered by the synthesis provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    pub voice_id: String,
    pub display_name: String,
    #[serde(default)]
    pub accent: String,
    #[serde(default)]
    pub gender: String,
}

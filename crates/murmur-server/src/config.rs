//! Server configuration loading from file and environment variables.

use murmur_conversation::PipelineSettings;
use murmur_types::AudioReference;
use murmur_voice::{LlmConfig, SttConfig, TtsConfig};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Speech-to-text provider.
    #[serde(default)]
    pub stt: SttConfig,

    /// Language-model provider.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Text-to-speech provider.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Turn pipeline tunables.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Static asset serving.
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "murmur_conversation=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Turn pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Longest text sent to one synthesis call, in characters.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Synthesis calls in flight per turn.
    #[serde(default = "default_tts_concurrency")]
    pub tts_concurrency: usize,

    /// Upper bound on any single upstream call, in seconds.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    /// Audio returned whenever live synthesis is unavailable.
    #[serde(default = "default_fallback_audio_url")]
    pub fallback_audio_url: String,
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub dir: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_chunk_chars() -> usize {
    3000
}

fn default_tts_concurrency() -> usize {
    4
}

fn default_stage_timeout_secs() -> u64 {
    45
}

fn default_fallback_audio_url() -> String {
    "/static/fallback.mp3".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            tts_concurrency: default_tts_concurrency(),
            stage_timeout_secs: default_stage_timeout_secs(),
            fallback_audio_url: default_fallback_audio_url(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            dir: default_static_dir(),
        }
    }
}

impl Config {
    /// Orchestrator settings derived from the provider and pipeline sections.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            poll_interval: self.stt.poll_interval(),
            max_wait: self.stt.max_wait(),
            max_chunk_chars: self.conversation.max_chunk_chars.max(1),
            tts_concurrency: self.conversation.tts_concurrency.max(1),
            stage_timeout: Duration::from_secs(self.conversation.stage_timeout_secs),
            fallback_audio: AudioReference::new(self.conversation.fallback_audio_url.clone()),
            system_instruction: self.llm.system_instruction.clone(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MURMUR_HOST` overrides `server.host`
/// - `MURMUR_PORT` overrides `server.port`
/// - `MURMUR_LOG_LEVEL` overrides `logging.level`
/// - `MURMUR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `MURMUR_STATIC_DIR` overrides `static_files.dir`
/// - `MURMUR_FALLBACK_AUDIO_URL` overrides `conversation.fallback_audio_url`
/// - `MURMUR_MAX_CHUNK_CHARS` overrides `conversation.max_chunk_chars`
/// - `ASSEMBLYAI_API_KEY`, `GEMINI_API_KEY`, `MURF_API_KEY` set the provider credentials
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Applies overrides from `var`, a lookup of environment-style variables.
pub fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| var(name).filter(|value| !value.trim().is_empty());

    if let Some(host) = var("MURMUR_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("MURMUR_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = var("MURMUR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("MURMUR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(dir) = var("MURMUR_STATIC_DIR") {
        config.static_files.dir = dir;
    }
    if let Some(url) = var("MURMUR_FALLBACK_AUDIO_URL") {
        config.conversation.fallback_audio_url = url;
    }
    if let Some(max) = var("MURMUR_MAX_CHUNK_CHARS") {
        if let Ok(parsed) = max.parse() {
            config.conversation.max_chunk_chars = parsed;
        }
    }
    if let Some(key) = var("ASSEMBLYAI_API_KEY") {
        config.stt.api_key = Some(key);
    }
    if let Some(key) = var("GEMINI_API_KEY") {
        config.llm.api_key = Some(key);
    }
    if let Some(key) = var("MURF_API_KEY") {
        config.tts.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.conversation.max_chunk_chars, 3000);
        assert_eq!(config.tts.voice_id, "en-UK-hazel");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.static_files.dir, "static");
    }

    #[test]
    fn sections_are_parsed() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9100

            [stt]
            poll_interval_ms = 250
            max_wait_secs = 20

            [llm]
            model = "gemini-2.0-flash"
            system_instruction = "Keep answers short."

            [tts]
            voice_id = "en-US-natalie"
            output_format = "wav"

            [conversation]
            max_chunk_chars = 500
            fallback_audio_url = "https://cdn.example/sorry.mp3"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.tts.profile().output_format.as_str(), "wav");

        let settings = config.pipeline_settings();
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.max_wait, Duration::from_secs(20));
        assert_eq!(settings.max_chunk_chars, 500);
        assert_eq!(
            settings.fallback_audio.as_str(),
            "https://cdn.example/sorry.mp3"
        );
        assert_eq!(
            settings.system_instruction.as_deref(),
            Some("Keep answers short.")
        );
    }

    #[test]
    fn overrides_replace_values_and_skip_blank_ones() {
        let vars: HashMap<&str, &str> = [
            ("MURMUR_PORT", "7000"),
            ("MURMUR_LOG_JSON", "1"),
            ("MURF_API_KEY", "murf-key"),
            ("GEMINI_API_KEY", "  "),
            ("MURMUR_MAX_CHUNK_CHARS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.port, 7000);
        assert!(config.logging.json);
        assert_eq!(config.tts.api_key.as_deref(), Some("murf-key"));
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.conversation.max_chunk_chars, 3000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/definitely/not/here/murmur.toml")).unwrap();
        assert_eq!(config.server.host, default_host());
    }
}

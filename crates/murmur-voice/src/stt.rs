use crate::config::SttConfig;
use crate::error::SttError;
use crate::http::{build_client, ensure_success, join_url};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Maximum audio input size for STT (25 MiB). Prevents OOM from oversized payloads.
pub const MAX_STT_INPUT_BYTES: usize = 25 * 1024 * 1024;

/// Provider-side state of a transcription request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    #[serde(alias = "error")]
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One outstanding transcription request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptionJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A transcription capability with a submit/poll contract.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Uploads the audio and starts a transcription job.
    async fn submit(&self, audio: &[u8]) -> Result<TranscriptionJob, SttError>;

    /// Fetches the current state of a job.
    async fn status(&self, job_id: &str) -> Result<TranscriptionJob, SttError>;

    /// Polls `job` every `poll_interval` until it reaches a terminal status.
    ///
    /// The whole loop, including status requests, is bounded by `max_wait`.
    async fn poll_until_done(
        &self,
        job: TranscriptionJob,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Result<String, SttError> {
        let job_id = job.id.clone();
        let polling = async {
            let mut job = job;
            loop {
                match job.status {
                    JobStatus::Completed => return Ok(job.text.unwrap_or_default()),
                    JobStatus::Failed => {
                        return Err(SttError::Transcription(
                            job.error
                                .unwrap_or_else(|| "provider reported failure".to_string()),
                        ))
                    }
                    JobStatus::Queued | JobStatus::Processing => {
                        debug!(job_id = %job.id, status = ?job.status, "transcription pending");
                    }
                }
                tokio::time::sleep(poll_interval).await;
                job = self.status(&job.id).await?;
            }
        };

        tokio::time::timeout(max_wait, polling)
            .await
            .map_err(|_| {
                SttError::Timeout(format!(
                    "job {} not finished after {} ms",
                    job_id,
                    max_wait.as_millis()
                ))
            })?
    }
}

/// Uploaded audio held on local disk for the duration of one submission.
///
/// The backing file is removed when the spool is dropped, whichever way the
/// upload ended.
#[derive(Debug)]
pub struct AudioSpool {
    file: NamedTempFile,
}

impl AudioSpool {
    /// Writes `audio` to a fresh temp file in `dir` (or the OS temp dir).
    pub async fn write(dir: Option<&Path>, audio: &[u8]) -> Result<Self, SttError> {
        let dir: Option<PathBuf> = dir.map(Path::to_path_buf);
        let audio = audio.to_vec();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            use std::io::Write;
            let mut builder = tempfile::Builder::new();
            builder.prefix("murmur-upload-").suffix(".audio");
            let mut file = match dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            file.write_all(&audio)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| SttError::Io(std::io::Error::other(format!("spool task failed: {}", e))))??;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the backing file now, reporting failures instead of ignoring them.
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), "failed to remove spooled audio: {}", e);
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

/// HTTP client for an AssemblyAI-style transcription API.
#[derive(Debug, Clone)]
pub struct SttService {
    config: SttConfig,
    client: reqwest::Client,
}

impl SttService {
    pub fn new(config: SttConfig) -> Result<Self, SttError> {
        let client = build_client(config.request_timeout()).map_err(SttError::Config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SttConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, SttError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SttError::Config("ASSEMBLYAI_API_KEY is not configured".to_string()))
    }

    /// Spools the audio, uploads it and returns the provider's access URL.
    async fn upload(&self, api_key: &str, audio: &[u8]) -> Result<String, SttError> {
        let spool = AudioSpool::write(self.config.spool_dir.as_deref(), audio).await?;
        let result = self.upload_spooled(api_key, spool.path()).await;
        spool.release();
        result
    }

    async fn upload_spooled(&self, api_key: &str, path: &Path) -> Result<String, SttError> {
        let body = tokio::fs::read(path).await?;
        let response = self
            .client
            .post(join_url(&self.config.base_url, "/v2/upload"))
            .header("authorization", api_key)
            .header("content-type", "application/octet-stream")
            .body(body)
            .send()
            .await?;
        let response = ensure_success(response, "audio upload")
            .await
            .map_err(SttError::Upstream)?;
        let upload: UploadResponse = response.json().await?;
        Ok(upload.upload_url)
    }
}

#[async_trait]
impl SpeechToText for SttService {
    async fn submit(&self, audio: &[u8]) -> Result<TranscriptionJob, SttError> {
        if audio.is_empty() {
            return Err(SttError::InvalidInput("audio data is empty".to_string()));
        }
        if audio.len() > MAX_STT_INPUT_BYTES {
            return Err(SttError::InvalidInput(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                MAX_STT_INPUT_BYTES
            )));
        }
        let api_key = self.api_key()?;

        let audio_url = self.upload(api_key, audio).await?;
        debug!(bytes = audio.len(), "audio uploaded for transcription");

        let response = self
            .client
            .post(join_url(&self.config.base_url, "/v2/transcript"))
            .header("authorization", api_key)
            .json(&TranscriptRequest {
                audio_url: &audio_url,
            })
            .send()
            .await?;
        let response = ensure_success(response, "transcript request")
            .await
            .map_err(SttError::Upstream)?;
        let job: TranscriptionJob = response.json().await?;
        debug!(job_id = %job.id, status = ?job.status, "transcription job submitted");
        Ok(job)
    }

    async fn status(&self, job_id: &str) -> Result<TranscriptionJob, SttError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(join_url(
                &self.config.base_url,
                &format!("/v2/transcript/{}", job_id),
            ))
            .header("authorization", api_key)
            .send()
            .await?;
        let response = ensure_success(response, "transcript status")
            .await
            .map_err(SttError::Upstream)?;
        Ok(response.json().await?)
    }
}

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub transcribe: TranscribeConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeConfig {
    /// NATS URL of the streaming STT service. When absent, sessions run
    /// on the demo backend.
    #[serde(default)]
    pub nats_url: Option<String>,

    /// Sample rate the STT service expects (16kHz for Whisper-family models)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono)
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Idle time after which the reaper evicts a session
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,

    /// Interval between reaper sweeps
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,

    /// Maximum accepted size of a single audio chunk
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,

    /// How long an event poll may suspend before returning an empty batch
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl TranscribeConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    /// API key for the summarization service. Falls back to OPENAI_API_KEY;
    /// absence degrades /summarize to the placeholder summary.
    #[serde(default = "default_summary_api_key")]
    pub api_key: Option<String>,

    /// Chat-completions endpoint (OpenAI-compatible)
    #[serde(default = "default_summary_api_url")]
    pub api_url: String,

    /// Preferred model, tried before the built-in candidates
    #[serde(default = "default_summary_model")]
    pub model: Option<String>,

    /// Extracted text beyond this length is truncated head+tail
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory where uploaded audio files are stored
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Directory holding the static single-page UI
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Request body cap for uploads, in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_service_name() -> String {
    "visit-scribe".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_channels() -> u16 {
    1
}

fn default_session_timeout_secs() -> u64 {
    120
}

fn default_reaper_interval_secs() -> u64 {
    15
}

fn default_max_chunk_bytes() -> usize {
    1024 * 1024
}

fn default_poll_timeout_secs() -> u64 {
    25
}

fn default_summary_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
}

fn default_summary_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_summary_model() -> Option<String> {
    std::env::var("OPENAI_MODEL")
        .ok()
        .filter(|m| !m.trim().is_empty())
}

fn default_max_prompt_chars() -> usize {
    24_000
}

fn default_upload_dir() -> String {
    "uploads_audio".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_max_upload_mb() -> usize {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            nats_url: None,
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            session_timeout_secs: default_session_timeout_secs(),
            reaper_interval_secs: default_reaper_interval_secs(),
            max_chunk_bytes: default_max_chunk_bytes(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: default_summary_api_key(),
            api_url: default_summary_api_url(),
            model: default_summary_model(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            static_dir: default_static_dir(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file, layered under
    /// VISIT_SCRIBE__-prefixed environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VISIT_SCRIBE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

use crate::error::{ForgeError, Result};
use crate::session::{DEFAULT_IDLE_TTL_MINUTES, DEFAULT_MAX_SESSIONS};
use std::env;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_mb: Option<usize>,
    pub max_sessions: Option<usize>,
    pub session_ttl_minutes: Option<u32>,
    pub gemini: GeminiConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: None,
            base_url: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `GEMINI_API_KEY` (falling back to `GOOGLE_API_KEY`), `GEMINI_MODEL`
    /// and `GEMINI_BASE_URL`.
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .or_else(|| env::var("GOOGLE_API_KEY").ok());
        let model = env::var("GEMINI_MODEL").ok();
        let base_url = env::var("GEMINI_BASE_URL").ok();

        GeminiConfig {
            api_key,
            model,
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The API key, or a `ConfigError` when it is missing or blank.
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ForgeError::ConfigError(
                "GEMINI_API_KEY not found. Please configure it.".into(),
            )),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            port: None,
            max_upload_mb: None,
            max_sessions: None,
            session_ttl_minutes: None,
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let host = env::var("HOST").ok();
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let max_upload_mb = env::var("MAX_UPLOAD_MB")
            .ok()
            .and_then(|size| size.parse().ok());
        let max_sessions = env::var("MAX_SESSIONS")
            .ok()
            .and_then(|count| count.parse().ok());
        let session_ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|minutes| minutes.parse().ok());

        Config {
            host,
            port,
            max_upload_mb,
            max_sessions,
            session_ttl_minutes,
            gemini: GeminiConfig::from_env(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_max_upload_mb(mut self, size: usize) -> Self {
        self.max_upload_mb = Some(size);
        self
    }

    pub fn with_session_limits(mut self, max_sessions: usize, ttl_minutes: u32) -> Self {
        self.max_sessions = Some(max_sessions);
        self.session_ttl_minutes = Some(ttl_minutes);
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(8080)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb
            .unwrap_or(20)
            .saturating_mul(1024 * 1024)
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions.unwrap_or(DEFAULT_MAX_SESSIONS)
    }

    pub fn session_ttl_minutes(&self) -> u32 {
        self.session_ttl_minutes.unwrap_or(DEFAULT_IDLE_TTL_MINUTES)
    }

    /// Fails with `ConfigError` when the service key is absent.
    pub fn validate(&self) -> Result<()> {
        self.gemini.api_key().map(|_| ())
    }
}

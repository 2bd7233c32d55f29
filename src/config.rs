//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix, nested keys separated by `__`)
//! - Deployment-platform variables (HOST, PORT, OPENAI_API_KEY, ELEVENLABS_API_KEY, CORS_ORIGINS)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Deployment-platform variables
//! 2. Environment variables (APP_SESSION__MAX_CONCURRENT_SESSIONS, APP_SERVER__PORT, etc.)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub cors: CorsConfig,
    pub pipeline: PipelineConfig,
    pub openai: OpenAiConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub uploads: UploadConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Session store limits.
///
/// ## Fields:
/// - `max_concurrent_sessions`: ceiling on PENDING + ACTIVE sessions enforced by `create`
/// - `max_session_duration_secs`: sessions older than this (since activation) are swept
/// - `cleanup_interval_secs`: how often the background sweep runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub max_concurrent_sessions: usize,
    pub max_session_duration_secs: u64,
    pub cleanup_interval_secs: u64,
}

/// Cross-origin allowlist for the HTTP layer. `"*"` allows any origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Turn pipeline tuning.
///
/// ## Fields:
/// - `request_timeout_secs`: upper bound on every transcription/generation/synthesis call
/// - `history_window`: how many recent history entries are sent as generation context
/// - `reply_max_tokens`: token budget for replies on the duplex voice path
/// - `message_max_tokens`: token budget for replies on the plain HTTP message path
/// - `feedback_max_tokens`: token budget for the end-of-session evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub request_timeout_secs: u64,
    pub history_window: usize,
    pub reply_max_tokens: u32,
    pub message_max_tokens: u32,
    pub feedback_max_tokens: u32,
}

/// OpenAI chat completion and transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub feedback_temperature: f32,
}

/// ElevenLabs speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

/// Upload limits for CV documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_document_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            session: SessionConfig {
                max_concurrent_sessions: 10,
                max_session_duration_secs: 3600, // 1 hour
                cleanup_interval_secs: 60,
            },
            cors: CorsConfig {
                allowed_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                    "http://localhost:8080".to_string(),
                ],
            },
            pipeline: PipelineConfig {
                request_timeout_secs: 30,
                history_window: 10,
                reply_max_tokens: 200,
                message_max_tokens: 150,
                feedback_max_tokens: 500,
            },
            openai: OpenAiConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                chat_model: "gpt-4o-mini".to_string(),
                transcription_model: "whisper-1".to_string(),
                temperature: 0.7,
                presence_penalty: 0.6,
                frequency_penalty: 0.3,
                feedback_temperature: 0.3,
            },
            elevenlabs: ElevenLabsConfig {
                api_key: None,
                base_url: "https://api.elevenlabs.io/v1".to_string(),
                model_id: "eleven_monolingual_v1".to_string(),
                stability: 0.71,
                similarity_boost: 0.5,
                style: 0.0,
                use_speaker_boost: true,
            },
            uploads: UploadConfig {
                max_document_bytes: 10 * 1024 * 1024, // 10MB
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__PORT=3000`: Override server port
    /// - `APP_SESSION__MAX_CONCURRENT_SESSIONS=25`: Raise the session ceiling
    /// - `OPENAI_API_KEY=sk-...`: Credentials for generation and transcription
    /// - `CORS_ORIGINS=https://a.example,https://b.example`: Replace the CORS allowlist
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            settings = settings.set_override("openai.api_key", key)?;
        }

        if let Ok(key) = env::var("ELEVENLABS_API_KEY") {
            settings = settings.set_override("elevenlabs.api_key", key)?;
        }

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            settings = settings.set_override("cors.allowed_origins", parse_origin_list(&origins))?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// Missing API keys are not an error: the affected collaborator simply fails
    /// every call and the pipeline substitutes its degraded output.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.session.max_concurrent_sessions == 0 {
            return Err(anyhow::anyhow!("Max concurrent sessions must be greater than 0"));
        }

        if self.session.max_session_duration_secs == 0 {
            return Err(anyhow::anyhow!("Max session duration must be greater than 0"));
        }

        if self.session.cleanup_interval_secs == 0 {
            return Err(anyhow::anyhow!("Cleanup interval must be greater than 0"));
        }

        if self.pipeline.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Collaborator request timeout must be greater than 0"));
        }

        if self.pipeline.history_window == 0 {
            return Err(anyhow::anyhow!("History window must be greater than 0"));
        }

        if self.pipeline.reply_max_tokens == 0
            || self.pipeline.message_max_tokens == 0
            || self.pipeline.feedback_max_tokens == 0
        {
            return Err(anyhow::anyhow!("Token limits must be greater than 0"));
        }

        if self.uploads.max_document_bytes == 0 {
            return Err(anyhow::anyhow!("Max document size must be greater than 0"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.request_timeout_secs)
    }

    pub fn max_session_duration(&self) -> Duration {
        Duration::from_secs(self.session.max_session_duration_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.session.cleanup_interval_secs)
    }

    /// Whether the CORS allowlist lets every origin through.
    pub fn allows_any_origin(&self) -> bool {
        self.cors.allowed_origins.iter().any(|origin| origin == "*")
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

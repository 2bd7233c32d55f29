//! Wire events of the voice connection.
//!
//! Every frame is a JSON object with a `type` field. Inbound parsing is lenient about the
//! type tag so that an unrecognised type can be answered with an `unknown_type` error
//! instead of being treated as malformed JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Inbound client event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Base64 encoded candidate audio
    AudioChunk { audio_data: String },
    TextMessage { content: String },
    Ping,
    /// Any other `type` value, including a missing one
    Unknown(String),
}

impl ClientEvent {
    /// Parse a text frame. Only invalid JSON is an error.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let event = match value.get("type").and_then(Value::as_str) {
            Some("audio_chunk") => ClientEvent::AudioChunk {
                audio_data: field("audio_data"),
            },
            Some("text_message") => ClientEvent::TextMessage {
                content: field("content"),
            },
            Some("ping") => ClientEvent::Ping,
            Some(other) => ClientEvent::Unknown(other.to_string()),
            None => ClientEvent::Unknown(String::new()),
        };
        Ok(event)
    }
}

/// Progress stage reported in `status` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    Transcribing,
    Thinking,
    GeneratingVoice,
    /// The session was stopped while the connection was open
    Completed,
}

impl TurnStage {
    pub fn message(&self) -> &'static str {
        match self {
            TurnStage::Transcribing => "Processing audio...",
            TurnStage::Thinking => "Generating response...",
            TurnStage::GeneratingVoice => "Converting to speech...",
            TurnStage::Completed => "Interview completed",
        }
    }
}

/// Machine-readable code carried by `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UnknownType,
    InvalidJson,
    UnsupportedFrame,
    AudioDecodeFailed,
    VoiceFailed,
    SessionNotActive,
    SessionNotFound,
}

/// Outbound server event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Connection {
        status: &'static str,
        message: &'static str,
        session_id: String,
    },
    Status {
        status: TurnStage,
        message: &'static str,
    },
    Transcription {
        text: String,
        timestamp: DateTime<Utc>,
    },
    TextResponse {
        text: String,
        question_count: u32,
        timestamp: DateTime<Utc>,
    },
    AudioResponse {
        /// Base64 encoded audio
        audio_data: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    Pong {
        timestamp: DateTime<Utc>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerEvent {
    pub fn connected(session_id: &str) -> Self {
        ServerEvent::Connection {
            status: "connected",
            message: "Voice connection established",
            session_id: session_id.to_string(),
        }
    }

    pub fn status(stage: TurnStage) -> Self {
        ServerEvent::Status {
            status: stage,
            message: stage.message(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code,
            message: message.into(),
        }
    }

    pub fn pong() -> Self {
        ServerEvent::Pong { timestamp: Utc::now() }
    }
}

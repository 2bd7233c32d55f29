//! # Turn Pipeline Collaborators
//!
//! The three remote stages every interview turn can go through:
//! - **Transcriber**: candidate audio → text
//! - **ReplyGenerator**: prompt + recent history → interviewer text
//! - **SpeechSynthesizer**: interviewer text + voice → audio
//!
//! Implementations return `CollaboratorError` freely. Callers on the turn path never
//! see those errors: they go through [`Pipeline`], which bounds every call with a
//! timeout and substitutes the stage's degraded output on any failure.
//!
//! ## Degraded outputs:
//! | Stage      | Fallback                                  |
//! |------------|-------------------------------------------|
//! | transcribe | [`TRANSCRIPTION_FALLBACK`] sentinel text  |
//! | generate   | [`REPLY_FALLBACK`] apology text           |
//! | synthesize | empty byte sequence                       |

pub mod elevenlabs;
pub mod openai;

use crate::interview::models::{ConversationMessage, ConversationRole};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const TRANSCRIPTION_FALLBACK: &str =
    "Sorry, I couldn't understand that. Could you please speak clearly?";

pub const REPLY_FALLBACK: &str =
    "I apologize, but I'm experiencing some technical difficulties. Could you please repeat your response?";

/// Failure of a remote collaborator call.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{service} credentials are not configured")]
    MissingCredentials { service: &'static str },

    #[error("{service} request failed: {message}")]
    Transport { service: &'static str, message: String },

    #[error("{service} returned HTTP {status}: {body}")]
    Http { service: &'static str, status: u16, body: String },

    #[error("{service} response could not be decoded: {message}")]
    Decode { service: &'static str, message: String },

    #[error("{service} call timed out after {seconds}s")]
    Timeout { service: &'static str, seconds: u64 },
}

/// Lazy sequence of audio chunks. Dropping it cancels the underlying remote call.
pub type AudioStream = BoxStream<'static, Result<Vec<u8>, CollaboratorError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Sampling profile. Implementations map each to concrete model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Natural, varied interviewer dialogue
    Conversational,
    /// Low-temperature structured output (feedback JSON)
    Analytical,
}

/// One call to the language model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub messages: Vec<ChatTurn>,
    pub max_tokens: u32,
    pub sampling: Sampling,
}

impl GenerationRequest {
    /// System prompt followed by the history window. Interviewer turns are the
    /// model's own (`assistant`), candidate turns are `user`.
    pub fn interview(
        system_prompt: String,
        history: &[ConversationMessage],
        max_tokens: u32,
    ) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatTurn {
            role: ChatRole::System,
            content: system_prompt,
        });
        messages.extend(history.iter().map(|message| ChatTurn {
            role: match message.role {
                ConversationRole::Interviewer => ChatRole::Assistant,
                ConversationRole::Candidate => ChatRole::User,
            },
            content: message.content.clone(),
        }));

        Self {
            messages,
            max_tokens,
            sampling: Sampling::Conversational,
        }
    }

    /// A single user prompt asking for structured output.
    pub fn analysis(prompt: String, max_tokens: u32) -> Self {
        Self {
            messages: vec![ChatTurn {
                role: ChatRole::User,
                content: prompt,
            }],
            max_tokens,
            sampling: Sampling::Analytical,
        }
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Start synthesis and hand back the audio as it arrives.
    async fn stream(&self, text: &str, voice_id: &str) -> Result<AudioStream, CollaboratorError>;

    /// Buffered synthesis: drain [`SpeechSynthesizer::stream`] to the end.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, CollaboratorError> {
        let mut stream = self.stream(text, voice_id).await?;
        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk?);
        }
        Ok(audio)
    }
}

/// Run `call` under `timeout`, reporting expiry as a `Timeout` error for `service`.
pub async fn with_timeout<T, F>(
    service: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout {
            service,
            seconds: timeout.as_secs(),
        }),
    }
}

/// Fail-open front for the three collaborators.
///
/// Every method here returns a usable value. A single flaky remote call must
/// never abort a turn.
#[derive(Clone)]
pub struct Pipeline {
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn ReplyGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn ReplyGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        timeout: Duration,
    ) -> Self {
        Self {
            transcriber,
            generator,
            synthesizer,
            timeout,
        }
    }

    pub async fn transcribe(&self, audio: Vec<u8>) -> String {
        let bytes = audio.len();
        let call = self.transcriber.transcribe(audio);
        match with_timeout("transcription", self.timeout, call).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!(
                    error = %err,
                    audio_bytes = bytes,
                    "Transcription failed, using sentinel transcript"
                );
                TRANSCRIPTION_FALLBACK.to_string()
            }
        }
    }

    pub async fn generate_reply(&self, request: GenerationRequest) -> String {
        match with_timeout("generation", self.timeout, self.generator.generate(request)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Language model returned an empty reply, using apology text");
                REPLY_FALLBACK.to_string()
            }
            Err(err) => {
                warn!(error = %err, "Reply generation failed, using apology text");
                REPLY_FALLBACK.to_string()
            }
        }
    }

    /// Empty output means synthesis failed.
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Vec<u8> {
        let call = self.synthesizer.synthesize(text, voice_id);
        match with_timeout("synthesis", self.timeout, call).await {
            Ok(audio) => audio,
            Err(err) => {
                warn!(error = %err, voice_id, "Speech synthesis failed");
                Vec::new()
            }
        }
    }
}

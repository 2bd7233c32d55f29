//! # Interview Domain
//!
//! Session state, the persona catalog, prompt construction, end-of-session feedback and
//! the caller-facing [`service::InterviewService`] used by the HTTP handlers.

pub mod feedback;
pub mod models;
pub mod persona;
pub mod prompt;
pub mod service;
pub mod session;

/// In-crate fakes for the remote collaborators. No test in this crate touches the network.
#[cfg(test)]
pub(crate) mod test_support {
    use super::models::{InterviewConfig, InterviewLength, InterviewType, PersonaId};
    use crate::pipeline::{
        AudioStream, CollaboratorError, GenerationRequest, ReplyGenerator, SpeechSynthesizer,
        Transcriber,
    };
    use async_trait::async_trait;
    use futures_util::{stream, StreamExt};
    use std::sync::Mutex;
    use std::time::Duration;

    pub fn sample_config() -> InterviewConfig {
        InterviewConfig {
            persona_id: PersonaId::HrFriendly,
            interview_type: InterviewType::FirstRound,
            interview_length: InterviewLength::Quick,
            job_description: "Backend engineer working on streaming services".to_string(),
            cv_text: None,
        }
    }

    fn fake_failure() -> CollaboratorError {
        CollaboratorError::Transport {
            service: "fake",
            message: "connection refused".to_string(),
        }
    }

    pub struct FakeTranscriber {
        reply: Option<String>,
        delay: Option<Duration>,
    }

    impl FakeTranscriber {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                delay: None,
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                delay: None,
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio: Vec<u8>) -> Result<String, CollaboratorError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone().ok_or_else(fake_failure)
        }
    }

    /// Replies with a fixed text and records every request it receives.
    pub struct FakeGenerator {
        reply: Option<String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeGenerator {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyGenerator for FakeGenerator {
        async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone().ok_or_else(fake_failure)
        }
    }

    /// Streams a fixed clip in two chunks, and records the voice ids it was asked for.
    pub struct FakeSynthesizer {
        audio: Option<Vec<u8>>,
        voices: Mutex<Vec<String>>,
    }

    impl FakeSynthesizer {
        pub fn returning(audio: Vec<u8>) -> Self {
            Self {
                audio: Some(audio),
                voices: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                audio: None,
                voices: Mutex::new(Vec::new()),
            }
        }

        pub fn voices(&self) -> Vec<String> {
            self.voices.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn stream(
            &self,
            _text: &str,
            voice_id: &str,
        ) -> Result<AudioStream, CollaboratorError> {
            self.voices.lock().unwrap().push(voice_id.to_string());
            let audio = self.audio.clone().ok_or_else(fake_failure)?;
            let middle = audio.len() / 2;
            let chunks = vec![Ok(audio[..middle].to_vec()), Ok(audio[middle..].to_vec())];
            Ok(stream::iter(chunks).boxed())
        }
    }
}

//! ElevenLabs text-to-speech client.
//!
//! Audio is always fetched from the streaming endpoint. Callers that want the whole
//! clip use the buffered `synthesize` from [`SpeechSynthesizer`], which drains the stream.

use super::{AudioStream, CollaboratorError, SpeechSynthesizer};
use crate::config::ElevenLabsConfig;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;

const SERVICE: &str = "elevenlabs";
const XI_API_KEY_HEADER: &str = "xi-api-key";
const AUDIO_MPEG: &str = "audio/mpeg";

#[derive(Debug, Clone, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Debug, Serialize)]
struct TextToSpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

#[derive(Clone)]
pub struct ElevenLabsClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

impl ElevenLabsClient {
    pub fn new(config: &ElevenLabsConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_id: config.model_id.clone(),
            voice_settings: VoiceSettings {
                stability: config.stability,
                similarity_boost: config.similarity_boost,
                style: config.style,
                use_speaker_boost: config.use_speaker_boost,
            },
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn stream_url(&self, voice_id: &str) -> String {
        format!("{}/text-to-speech/{}/stream", self.base_url, voice_id)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn stream(&self, text: &str, voice_id: &str) -> Result<AudioStream, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CollaboratorError::MissingCredentials { service: SERVICE })?;

        let body = TextToSpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: &self.voice_settings,
        };

        let response = self
            .http
            .post(self.stream_url(voice_id))
            .header(XI_API_KEY_HEADER, api_key)
            .header(ACCEPT, AUDIO_MPEG)
            .json(&body)
            .send()
            .await
            .map_err(|err| CollaboratorError::Transport {
                service: SERVICE,
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CollaboratorError::Http {
                service: SERVICE,
                status,
                body,
            });
        }

        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| CollaboratorError::Transport {
                    service: SERVICE,
                    message: err.to_string(),
                })
        });

        Ok(chunks.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_stream_url() {
        let mut config = AppConfig::default().elevenlabs;
        config.base_url = "https://tts.test/v1/".to_string();
        let client = ElevenLabsClient::new(&config).unwrap();
        assert_eq!(
            client.stream_url("21m00Tcm4TlvDq8ikWAM"),
            "https://tts.test/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM/stream"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let client = ElevenLabsClient::new(&AppConfig::default().elevenlabs).unwrap();
        let body = TextToSpeechRequest {
            text: "Hello there",
            model_id: &client.model_id,
            voice_settings: &client.voice_settings,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model_id"], "eleven_monolingual_v1");
        assert_eq!(json["voice_settings"]["use_speaker_boost"], true);
    }

    #[tokio::test]
    async fn test_missing_key_yields_error() {
        let client = ElevenLabsClient::new(&AppConfig::default().elevenlabs).unwrap();
        assert!(!client.is_configured());
        let err = client.synthesize("hi", "voice").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::MissingCredentials { .. }));
    }
}

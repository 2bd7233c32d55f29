//! OpenAI REST client: chat completions for interviewer replies and feedback,
//! audio transcriptions for candidate speech.

use super::{ChatTurn, CollaboratorError, GenerationRequest, ReplyGenerator, Sampling, Transcriber};
use crate::config::OpenAiConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "openai";
const USER_AGENT: &str = concat!("interview-voice-backend/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    chat_model: String,
    transcription_model: String,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    feedback_temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> anyhow::Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            transcription_model: config.transcription_model.clone(),
            temperature: config.temperature,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
            feedback_temperature: config.feedback_temperature,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, CollaboratorError> {
        self.api_key
            .as_deref()
            .ok_or(CollaboratorError::MissingCredentials { service: SERVICE })
    }

    fn chat_body<'a>(&'a self, request: &'a GenerationRequest) -> ChatCompletionRequest<'a> {
        let (temperature, presence_penalty, frequency_penalty) = match request.sampling {
            Sampling::Conversational => (
                self.temperature,
                Some(self.presence_penalty),
                Some(self.frequency_penalty),
            ),
            Sampling::Analytical => (self.feedback_temperature, None, None),
        };

        ChatCompletionRequest {
            model: &self.chat_model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature,
            presence_penalty,
            frequency_penalty,
        }
    }
}

fn transport_error(err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transport {
        service: SERVICE,
        message: err.to_string(),
    }
}

async fn ensure_success(response: Response) -> Result<Response, CollaboratorError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(CollaboratorError::Http {
        service: SERVICE,
        status,
        body,
    })
}

fn first_choice_text(parsed: ChatCompletionResponse) -> Result<String, CollaboratorError> {
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| CollaboratorError::Decode {
            service: SERVICE,
            message: "response contained no message content".to_string(),
        })
}

#[async_trait]
impl ReplyGenerator for OpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
        let api_key = self.api_key()?;
        let body = self.chat_body(&request);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: ChatCompletionResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| CollaboratorError::Decode {
                service: SERVICE,
                message: err.to_string(),
            })?;

        first_choice_text(parsed)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, CollaboratorError> {
        let api_key = self.api_key()?;

        let file = Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(transport_error)?;
        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .text("response_format", "text")
            .part("file", file);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let text = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(|err| CollaboratorError::Decode {
                service: SERVICE,
                message: err.to_string(),
            })?;

        Ok(text.trim().to_string())
    }
}

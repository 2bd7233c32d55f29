//! # Interview Turn Orchestrator
//!
//! Drives candidate input through the turn pipeline and reports progress as
//! [`ServerEvent`]s.
//!
//! ## Turn:
//! 1. Append the candidate message (session must be ACTIVE)
//! 2. `status: thinking`
//! 3. Build the system prompt and generate a reply from the recent history window
//! 4. Append the interviewer message
//! 5. `text_response`
//! 6. `status: generating_voice`, synthesize, then `audio_response` or a `voice_failed` error
//!
//! Collaborator failures degrade inside [`Pipeline`] and never abort a turn. A failed
//! send means the peer is gone: the rest of the turn is abandoned and the connection's
//! worker stops.

use super::events::{ClientEvent, ErrorCode, ServerEvent, TurnStage};
use super::registry::{ConnectionClosed, ConnectionRegistry, DiscardSink, EventSink};
use crate::error::{AppError, AppResult};
use crate::interview::models::{
    ConversationMessage, MessageReplyResponse, PersonaId, SessionStatus,
};
use crate::interview::persona::PersonaCatalog;
use crate::interview::prompt::PromptBuilder;
use crate::interview::session::SessionManager;
use crate::pipeline::{GenerationRequest, Pipeline};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const VOICE_FAILED_MESSAGE: &str =
    "Failed to generate voice response, but text response is available";

/// Why a turn did not produce a reply.
#[derive(Debug)]
enum TurnError {
    /// The session cannot take a turn right now
    Rejected(AppError),
    Closed,
}

impl From<ConnectionClosed> for TurnError {
    fn from(_: ConnectionClosed) -> Self {
        TurnError::Closed
    }
}

#[derive(Debug)]
struct TurnReply {
    text: String,
    question_count: u32,
    session_status: SessionStatus,
    persona_id: PersonaId,
}

/// Limits applied to every turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnLimits {
    pub history_window: usize,
    /// Reply budget for voice turns
    pub reply_max_tokens: u32,
    /// Reply budget for turns submitted over HTTP
    pub message_max_tokens: u32,
}

pub struct InterviewOrchestrator {
    sessions: Arc<SessionManager>,
    connections: Arc<ConnectionRegistry>,
    pipeline: Pipeline,
    prompts: Arc<dyn PromptBuilder>,
    personas: Arc<PersonaCatalog>,
    limits: TurnLimits,
}

impl InterviewOrchestrator {
    pub fn new(
        sessions: Arc<SessionManager>,
        connections: Arc<ConnectionRegistry>,
        pipeline: Pipeline,
        prompts: Arc<dyn PromptBuilder>,
        personas: Arc<PersonaCatalog>,
        limits: TurnLimits,
    ) -> Self {
        Self {
            sessions,
            connections,
            pipeline,
            prompts,
            personas,
            limits,
        }
    }

    /// Connection gate: the session must exist and be ACTIVE.
    pub fn authorize(&self, session_id: &str) -> AppResult<()> {
        match self.sessions.get(session_id) {
            None => Err(AppError::NotFound("Session not found".to_string())),
            Some(session) if session.status() != SessionStatus::Active => {
                Err(AppError::InvalidState("Session not active".to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Register a live connection and return its id.
    pub fn register_connection(&self, session_id: &str, sink: Arc<dyn EventSink>) -> Uuid {
        let connection_id = Uuid::new_v4();
        self.connections.register(session_id, connection_id, sink);
        connection_id
    }

    /// Per-connection worker. Acknowledges the connection, then handles events strictly
    /// in arrival order until the inbound channel closes or the peer goes away.
    pub async fn serve(
        &self,
        session_id: String,
        connection_id: Uuid,
        mut events: mpsc::UnboundedReceiver<ClientEvent>,
        sink: Arc<dyn EventSink>,
    ) {
        if sink.send(ServerEvent::connected(&session_id)).await.is_ok() {
            while let Some(event) = events.recv().await {
                if self.handle_event(&session_id, event, sink.as_ref()).await.is_err() {
                    info!(
                        session_id = %session_id,
                        %connection_id,
                        "Voice peer went away mid-turn"
                    );
                    break;
                }
            }
        }

        self.connections.deregister(&session_id, connection_id);
        debug!(session_id = %session_id, %connection_id, "Voice worker stopped");
    }

    /// Handle one inbound event. `Err` means the connection is closed.
    pub async fn handle_event(
        &self,
        session_id: &str,
        event: ClientEvent,
        sink: &dyn EventSink,
    ) -> Result<(), ConnectionClosed> {
        match event {
            ClientEvent::Ping => sink.send(ServerEvent::pong()).await,
            ClientEvent::Unknown(kind) => {
                sink.send(ServerEvent::error(
                    ErrorCode::UnknownType,
                    format!("Unknown message type: {}", kind),
                ))
                .await
            }
            ClientEvent::TextMessage { content } => {
                self.voice_turn(session_id, content, sink).await
            }
            ClientEvent::AudioChunk { audio_data } => {
                self.audio_turn(session_id, &audio_data, sink).await
            }
        }
    }

    async fn audio_turn(
        &self,
        session_id: &str,
        audio_data: &str,
        sink: &dyn EventSink,
    ) -> Result<(), ConnectionClosed> {
        // Refuse before paying for a transcription.
        if let Err(err) = self.authorize(session_id) {
            return sink.send(rejection_event(&err)).await;
        }

        let audio = match BASE64.decode(audio_data.trim()) {
            Ok(audio) => audio,
            Err(err) => {
                warn!(session_id, error = %err, "Audio chunk is not valid base64");
                return sink
                    .send(ServerEvent::error(
                        ErrorCode::AudioDecodeFailed,
                        "Failed to process audio input",
                    ))
                    .await;
            }
        };

        sink.send(ServerEvent::status(TurnStage::Transcribing)).await?;
        let text = self.pipeline.transcribe(audio).await;
        sink.send(ServerEvent::Transcription {
            text: text.clone(),
            timestamp: Utc::now(),
        })
        .await?;

        self.voice_turn(session_id, text, sink).await
    }

    async fn voice_turn(
        &self,
        session_id: &str,
        content: String,
        sink: &dyn EventSink,
    ) -> Result<(), ConnectionClosed> {
        let reply = match self
            .reply_to_candidate(session_id, content, sink, self.limits.reply_max_tokens)
            .await
        {
            Ok(reply) => reply,
            Err(TurnError::Rejected(err)) => return sink.send(rejection_event(&err)).await,
            Err(TurnError::Closed) => return Err(ConnectionClosed),
        };

        sink.send(ServerEvent::status(TurnStage::GeneratingVoice)).await?;
        let voice_id = self.personas.voice_for(reply.persona_id);
        let audio = self.pipeline.synthesize(&reply.text, voice_id).await;

        if audio.is_empty() {
            sink.send(ServerEvent::error(ErrorCode::VoiceFailed, VOICE_FAILED_MESSAGE))
                .await
        } else {
            sink.send(ServerEvent::AudioResponse {
                audio_data: BASE64.encode(&audio),
                text: reply.text,
                timestamp: Utc::now(),
            })
            .await
        }
    }

    /// One text-only turn for the HTTP message endpoint.
    pub async fn submit_message(
        &self,
        session_id: &str,
        content: String,
    ) -> AppResult<MessageReplyResponse> {
        match self
            .reply_to_candidate(session_id, content, &DiscardSink, self.limits.message_max_tokens)
            .await
        {
            Ok(reply) => Ok(MessageReplyResponse {
                response: reply.text,
                question_count: reply.question_count,
                session_status: reply.session_status,
            }),
            Err(TurnError::Rejected(err)) => Err(err),
            Err(TurnError::Closed) => Err(AppError::Internal("discard sink closed".to_string())),
        }
    }

    /// Steps 1 to 5 of a turn, shared by the voice and HTTP paths.
    ///
    /// Both appends go through `append_if_active`, so a session stopped while the
    /// reply was being generated keeps its history and no `text_response` is sent.
    async fn reply_to_candidate(
        &self,
        session_id: &str,
        content: String,
        sink: &dyn EventSink,
        max_tokens: u32,
    ) -> Result<TurnReply, TurnError> {
        let session = self
            .sessions
            .append_if_active(session_id, ConversationMessage::candidate(content))
            .map_err(TurnError::Rejected)?;
        sink.send(ServerEvent::status(TurnStage::Thinking)).await?;

        let prompt = self.prompts.build_system_prompt(&session);
        let request = GenerationRequest::interview(
            prompt,
            session.recent_history(self.limits.history_window),
            max_tokens,
        );
        let text = self.pipeline.generate_reply(request).await;

        let updated = self
            .sessions
            .append_if_active(session_id, ConversationMessage::interviewer(text.clone()))
            .map_err(|err| {
                info!(session_id, error = %err, "Session ended while the reply was generated");
                TurnError::Rejected(err)
            })?;

        sink.send(ServerEvent::TextResponse {
            text: text.clone(),
            question_count: updated.question_count(),
            timestamp: Utc::now(),
        })
        .await?;

        debug!(
            session_id,
            question_count = updated.question_count(),
            "Interviewer reply recorded"
        );

        Ok(TurnReply {
            text,
            question_count: updated.question_count(),
            session_status: updated.status(),
            persona_id: updated.config().persona_id,
        })
    }
}

fn rejection_event(err: &AppError) -> ServerEvent {
    let code = match err {
        AppError::NotFound(_) => ErrorCode::SessionNotFound,
        _ => ErrorCode::SessionNotActive,
    };
    ServerEvent::error(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::ConversationRole;
    use crate::interview::prompt::InterviewPromptBuilder;
    use crate::interview::test_support::{
        sample_config, FakeGenerator, FakeSynthesizer, FakeTranscriber,
    };
    use crate::pipeline::TRANSCRIPTION_FALLBACK;
    use crate::voice::registry::test_support::{drain, ChannelSink};
    use std::time::Duration;

    struct Harness {
        orchestrator: Arc<InterviewOrchestrator>,
        sessions: Arc<SessionManager>,
        connections: Arc<ConnectionRegistry>,
        generator: Arc<FakeGenerator>,
        synthesizer: Arc<FakeSynthesizer>,
        session_id: String,
    }

    fn harness(transcriber: FakeTranscriber, synthesizer: FakeSynthesizer) -> Harness {
        let sessions = Arc::new(SessionManager::new(5, Duration::from_secs(3600)));
        let connections = Arc::new(ConnectionRegistry::new());
        let personas = Arc::new(PersonaCatalog::new());
        let generator = Arc::new(FakeGenerator::replying("What drew you to this role?"));
        let synthesizer = Arc::new(synthesizer);
        let pipeline = Pipeline::new(
            Arc::new(transcriber),
            generator.clone(),
            synthesizer.clone(),
            Duration::from_secs(1),
        );
        let orchestrator = Arc::new(InterviewOrchestrator::new(
            sessions.clone(),
            connections.clone(),
            pipeline,
            Arc::new(InterviewPromptBuilder::new(personas.clone())),
            personas,
            TurnLimits {
                history_window: 10,
                reply_max_tokens: 200,
                message_max_tokens: 150,
            },
        ));

        let session_id = sessions.create(sample_config()).unwrap();
        sessions.activate(&session_id);

        Harness {
            orchestrator,
            sessions,
            connections,
            generator,
            synthesizer,
            session_id,
        }
    }

    fn default_harness() -> Harness {
        harness(
            FakeTranscriber::replying("I have five years of experience."),
            FakeSynthesizer::returning(vec![1, 2, 3, 4]),
        )
    }

    fn text(content: &str) -> ClientEvent {
        ClientEvent::TextMessage {
            content: content.to_string(),
        }
    }

    fn kinds(events: &[ServerEvent]) -> Vec<String> {
        events
            .iter()
            .map(|event| {
                let json = serde_json::to_value(event).unwrap();
                match json.get("status").and_then(|s| s.as_str()) {
                    Some(status) if json["type"] == "status" => format!("status:{}", status),
                    _ => json["type"].as_str().unwrap().to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_authorize() {
        let h = default_harness();
        assert!(h.orchestrator.authorize(&h.session_id).is_ok());
        assert!(matches!(h.orchestrator.authorize("missing"), Err(AppError::NotFound(_))));

        let pending = h.sessions.create(sample_config()).unwrap();
        assert!(matches!(
            h.orchestrator.authorize(&pending),
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_text_turn_emits_full_sequence() {
        let h = default_harness();
        let (sink, mut rx) = ChannelSink::new();

        h.orchestrator
            .handle_event(&h.session_id, text("Hello"), sink.as_ref())
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            kinds(&events),
            vec!["status:thinking", "text_response", "status:generating_voice", "audio_response"]
        );
        match &events[1] {
            ServerEvent::TextResponse { text, question_count, .. } => {
                assert_eq!(text, "What drew you to this role?");
                assert_eq!(*question_count, 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[3] {
            ServerEvent::AudioResponse { audio_data, .. } => {
                assert_eq!(BASE64.decode(audio_data).unwrap(), vec![1, 2, 3, 4]);
            }
            other => panic!("unexpected event {:?}", other),
        }

        let session = h.sessions.get(&h.session_id).unwrap();
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, ConversationRole::Candidate);
        assert_eq!(session.history()[1].role, ConversationRole::Interviewer);
        assert_eq!(session.question_count(), 1);
        assert_eq!(h.synthesizer.voices(), vec!["21m00Tcm4TlvDq8ikWAM".to_string()]);
    }

    #[tokio::test]
    async fn test_audio_turn_transcribes_first() {
        let h = default_harness();
        let (sink, mut rx) = ChannelSink::new();
        let event = ClientEvent::AudioChunk {
            audio_data: BASE64.encode([0u8, 1, 2]),
        };

        h.orchestrator
            .handle_event(&h.session_id, event, sink.as_ref())
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            &kinds(&events)[..3],
            &["status:transcribing", "transcription", "status:thinking"]
        );
        let session = h.sessions.get(&h.session_id).unwrap();
        assert_eq!(session.history()[0].content, "I have five years of experience.");
    }

    #[tokio::test]
    async fn test_transcription_failure_still_replies() {
        let h = harness(FakeTranscriber::failing(), FakeSynthesizer::returning(vec![9]));
        let (sink, mut rx) = ChannelSink::new();
        let event = ClientEvent::AudioChunk {
            audio_data: BASE64.encode([7u8; 16]),
        };

        h.orchestrator
            .handle_event(&h.session_id, event, sink.as_ref())
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert!(kinds(&events).contains(&"text_response".to_string()));
        assert!(events.iter().any(|e| matches!(
            e,
            ServerEvent::Transcription { text, .. } if text == TRANSCRIPTION_FALLBACK
        )));
        let session = h.sessions.get(&h.session_id).unwrap();
        assert_eq!(session.history()[0].content, TRANSCRIPTION_FALLBACK);
    }

    #[tokio::test]
    async fn test_empty_synthesis_is_non_fatal() {
        let h = harness(FakeTranscriber::replying("x"), FakeSynthesizer::failing());
        let (sink, mut rx) = ChannelSink::new();

        h.orchestrator
            .handle_event(&h.session_id, text("Hello"), sink.as_ref())
            .await
            .unwrap();
        let events = drain(&mut rx);
        assert_eq!(
            kinds(&events),
            vec!["status:thinking", "text_response", "status:generating_voice", "error"]
        );
        assert!(matches!(
            events[3],
            ServerEvent::Error { code: ErrorCode::VoiceFailed, .. }
        ));

        // The connection keeps serving events.
        h.orchestrator
            .handle_event(&h.session_id, ClientEvent::Ping, sink.as_ref())
            .await
            .unwrap();
        assert_eq!(kinds(&drain(&mut rx)), vec!["pong"]);
    }

    #[tokio::test]
    async fn test_completed_session_rejects_turn() {
        let h = default_harness();
        h.sessions.complete(&h.session_id);
        let (sink, mut rx) = ChannelSink::new();

        h.orchestrator
            .handle_event(&h.session_id, text("Are you still there?"), sink.as_ref())
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ServerEvent::Error { code: ErrorCode::SessionNotActive, .. }
        ));
        assert!(h.sessions.get(&h.session_id).unwrap().history().is_empty());
        assert!(h.generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_rejects_audio() {
        let h = default_harness();
        h.sessions.delete(&h.session_id);
        let (sink, mut rx) = ChannelSink::new();
        let event = ClientEvent::AudioChunk {
            audio_data: BASE64.encode([1u8]),
        };

        h.orchestrator
            .handle_event(&h.session_id, event, sink.as_ref())
            .await
            .unwrap();
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [ServerEvent::Error { code: ErrorCode::SessionNotFound, .. }]
        ));
    }

    #[tokio::test]
    async fn test_unknown_type_and_bad_audio() {
        let h = default_harness();
        let (sink, mut rx) = ChannelSink::new();

        h.orchestrator
            .handle_event(&h.session_id, ClientEvent::Unknown("dance".to_string()), sink.as_ref())
            .await
            .unwrap();
        h.orchestrator
            .handle_event(
                &h.session_id,
                ClientEvent::AudioChunk {
                    audio_data: "%%% not base64 %%%".to_string(),
                },
                sink.as_ref(),
            )
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert!(matches!(
            &events[0],
            ServerEvent::Error { code: ErrorCode::UnknownType, message }
                if message.contains("dance")
        ));
        assert!(matches!(
            events[1],
            ServerEvent::Error { code: ErrorCode::AudioDecodeFailed, .. }
        ));
        assert_eq!(events.len(), 2);
        assert!(h.sessions.get(&h.session_id).unwrap().history().is_empty());
    }

    #[tokio::test]
    async fn test_generation_uses_bounded_window() {
        let h = default_harness();
        for i in 0..12 {
            h.sessions
                .append_message(&h.session_id, ConversationMessage::candidate(format!("m{}", i)));
        }
        let (sink, _rx) = ChannelSink::new();

        h.orchestrator
            .handle_event(&h.session_id, text("latest"), sink.as_ref())
            .await
            .unwrap();

        let request = &h.generator.requests()[0];
        assert_eq!(request.messages.len(), 11);
        assert_eq!(request.max_tokens, 200);
        assert_eq!(request.messages.last().unwrap().content, "latest");
    }

    #[tokio::test]
    async fn test_closed_sink_abandons_turn_after_candidate_append() {
        let h = default_harness();
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        let result = h
            .orchestrator
            .handle_event(&h.session_id, text("Hello"), sink.as_ref())
            .await;

        assert_eq!(result, Err(ConnectionClosed));
        let session = h.sessions.get(&h.session_id).unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.question_count(), 0);
        assert!(h.generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_closed_sink_abandons_turn_and_deregisters() {
        let h = default_harness();
        let (sink, rx) = ChannelSink::new();
        let connection_id = h.orchestrator.register_connection(&h.session_id, sink.clone());
        drop(rx);

        let (tx, events) = mpsc::unbounded_channel();
        tx.send(text("Hello")).unwrap();
        drop(tx);

        h.orchestrator
            .serve(h.session_id.clone(), connection_id, events, sink)
            .await;

        assert!(!h.connections.is_connected(&h.session_id));
        assert!(h.generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_serve_processes_in_order_then_deregisters() {
        let h = default_harness();
        let (sink, mut rx) = ChannelSink::new();
        let connection_id = h.orchestrator.register_connection(&h.session_id, sink.clone());

        let (tx, events) = mpsc::unbounded_channel();
        tx.send(ClientEvent::Ping).unwrap();
        tx.send(text("First answer")).unwrap();
        tx.send(text("Second answer")).unwrap();
        drop(tx);

        let orchestrator = h.orchestrator.clone();
        let session_id = h.session_id.clone();
        tokio::spawn(async move {
            orchestrator
                .serve(session_id, connection_id, events, sink)
                .await
        })
        .await
        .unwrap();

        let kinds = kinds(&drain(&mut rx));
        assert_eq!(kinds[0], "connection");
        assert_eq!(kinds[1], "pong");
        assert_eq!(kinds.iter().filter(|k| *k == "text_response").count(), 2);

        let session = h.sessions.get(&h.session_id).unwrap();
        let contents: Vec<_> = session.history().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[0], "First answer");
        assert_eq!(contents[2], "Second answer");
        assert_eq!(session.question_count(), 2);
        assert!(!h.connections.is_connected(&h.session_id));
    }

    #[tokio::test]
    async fn test_submit_message_over_http() {
        let h = default_harness();
        let reply = h
            .orchestrator
            .submit_message(&h.session_id, "Hello".to_string())
            .await
            .unwrap();

        assert_eq!(reply.response, "What drew you to this role?");
        assert_eq!(reply.question_count, 1);
        assert_eq!(reply.session_status, SessionStatus::Active);
        assert_eq!(h.generator.requests()[0].max_tokens, 150);
        assert!(h.synthesizer.voices().is_empty());

        let err = h
            .orchestrator
            .submit_message("missing", "Hello".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// Completes the session while the reply is being generated, as a concurrent
    /// `stop` would.
    struct StoppingGenerator {
        sessions: Arc<SessionManager>,
        session_id: String,
    }

    #[async_trait::async_trait]
    impl crate::pipeline::ReplyGenerator for StoppingGenerator {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<String, crate::pipeline::CollaboratorError> {
            self.sessions.complete_once(&self.session_id).unwrap();
            Ok("Anything else to add?".to_string())
        }
    }

    fn stopping_orchestrator() -> (InterviewOrchestrator, Arc<SessionManager>, String) {
        let sessions = Arc::new(SessionManager::new(5, Duration::from_secs(3600)));
        let session_id = sessions.create(sample_config()).unwrap();
        sessions.activate(&session_id);

        let personas = Arc::new(PersonaCatalog::new());
        let pipeline = Pipeline::new(
            Arc::new(FakeTranscriber::replying("unused")),
            Arc::new(StoppingGenerator {
                sessions: sessions.clone(),
                session_id: session_id.clone(),
            }),
            Arc::new(FakeSynthesizer::returning(vec![1, 2])),
            Duration::from_secs(1),
        );
        let orchestrator = InterviewOrchestrator::new(
            sessions.clone(),
            Arc::new(ConnectionRegistry::new()),
            pipeline,
            Arc::new(InterviewPromptBuilder::new(personas.clone())),
            personas,
            TurnLimits {
                history_window: 10,
                reply_max_tokens: 200,
                message_max_tokens: 150,
            },
        );
        (orchestrator, sessions, session_id)
    }

    #[tokio::test]
    async fn test_stop_during_generation_discards_reply() {
        let (orchestrator, sessions, session_id) = stopping_orchestrator();
        let (sink, mut rx) = ChannelSink::new();

        orchestrator
            .handle_event(&session_id, text("Hello"), sink.as_ref())
            .await
            .unwrap();

        let session = sessions.get(&session_id).unwrap();
        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.question_count(), 0);
        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec!["status:thinking", "error"]);
        assert!(matches!(
            events[1],
            ServerEvent::Error { code: ErrorCode::SessionNotActive, .. }
        ));
    }

    #[tokio::test]
    async fn test_stop_during_generation_fails_http_message() {
        let (orchestrator, sessions, session_id) = stopping_orchestrator();

        let err = orchestrator
            .submit_message(&session_id, "Hello".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(sessions.get(&session_id).unwrap().question_count(), 0);
    }
}

//! Caller-facing interview operations used by the HTTP handlers.

use super::feedback::FeedbackSynthesizer;
use super::models::{
    InterviewConfig, InterviewFeedback, MessageReplyResponse, PersonaDefinition,
    SessionStartResponse, SessionStatusResponse,
};
use super::persona::PersonaCatalog;
use super::session::SessionManager;
use crate::error::{AppError, AppResult};
use crate::voice::events::{ServerEvent, TurnStage};
use crate::voice::orchestrator::InterviewOrchestrator;
use crate::voice::registry::ConnectionRegistry;
use std::sync::Arc;
use tracing::info;

pub struct InterviewService {
    sessions: Arc<SessionManager>,
    connections: Arc<ConnectionRegistry>,
    personas: Arc<PersonaCatalog>,
    orchestrator: Arc<InterviewOrchestrator>,
    feedback: FeedbackSynthesizer,
}

impl InterviewService {
    pub fn new(
        sessions: Arc<SessionManager>,
        connections: Arc<ConnectionRegistry>,
        personas: Arc<PersonaCatalog>,
        orchestrator: Arc<InterviewOrchestrator>,
        feedback: FeedbackSynthesizer,
    ) -> Self {
        Self {
            sessions,
            connections,
            personas,
            orchestrator,
            feedback,
        }
    }

    pub fn personas(&self) -> &'static [PersonaDefinition] {
        self.personas.all()
    }

    /// Create and activate a session, returning the persona's opening line.
    pub fn start(&self, config: InterviewConfig) -> AppResult<SessionStartResponse> {
        config.validate()?;
        let persona_id = config.persona_id;

        let session_id = self.sessions.create(config)?;
        self.sessions.activate(&session_id);
        let session = self
            .sessions
            .get(&session_id)
            .ok_or_else(|| AppError::Internal("session vanished after creation".to_string()))?;

        info!(session_id = %session_id, persona = %persona_id, "Interview started");

        Ok(SessionStartResponse {
            session_id,
            initial_greeting: self.personas.greeting(persona_id),
            status: session.status(),
        })
    }

    pub fn status(&self, session_id: &str) -> AppResult<SessionStatusResponse> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        Ok(SessionStatusResponse {
            session_id: session_id.to_string(),
            status: session.status(),
            question_count: session.question_count(),
            duration: self.sessions.duration_string(session_id),
            current_question: session.current_question().map(str::to_string),
        })
    }

    /// Complete the session and evaluate it. A second stop is `InvalidState`.
    pub async fn stop(&self, session_id: &str) -> AppResult<InterviewFeedback> {
        let session = self.sessions.complete_once(session_id)?;
        info!(session_id, questions = session.question_count(), "Interview stopped");

        self.connections
            .send_to(session_id, ServerEvent::status(TurnStage::Completed))
            .await;

        Ok(self.feedback.generate(&session).await)
    }

    pub async fn submit_message(
        &self,
        session_id: &str,
        content: String,
    ) -> AppResult<MessageReplyResponse> {
        self.orchestrator.submit_message(session_id, content).await
    }
}

//! # Application State
//!
//! Everything the HTTP handlers and voice connections share, built once at startup and
//! handed to actix as `web::Data<AppState>`.
//!
//! ## Ownership:
//! Components hold each other through `Arc`. Nothing here is a global: tests build their
//! own `AppState` with fake collaborators through [`AppState::new`].
//!
//! ## Locking:
//! The session store and the connection registry carry their own locks. The only lock
//! owned by this module guards the request counters.

use crate::config::AppConfig;
use crate::document::DocumentExtractor;
use crate::interview::feedback::FeedbackSynthesizer;
use crate::interview::persona::PersonaCatalog;
use crate::interview::prompt::InterviewPromptBuilder;
use crate::interview::service::InterviewService;
use crate::interview::session::SessionManager;
use crate::pipeline::{Pipeline, ReplyGenerator, SpeechSynthesizer, Transcriber};
use crate::voice::orchestrator::{InterviewOrchestrator, TurnLimits};
use crate::voice::registry::ConnectionRegistry;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// The remote collaborators the interview core depends on.
pub struct Collaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub generator: Arc<dyn ReplyGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub documents: Arc<dyn DocumentExtractor>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub connections: Arc<ConnectionRegistry>,
    pub interviews: Arc<InterviewService>,
    pub orchestrator: Arc<InterviewOrchestrator>,
    pub documents: Arc<dyn DocumentExtractor>,

    /// Request counters, updated by `MetricsMiddleware`
    pub metrics: Arc<RwLock<AppMetrics>>,

    pub start_time: Instant,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AppMetrics {
    pub request_count: u64,
    /// Responses with a 4xx or 5xx status
    pub error_count: u64,
}

impl AppState {
    /// Wire the store, registry, orchestrator and service around the given collaborators.
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let sessions = Arc::new(SessionManager::new(
            config.session.max_concurrent_sessions,
            config.max_session_duration(),
        ));
        let connections = Arc::new(ConnectionRegistry::new());
        let personas = Arc::new(PersonaCatalog::new());

        let pipeline = Pipeline::new(
            collaborators.transcriber,
            collaborators.generator.clone(),
            collaborators.synthesizer,
            config.request_timeout(),
        );

        let orchestrator = Arc::new(InterviewOrchestrator::new(
            sessions.clone(),
            connections.clone(),
            pipeline,
            Arc::new(InterviewPromptBuilder::new(personas.clone())),
            personas.clone(),
            TurnLimits {
                history_window: config.pipeline.history_window,
                reply_max_tokens: config.pipeline.reply_max_tokens,
                message_max_tokens: config.pipeline.message_max_tokens,
            },
        ));

        let feedback = FeedbackSynthesizer::new(
            sessions.clone(),
            collaborators.generator,
            config.request_timeout(),
            config.pipeline.feedback_max_tokens,
        );

        let interviews = Arc::new(InterviewService::new(
            sessions.clone(),
            connections.clone(),
            personas,
            orchestrator.clone(),
            feedback,
        ));

        Self {
            config: Arc::new(config),
            sessions,
            connections,
            interviews,
            orchestrator,
            documents: collaborators.documents,
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        metrics.request_count += 1;
        if is_error {
            metrics.error_count += 1;
        }
    }

    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        *self.metrics.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

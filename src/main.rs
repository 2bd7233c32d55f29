//! # Interview Voice Backend - Main Application Entry Point
//!
//! Actix-web server for the AI interview simulator.
//!
//! ## Application Architecture:
//! - **config**: Application configuration (defaults, `config.toml`, `APP_` environment variables)
//! - **state**: Shared application state wiring the interview core together
//! - **health**: Health and load reporting
//! - **middleware**: Request metrics
//! - **handlers**: HTTP endpoints for sessions, personas, CV upload and config
//! - **websocket**: The duplex voice connection actor
//! - **interview**: Session store, personas, prompts, feedback and the service facade
//! - **voice**: Wire events, the connection registry and the turn orchestrator
//! - **pipeline**: Transcription, reply generation and speech synthesis collaborators
//! - **document**: CV text extraction
//! - **error**: Error types and HTTP error responses

mod config;
mod document;
mod error;
mod handlers;
mod health;
mod interview;
mod middleware;
mod pipeline;
mod state;
mod voice;
mod websocket;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use document::CvExtractor;
use interview::session::SessionManager;
use pipeline::{elevenlabs::ElevenLabsClient, openai::OpenAiClient};
use state::{AppState, Collaborators};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Set once a termination signal has been received.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting interview-voice-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    let openai = Arc::new(OpenAiClient::new(&config.openai)?);
    if !openai.is_configured() {
        warn!("OpenAI API key not set, transcription and replies will use fallback text");
    }
    let elevenlabs = Arc::new(ElevenLabsClient::new(&config.elevenlabs)?);
    if !elevenlabs.is_configured() {
        warn!("ElevenLabs API key not set, voice responses will be unavailable");
    }

    let collaborators = Collaborators {
        transcriber: openai.clone(),
        generator: openai,
        synthesizer: elevenlabs,
        documents: Arc::new(CvExtractor::new()?),
    };

    let app_state = AppState::new(config.clone(), collaborators);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    spawn_session_cleanup(app_state.sessions.clone(), config.cleanup_interval());
    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(handlers::json_config())
            .wrap(build_cors(&app_state.config))
            .wrap(TracingLogger::default())
            .wrap(middleware::MetricsMiddleware)
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health::health_check))
                    .route("/config", web::get().to(handlers::get_config))
                    .route("/personas", web::get().to(handlers::list_personas))
                    .route("/cv/extract", web::post().to(handlers::extract_cv))
                    .service(
                        web::scope("/interview")
                            .route("/start", web::post().to(handlers::start_interview))
                            .route(
                                "/status/{session_id}",
                                web::get().to(handlers::interview_status),
                            )
                            .route("/stop/{session_id}", web::post().to(handlers::stop_interview))
                            .route("/message/{session_id}", web::post().to(handlers::send_message)),
                    ),
            )
            .route("/ws/voice/{session_id}", web::get().to(websocket::voice_websocket))
            .route("/health", web::get().to(health::health_check))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Logging defaults to `interview_voice_backend=debug,actix_web=info` unless `RUST_LOG` is set.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_voice_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if config.allows_any_origin() {
        return cors.allow_any_origin();
    }
    config
        .cors
        .allowed_origins
        .iter()
        .fold(cors.supports_credentials(), |cors, origin| cors.allowed_origin(origin))
}

/// Periodically drop sessions that outlived the configured maximum duration.
fn spawn_session_cleanup(sessions: Arc<SessionManager>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = sessions.expire_stale();
            if removed > 0 {
                info!(removed, remaining = sessions.len(), "Expired stale interview sessions");
            }
        }
    });
}

/// Flip [`SHUTDOWN_SIGNAL`] on SIGTERM or SIGINT.
fn setup_signal_handlers() {
    tokio::spawn(async {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(mut sigterm), Ok(mut sigint)) => {
                    tokio::select! {
                        _ = sigterm.recv() => info!("Received SIGTERM"),
                        _ = sigint.recv() => info!("Received SIGINT"),
                    }
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!("Failed to install unix signal handlers ({}), falling back to Ctrl+C", e);
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl+C: {}", e);
                        return;
                    }
                }
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            info!("Received Ctrl+C");
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

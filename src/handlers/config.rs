use crate::{error::AppError, state::AppState};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Effective configuration, without credentials.
pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let config = &state.config;

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": {
            "server": {
                "host": config.server.host,
                "port": config.server.port
            },
            "session": {
                "max_concurrent_sessions": config.session.max_concurrent_sessions,
                "max_session_duration_secs": config.session.max_session_duration_secs,
                "cleanup_interval_secs": config.session.cleanup_interval_secs
            },
            "pipeline": {
                "request_timeout_secs": config.pipeline.request_timeout_secs,
                "history_window": config.pipeline.history_window,
                "reply_max_tokens": config.pipeline.reply_max_tokens,
                "message_max_tokens": config.pipeline.message_max_tokens,
                "feedback_max_tokens": config.pipeline.feedback_max_tokens
            },
            "openai": {
                "configured": has_key(&config.openai.api_key),
                "chat_model": config.openai.chat_model,
                "transcription_model": config.openai.transcription_model
            },
            "elevenlabs": {
                "configured": has_key(&config.elevenlabs.api_key),
                "model_id": config.elevenlabs.model_id
            },
            "uploads": {
                "max_document_bytes": config.uploads.max_document_bytes
            },
            "cors": {
                "allowed_origins": config.cors.allowed_origins
            }
        }
    })))
}

fn has_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

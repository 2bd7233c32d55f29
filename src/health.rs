use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let live_sessions = state.sessions.list_active().len();
    let max_sessions = state.sessions.max_concurrent_sessions();

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "message": "AI Interview Simulator API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.get_uptime_seconds(),
        "sessions": {
            "live": live_sessions,
            "stored": state.sessions.len(),
            "max_concurrent": max_sessions,
            "voice_connections": state.connections.connection_count(),
            "load": session_load(live_sessions, max_sessions)
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": if metrics.request_count > 0 {
                metrics.error_count as f64 / metrics.request_count as f64
            } else {
                0.0
            }
        }
    }))
}

fn session_load(live: usize, max: usize) -> &'static str {
    let usage = if max > 0 { live as f64 / max as f64 } else { 0.0 };

    if usage > 0.9 {
        "high_load"
    } else if usage > 0.7 {
        "moderate_load"
    } else {
        "normal"
    }
}

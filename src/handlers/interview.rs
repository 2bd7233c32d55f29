//! # Interview REST API Handlers
//!
//! Session lifecycle over HTTP. The voice loop itself runs on the WebSocket route; these
//! endpoints create, inspect, stop and (for text-only clients) converse with a session.
//!
//! ## Available Endpoints:
//! - `POST /api/interview/start` - Create and activate a session
//! - `GET /api/interview/status/{session_id}` - Status, question count and elapsed time
//! - `POST /api/interview/stop/{session_id}` - Complete the session and return feedback
//! - `POST /api/interview/message/{session_id}` - Text turn without speech synthesis

use crate::{error::AppError, interview::models::InterviewConfig, state::AppState};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

/// Request body for a text turn.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub content: String,
}

/// ## Endpoint: `POST /api/interview/start`
///
/// ## Response:
/// ```json
/// {
///   "session_id": "6f1c...",
///   "initial_greeting": "Hello! I'm Sarah Chen...",
///   "status": "active"
/// }
/// ```
pub async fn start_interview(
    state: web::Data<AppState>,
    body: web::Json<InterviewConfig>,
) -> Result<HttpResponse, AppError> {
    let started = state.interviews.start(body.into_inner())?;
    Ok(HttpResponse::Ok().json(started))
}

pub async fn interview_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let status = state.interviews.status(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(status))
}

/// ## Endpoint: `POST /api/interview/stop/{session_id}`
///
/// Stopping an already completed session returns `409 Conflict`.
pub async fn stop_interview(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let feedback = state.interviews.stop(&session_id).await?;
    Ok(HttpResponse::Ok().json(feedback))
}

pub async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<MessageRequest>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let content = body.into_inner().content;
    debug!(session_id = %session_id, chars = content.len(), "Text message received");

    let reply = state.interviews.submit_message(&session_id, content).await?;
    Ok(HttpResponse::Ok().json(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::handlers::json_config;
    use crate::interview::test_support::FakeGenerator;
    use crate::state::test_support::{test_state, test_state_with};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .app_data(json_config())
                    .service(
                        web::scope("/api/interview")
                            .route("/start", web::post().to(start_interview))
                            .route("/status/{session_id}", web::get().to(interview_status))
                            .route("/stop/{session_id}", web::post().to(stop_interview))
                            .route("/message/{session_id}", web::post().to(send_message)),
                    ),
            )
            .await
        };
    }

    fn start_body() -> Value {
        json!({
            "persona_id": "tech-expert",
            "interview_type": "technical",
            "interview_length": "standard",
            "job_description": "Senior Rust engineer for a realtime audio platform",
            "cv_text": "Ten years of systems programming."
        })
    }

    #[actix_web::test]
    async fn test_start_status_message_stop() {
        let app = app!(test_state());

        let req = test::TestRequest::post()
            .uri("/api/interview/start")
            .set_json(start_body())
            .to_request();
        let started: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(started["status"], "active");
        let id = started["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/interview/message/{}", id))
            .set_json(json!({"content": "I built a job scheduler."}))
            .to_request();
        let reply: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reply["response"], "Tell me about a recent project.");
        assert_eq!(reply["question_count"], 1);
        assert_eq!(reply["session_status"], "active");

        let req = test::TestRequest::get()
            .uri(&format!("/api/interview/status/{}", id))
            .to_request();
        let status: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status["question_count"], 1);
        assert_eq!(status["current_question"], "Tell me about a recent project.");

        let req = test::TestRequest::post()
            .uri(&format!("/api/interview/stop/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let feedback: Value = test::read_body_json(resp).await;
        assert_eq!(feedback["session_id"], id.as_str());
        assert_eq!(feedback["total_questions"], 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/interview/stop/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_unknown_session_is_404() {
        let app = app!(test_state());

        let req = test::TestRequest::get()
            .uri("/api/interview/status/does-not-exist")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["type"], "not_found");

        let req = test::TestRequest::post()
            .uri("/api/interview/message/does-not-exist")
            .set_json(json!({"content": "hello"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_invalid_bodies_are_400() {
        let app = app!(test_state());

        let mut body = start_body();
        body["persona_id"] = json!("space-pirate");
        let req = test::TestRequest::post()
            .uri("/api/interview/start")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["type"], "bad_request");

        let mut body = start_body();
        body["job_description"] = json!("short");
        let req = test::TestRequest::post()
            .uri("/api/interview/start")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["type"], "validation_error");
    }

    #[actix_web::test]
    async fn test_capacity_is_429() {
        let mut config = AppConfig::default();
        config.session.max_concurrent_sessions = 1;
        let app = app!(test_state_with(config, FakeGenerator::replying("Next question?")));

        let req = test::TestRequest::post()
            .uri("/api/interview/start")
            .set_json(start_body())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/interview/start")
            .set_json(start_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn test_message_with_failed_generator_uses_fallback() {
        let app = app!(test_state_with(AppConfig::default(), FakeGenerator::failing()));

        let req = test::TestRequest::post()
            .uri("/api/interview/start")
            .set_json(start_body())
            .to_request();
        let started: Value = test::call_and_read_body_json(&app, req).await;
        let id = started["session_id"].as_str().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/interview/message/{}", id))
            .set_json(json!({}))
            .to_request();
        let reply: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reply["response"], crate::pipeline::REPLY_FALLBACK);
        assert_eq!(reply["question_count"], 1);
    }
}

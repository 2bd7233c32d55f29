use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn list_personas(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.interviews.personas())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_lists_catalog() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .route("/api/personas", web::get().to(list_personas)),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/personas").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let personas = body.as_array().unwrap();
        assert_eq!(personas.len(), 5);
        assert_eq!(personas[0]["id"], "hr-friendly");
        assert_eq!(personas[0]["voice_id"], "21m00Tcm4TlvDq8ikWAM");
    }
}

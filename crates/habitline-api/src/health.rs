use axum::{Json, http::StatusCode, response::IntoResponse};

use habitline_types::api::{HealthResponse, MessageResponse};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Habitline API is running".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(MessageResponse::new("Route not found")))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn health_is_public() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Habitline API is running");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_routes_get_json_404() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }
}

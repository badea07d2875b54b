use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: the relay serves submissions whether or not Telegram is up, so this
/// stays 200 and only reports whether the Bot API accepts the configured token.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let telegram_status = match state.health_service.check_telegram().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, component = "telegram", "Telegram check failed");
            "error"
        }
    };

    let response = HealthResponse { status: "ok".to_string(), telegram: telegram_status.to_string() };

    (StatusCode::OK, Json(response))
}

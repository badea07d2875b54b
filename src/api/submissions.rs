use crate::api::AppState;
use crate::api::schemas::submission::{SoftFailureResponse, SubmissionRequest, SubmissionResponse};
use crate::error::{AppError, Result};
use crate::services::relay_service::RelayError;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Relays a test submission to Telegram.
///
/// Responds 200 when every part was delivered and 207 when some parts failed. Failures
/// outside the per-part loop are answered with a soft-failure body so the caller's
/// own workflow carries on.
///
/// # Errors
/// Returns `AppError::BadRequest` if the transcript is missing.
pub async fn submit(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubmissionRequest>, JsonRejection>,
) -> Result<Response> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return Ok(soft_failure(&state, &RelayError::Malformed(rejection.body_text())));
        }
    };

    let submission = request.validate().map_err(AppError::BadRequest)?;

    match state.relay_service.submit(submission).await {
        Ok(outcome) => {
            let status = if outcome.all_successful() { StatusCode::OK } else { StatusCode::MULTI_STATUS };
            Ok((status, Json(SubmissionResponse::from(outcome))).into_response())
        }
        Err(e) => Ok(soft_failure(&state, &e)),
    }
}

fn soft_failure(state: &AppState, error: &RelayError) -> Response {
    tracing::error!(error = %error, "Failed to relay submission to Telegram");

    let status = if state.config.delivery.strict_failure_status {
        match error {
            RelayError::Malformed(_) => StatusCode::BAD_REQUEST,
            RelayError::Sender(_) => StatusCode::BAD_GATEWAY,
        }
    } else {
        StatusCode::OK
    };

    (status, Json(SoftFailureResponse::new(error.to_string()))).into_response()
}

/// Answers a bare `OPTIONS` request; CORS preflights are answered by the CORS layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

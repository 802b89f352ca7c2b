use crate::domain::contribution::CreateContributionRequest;
use crate::error::PaymentError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

pub async fn initiate(
    State(state): State<AppState>,
    Json(req): Json<CreateContributionRequest>,
) -> impl IntoResponse {
    match state.payment_service.initiate(req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Gateway redirect targets. The redirect itself proves nothing: both
/// callbacks run the same server-side verification, and only its result
/// decides the outcome. A failure redirect that verifies as complete still
/// credits; a success redirect that looks up as canceled does not.
pub async fn callback_success(
    State(state): State<AppState>,
    Path(contribution_id): Path<Uuid>,
) -> impl IntoResponse {
    confirm(state, contribution_id).await
}

pub async fn callback_failure(
    State(state): State<AppState>,
    Path(contribution_id): Path<Uuid>,
) -> impl IntoResponse {
    confirm(state, contribution_id).await
}

async fn confirm(state: AppState, contribution_id: Uuid) -> axum::response::Response {
    match state.payment_service.confirm(contribution_id).await {
        Ok(outcome) => (axum::http::StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_contribution(
    State(state): State<AppState>,
    Path(contribution_id): Path<Uuid>,
) -> impl IntoResponse {
    let row = match state.contributions_repo.find(contribution_id).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return (
                axum::http::StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "contribution not found"})),
            )
                .into_response()
        }
        Err(e) => return PaymentError::Internal(e).into_response(),
    };

    let verification = state
        .verification_repo
        .get(contribution_id)
        .await
        .unwrap_or(None);

    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({
            "contribution": row,
            "verification": verification
        })),
    )
        .into_response()
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}

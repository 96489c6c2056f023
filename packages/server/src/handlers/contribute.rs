use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::contributor::ContributeRequest;
use crate::models::shared::MessageResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/contribute",
    tag = "Contributors",
    operation_id = "contribute",
    summary = "Register as a host of a dataset copy",
    description = "Fetches the copy at `hostLink` and compares its SHA-256 with the dataset's \
        fingerprint. On a match the claim is recorded once per email; reaching the verification \
        threshold deletes the local copy.",
    request_body = ContributeRequest,
    responses(
        (status = 200, description = "Contributor verified", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR) or copy could not be verified (VERIFICATION_FAILED)", body = ErrorBody),
        (status = 404, description = "Dataset not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(dataset_id = %payload.dataset_id))]
pub async fn contribute(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContributeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.registry.record_contribution(payload.into()).await?;
    Ok(Json(MessageResponse::new("Contributor verified and saved")))
}

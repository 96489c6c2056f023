use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::dataset::{
    DatasetResponse, UpdateDatasetRequest, UploadDatasetForm, UploadDatasetResponse,
};
use crate::models::shared::MessageResponse;
use crate::registry::{DatasetUpdate, NewDataset};
use crate::state::AppState;

/// Room for multipart boundaries and the text fields on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(limit.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    get,
    path = "/api/datasets",
    tag = "Datasets",
    operation_id = "listDatasets",
    summary = "List all datasets",
    description = "Returns every dataset record in upload order, including delisted ones, \
        with its derived lifecycle state.",
    responses(
        (status = 200, description = "Dataset list", body = Vec<DatasetResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_datasets(
    State(state): State<AppState>,
) -> Result<Json<Vec<DatasetResponse>>, AppError> {
    let datasets = state
        .registry
        .list()
        .await?
        .into_iter()
        .map(|(dataset, state)| DatasetResponse { dataset, state })
        .collect();
    Ok(Json(datasets))
}

#[utoipa::path(
    post,
    path = "/api/uploadDataset",
    tag = "Datasets",
    operation_id = "uploadDataset",
    summary = "Upload a new dataset",
    description = "Stores the file locally, fingerprints it with SHA-256 and registers the \
        dataset. `title`, `description` and `file` are required.",
    request_body(content = UploadDatasetForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Dataset created", body = UploadDatasetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.storage.max_upload_size;

    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("title") => title = Some(read_text(field, "title").await?),
            Some("description") => description = Some(read_text(field, "description").await?),
            Some("file") => {
                let file_name = field.file_name().map(|s| s.to_string());
                let bytes = read_file_field(field, max_size).await?;
                file = Some((file_name, bytes));
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let (original_filename, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let dataset = state
        .registry
        .create(NewDataset {
            title: title.unwrap_or_default(),
            description: description.unwrap_or_default(),
            original_filename,
            bytes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadDatasetResponse {
            message: "Dataset uploaded successfully.".into(),
            dataset,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/dataset",
    tag = "Datasets",
    operation_id = "updateDataset",
    summary = "Edit a dataset's title or description",
    description = "Partially updates a dataset. Only provided fields are modified.",
    request_body = UpdateDatasetRequest,
    responses(
        (status = 200, description = "Dataset updated", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Dataset not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id = %payload.id))]
pub async fn update_dataset(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateDatasetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.id.trim().is_empty() {
        return Err(AppError::Validation("Missing dataset id".into()));
    }

    state
        .registry
        .edit(
            &payload.id,
            DatasetUpdate {
                title: payload.title,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Dataset updated")))
}

#[utoipa::path(
    delete,
    path = "/api/dataset/{id}",
    tag = "Datasets",
    operation_id = "deleteDataset",
    summary = "Delete a dataset",
    description = "Removes the dataset record and its local file if one still exists. \
        Contributor claims are kept.",
    params(("id" = String, Path, description = "Dataset ID")),
    responses(
        (status = 200, description = "Dataset deleted", body = MessageResponse),
        (status = 404, description = "Dataset not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.registry.delete(&id).await?;
    Ok(Json(MessageResponse::new(format!("Dataset {id} deleted"))))
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// Read a multipart file field into memory, enforcing `max_size`.
async fn read_file_field(
    mut field: axum::extract::multipart::Field<'_>,
    max_size: u64,
) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

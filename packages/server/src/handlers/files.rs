use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::registry::Download;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "Files",
    operation_id = "downloadDataset",
    summary = "Download a dataset",
    description = "Streams the local copy while it exists. Once the local copy has been deleted, \
        redirects to a randomly chosen verified contributor copy.",
    params(("id" = String, Path, description = "Dataset ID")),
    responses(
        (status = 200, description = "Dataset content"),
        (status = 302, description = "Redirect to a contributor copy"),
        (status = 404, description = "Dataset unknown or no source available (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state.registry.open_download(&id).await? {
        Download::Local {
            reader,
            display_name,
            size,
        } => {
            let body = Body::from_stream(ReaderStream::new(reader));

            let content_type = mime_guess::from_path(&display_name)
                .first_or_octet_stream()
                .to_string();

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, size.to_string())
                .header(
                    header::CONTENT_DISPOSITION,
                    content_disposition_value(&display_name),
                )
                .body(body)
                .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
        }
        Download::Redirect { host_link } => {
            Ok((StatusCode::FOUND, [(header::LOCATION, host_link)]).into_response())
        }
    }
}

/// Build an `attachment` disposition with an ASCII fallback and an RFC 5987
/// encoded `filename*`.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "dataset".to_string()
    } else {
        ascii_safe
    };

    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    let upload = Router::new()
        .route("/uploadDataset", post(handlers::dataset::upload_dataset))
        .layer(handlers::dataset::upload_body_limit(
            config.storage.max_upload_size,
        ));

    Router::new()
        .route("/datasets", get(handlers::dataset::list_datasets))
        .route("/dataset", patch(handlers::dataset::update_dataset))
        .route("/dataset/{id}", delete(handlers::dataset::delete_dataset))
        .route("/contribute", post(handlers::contribute::contribute))
        .route("/files/{id}", get(handlers::files::download_dataset))
        .merge(upload)
}

pub mod config;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::{Json, Router, http::HeaderValue, routing::get};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dataset Registry API",
        version = "1.0.0",
        description = "Dataset hosting with crowd verification of contributor mirrors"
    ),
    paths(
        handlers::dataset::list_datasets,
        handlers::dataset::upload_dataset,
        handlers::dataset::update_dataset,
        handlers::dataset::delete_dataset,
        handlers::contribute::contribute,
        handlers::files::download_dataset,
    ),
    components(schemas(
        entity::Dataset,
        entity::DatasetState,
        error::ErrorBody,
        models::shared::MessageResponse,
        models::dataset::DatasetResponse,
        models::dataset::UploadDatasetForm,
        models::dataset::UploadDatasetResponse,
        models::dataset::UpdateDatasetRequest,
        models::contributor::ContributeRequest,
    )),
    tags(
        (name = "Datasets", description = "Dataset upload and management"),
        (name = "Contributors", description = "Contributor copy verification"),
        (name = "Files", description = "Dataset downloads"),
    ),
)]
pub struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", routes::api_routes(&state.config))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .with_state(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

use serde::{Deserialize, Serialize};

use crate::entity::{Dataset, DatasetState};

/// A dataset record as listed, with its derived lifecycle state.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DatasetResponse {
    #[serde(flatten)]
    pub dataset: Dataset,
    #[schema(example = "hosted")]
    pub state: DatasetState,
}

/// Multipart form accepted by the upload endpoint.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadDatasetForm {
    #[schema(example = "Traffic Counts")]
    pub title: String,
    #[schema(example = "Hourly vehicle counts per intersection")]
    pub description: String,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadDatasetResponse {
    #[schema(example = "Dataset uploaded successfully.")]
    pub message: String,
    pub dataset: Dataset,
}

/// PATCH body. Absent or `null` fields are left unchanged.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateDatasetRequest {
    #[serde(default)]
    #[schema(example = "traffic-counts-1718000000-3f9a1c2e")]
    pub id: String,
    #[schema(example = "Traffic Counts (2024)")]
    pub title: Option<String>,
    pub description: Option<String>,
}

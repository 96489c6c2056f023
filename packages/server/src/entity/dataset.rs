use chrono::{DateTime, Utc};
use common::ContentHash;
use serde::{Deserialize, Serialize};

/// One hosted file and its metadata, as persisted in the dataset index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Derived from the title and creation time. Immutable.
    #[schema(example = "traffic-counts-1718000000-3f9a1c2e")]
    pub id: String,

    #[schema(example = "Traffic Counts")]
    pub title: String,

    #[schema(example = "Hourly vehicle counts per intersection")]
    pub description: String,

    /// SHA-256 of the uploaded bytes, lowercase hex.
    #[schema(value_type = String, example = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    pub content_fingerprint: ContentHash,

    /// Number of distinct verified contributor copies.
    #[schema(example = 0)]
    pub verified_host_count: u32,

    /// Display name used for downloads.
    #[schema(example = "traffic_counts.csv")]
    pub original_filename: String,

    /// Local file name. Meaningless once the dataset is delisted.
    #[schema(example = "traffic-counts-1718000000-3f9a1c2e.csv")]
    pub stored_filename: String,

    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a dataset. Never persisted; derived from file presence
/// and the verified host count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatasetState {
    /// Local file present, no verified copies yet.
    Hosted,
    /// Local file present, some verified copies.
    Distributing,
    /// Local file deleted; served by redirect to contributor copies.
    Delisted,
}

impl DatasetState {
    pub fn derive(file_present: bool, verified_host_count: u32) -> Self {
        match (file_present, verified_host_count) {
            (false, _) => Self::Delisted,
            (true, 0) => Self::Hosted,
            (true, _) => Self::Distributing,
        }
    }
}

use serde::Deserialize;

use crate::registry::Contribution;

/// A contributor's claim to host an identical copy of a dataset.
///
/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributeRequest {
    #[serde(default)]
    #[schema(example = "traffic-counts-1718000000-3f9a1c2e")]
    pub dataset_id: String,
    #[serde(default)]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "ada@example.org")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "https://mirror.example.org/traffic_counts.csv")]
    pub host_link: String,
}

impl From<ContributeRequest> for Contribution {
    fn from(req: ContributeRequest) -> Self {
        Self {
            dataset_id: req.dataset_id,
            name: req.name,
            email: req.email,
            host_link: req.host_link,
        }
    }
}

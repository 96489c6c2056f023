use serde::{Deserialize, Serialize};

/// A verified assertion that `email` hosts a byte-identical copy of a dataset
/// at `host_link`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributorClaim {
    pub dataset_id: String,
    pub name: String,
    /// De-duplication key within one dataset.
    pub email: String,
    pub host_link: String,
}

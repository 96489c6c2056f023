pub mod contributor;
pub mod dataset;

pub use contributor::ContributorClaim;
pub use dataset::{Dataset, DatasetState};

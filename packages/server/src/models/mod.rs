pub mod contributor;
pub mod dataset;
pub mod shared;

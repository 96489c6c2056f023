pub mod contribute;
pub mod dataset;
pub mod files;

pub mod completeness;
pub mod error;
pub mod outliers;

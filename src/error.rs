use crate::audit::error::AuditError;
use crate::geometry::error::GeometryError;
use crate::series_data::error::SeriesDataError;
use crate::signatures::error::SignatureError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstreamsError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    SeriesData(#[from] SeriesDataError),

    #[error("Failed building summary DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

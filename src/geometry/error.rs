use crate::types::grid::CellIndex;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("No grid cells intersect catchment '{catchment}'")]
    NoIntersectingCells { catchment: String },

    #[error("Cell half extent must be positive and finite, got {0}")]
    InvalidCellExtent(f64),

    #[error("Chunk size must be at least one time step")]
    InvalidChunkSize,

    #[error("Grid {0} axis is empty")]
    EmptyAxis(&'static str),

    #[error("Grid buffer holds {found} values but its shape needs {expected}")]
    GridShapeMismatch { expected: usize, found: usize },

    #[error("Grid source is {source_rows}x{source_cols}, axes describe {axes_rows}x{axes_cols}")]
    AxesMismatch {
        source_rows: usize,
        source_cols: usize,
        axes_rows: usize,
        axes_cols: usize,
    },

    #[error("Time range {start}..{end} is outside a time axis of length {len}")]
    ChunkOutOfRange { start: usize, end: usize, len: usize },

    #[error("Cell {0:?} is outside the grid")]
    CellOutOfRange(CellIndex),

    #[error("Failed to write weighted series to '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode weighted series for '{0}'")]
    SeriesEncode(PathBuf, #[source] PolarsError),

    #[error("Failed to move finished series into place at '{0}'")]
    OutputPersist(PathBuf, #[source] std::io::Error),
}

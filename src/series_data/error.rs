use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesDataError {
    #[error("Failed to read CSV table '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Table '{0}' has no columns")]
    MissingDateColumn(PathBuf),

    #[error("Table '{0}' has no catchment code column")]
    MissingCodeColumn(PathBuf),

    #[error("Row {row} of '{path}' has an unreadable date '{value}'")]
    InvalidDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("Failed to convert column '{column}' of '{path}'")]
    ColumnConversion {
        path: PathBuf,
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to create output file '{0}'")]
    FileCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Output path '{0}' exists but is not a directory")]
    OutputDirNotADirectory(PathBuf),

    #[error("Failed to write CSV table '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Encoding error writing parquet table '{0}'")]
    ParquetWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    ConfigParse(PathBuf, #[source] serde_json::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

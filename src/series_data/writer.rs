//! Writes summary frames (completeness, signatures, shapes, exceedances) to disk.

use crate::series_data::error::SeriesDataError;
use log::info;
use polars::prelude::*;
use std::io;
use std::path::Path;
use tokio::task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Csv,
    Parquet,
}

impl FrameFormat {
    /// `.parquet` files are written as parquet, everything else as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => FrameFormat::Parquet,
            _ => FrameFormat::Csv,
        }
    }
}

/// Writes `df` to `path`, choosing the format from the extension.
pub fn write_frame_blocking(df: &mut DataFrame, path: &Path) -> Result<(), SeriesDataError> {
    let file = std::fs::File::create(path)
        .map_err(|e| SeriesDataError::FileCreate(path.to_path_buf(), e))?;
    match FrameFormat::from_path(path) {
        FrameFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(df)
                .map_err(|e| SeriesDataError::ParquetWrite(path.to_path_buf(), e))?;
        }
        FrameFormat::Csv => {
            CsvWriter::new(file)
                .include_header(true)
                .finish(df)
                .map_err(|e| SeriesDataError::CsvWrite(path.to_path_buf(), e))?;
        }
    }
    info!("Wrote {} rows to {:?}", df.height(), path);
    Ok(())
}

/// Writes `df` on a blocking worker thread.
pub async fn write_frame(mut df: DataFrame, path: &Path) -> Result<(), SeriesDataError> {
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || write_frame_blocking(&mut df, &path_buf)).await?
}

/// Creates `path` as a directory if needed.
pub async fn ensure_output_dir_exists(path: &Path) -> Result<(), SeriesDataError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(SeriesDataError::OutputDirNotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating output directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| SeriesDataError::OutputDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(SeriesDataError::OutputDirCreation(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn frame() -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new("code".into(), ["A", "B"]),
            Column::new("value".into(), [Some(1.5), None]),
        ])
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FrameFormat::from_path(Path::new("x/out.parquet")), FrameFormat::Parquet);
        assert_eq!(FrameFormat::from_path(Path::new("x/out.PARQUET")), FrameFormat::Parquet);
        assert_eq!(FrameFormat::from_path(Path::new("x/out.csv")), FrameFormat::Csv);
        assert_eq!(FrameFormat::from_path(Path::new("x/out")), FrameFormat::Csv);
    }

    #[tokio::test]
    async fn test_write_csv_and_parquet() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let csv = dir.path().join("summary.csv");
        write_frame(frame()?, &csv).await?;
        let text = std::fs::read_to_string(&csv)?;
        assert!(text.starts_with("code,value\n"));
        assert!(text.contains("A,1.5"));

        let parquet = dir.path().join("summary.parquet");
        write_frame(frame()?, &parquet).await?;
        let back = ParquetReader::new(std::fs::File::open(&parquet)?).finish()?;
        assert_eq!(back.shape(), (2, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_output_dir() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("a").join("b");
        ensure_output_dir_exists(&nested).await?;
        assert!(nested.is_dir());
        ensure_output_dir_exists(&nested).await?;

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x")?;
        assert!(matches!(
            ensure_output_dir_exists(&file).await,
            Err(SeriesDataError::OutputDirNotADirectory(_))
        ));
        Ok(())
    }
}

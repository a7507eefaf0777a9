//! Destinations for weighted series produced chunk by chunk.

use crate::geometry::error::GeometryError;
use polars::io::csv::write::BatchedWriter;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Receives consecutive chunks of a weighted series.
pub trait SeriesSink {
    fn write_chunk(&mut self, values: &[Option<f64>]) -> Result<(), GeometryError>;

    /// Called once after the last chunk.
    fn finish(&mut self) -> Result<(), GeometryError> {
        Ok(())
    }
}

impl SeriesSink for Vec<Option<f64>> {
    fn write_chunk(&mut self, values: &[Option<f64>]) -> Result<(), GeometryError> {
        self.extend_from_slice(values);
        Ok(())
    }
}

/// Path of the per-catchment output file: `{dir}/{variable}_{catchment}.csv`.
pub fn series_path(dir: &Path, variable: &str, catchment: &str) -> PathBuf {
    dir.join(format!("{variable}_{catchment}.csv"))
}

const VALUE_COLUMN: &str = "value";

/// Writes one value per line, no header, `nan` for missing.
///
/// Lines go to a temporary file next to the target, which only replaces the
/// target in [`SeriesSink::finish`]. Dropping the writer before that leaves no file.
pub struct CsvSeriesWriter {
    target: PathBuf,
    temp: Option<NamedTempFile>,
    writer: BatchedWriter<File>,
}

impl CsvSeriesWriter {
    pub fn create(dir: &Path, variable: &str, catchment: &str) -> Result<Self, GeometryError> {
        let target = series_path(dir, variable, catchment);
        let temp = NamedTempFile::new_in(dir)
            .map_err(|e| GeometryError::OutputWrite(target.clone(), e))?;
        let file = temp
            .as_file()
            .try_clone()
            .map_err(|e| GeometryError::OutputWrite(target.clone(), e))?;
        let schema = Schema::from_iter([Field::new(VALUE_COLUMN.into(), DataType::Float64)]);
        let writer = CsvWriter::new(file)
            .include_header(false)
            .with_null_value("nan".into())
            .batched(&schema)
            .map_err(|e| GeometryError::SeriesEncode(target.clone(), e))?;
        Ok(Self {
            target,
            temp: Some(temp),
            writer,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl SeriesSink for CsvSeriesWriter {
    fn write_chunk(&mut self, values: &[Option<f64>]) -> Result<(), GeometryError> {
        if self.temp.is_none() {
            return Err(GeometryError::OutputWrite(
                self.target.clone(),
                std::io::Error::other("series already finished"),
            ));
        }
        if values.is_empty() {
            return Ok(());
        }
        let chunk = DataFrame::new(vec![Column::new(VALUE_COLUMN.into(), values)])
            .map_err(|e| GeometryError::SeriesEncode(self.target.clone(), e))?;
        self.writer
            .write_batch(&chunk)
            .map_err(|e| GeometryError::SeriesEncode(self.target.clone(), e))
    }

    fn finish(&mut self) -> Result<(), GeometryError> {
        let Some(temp) = self.temp.take() else {
            return Ok(());
        };
        temp.persist(&self.target)
            .map_err(|e| GeometryError::OutputPersist(self.target.clone(), e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_appends() -> Result<(), GeometryError> {
        let mut sink: Vec<Option<f64>> = Vec::new();
        sink.write_chunk(&[Some(1.0), None])?;
        sink.write_chunk(&[Some(2.5)])?;
        sink.finish()?;
        assert_eq!(sink, vec![Some(1.0), None, Some(2.5)]);
        Ok(())
    }

    #[test]
    fn test_csv_writer_persists_on_finish() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut writer = CsvSeriesWriter::create(dir.path(), "tp", "DE00001")?;
        writer.write_chunk(&[Some(1.5), None])?;
        writer.write_chunk(&[Some(-0.25)])?;
        let target = writer.target().to_path_buf();
        assert!(!target.exists());
        writer.finish()?;
        assert_eq!(target, dir.path().join("tp_DE00001.csv"));
        assert_eq!(std::fs::read_to_string(&target)?, "1.5\nnan\n-0.25\n");
        Ok(())
    }

    #[test]
    fn test_csv_writer_keeps_extreme_values_short() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut writer = CsvSeriesWriter::create(dir.path(), "pet", "C")?;
        writer.write_chunk(&[Some(1e-300), Some(2.0)])?;
        writer.write_chunk(&[])?;
        writer.write_chunk(&[None, Some(1e300)])?;
        writer.finish()?;
        let written = std::fs::read_to_string(dir.path().join("pet_C.csv"))?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["1e-300", "2.0", "nan", "1e300"]);
        assert!(writer.write_chunk(&[Some(1.0)]).is_err());
        Ok(())
    }

    #[test]
    fn test_csv_writer_dropped_leaves_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        {
            let mut writer = CsvSeriesWriter::create(dir.path(), "tp", "X")?;
            writer.write_chunk(&[Some(1.0)])?;
        }
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }
}

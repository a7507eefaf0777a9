//! Aggregates many catchments against one grid, several at a time.

use crate::config::AggregationConfig;
use crate::error::EstreamsError;
use crate::geometry::aggregator::{CellWeights, GridIndex};
use crate::geometry::error::GeometryError;
use crate::geometry::sink::CsvSeriesWriter;
use crate::types::catchment::Catchment;
use crate::types::grid::GridSource;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

/// A catchment whose weighted series was written.
#[derive(Debug)]
pub struct ProcessedCatchment {
    pub catchment: String,
    pub path: PathBuf,
    pub time_steps: usize,
    pub weights: CellWeights,
}

/// A catchment left out of the batch, with the reason.
#[derive(Debug)]
pub struct SkippedCatchment {
    pub catchment: String,
    pub reason: GeometryError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<ProcessedCatchment>,
    pub skipped: Vec<SkippedCatchment>,
}

impl BatchReport {
    /// Selected cells of every processed catchment:
    /// `code, row, col, lat, lon, intersection_area, weight`.
    pub fn pixels_frame(&self) -> PolarsResult<DataFrame> {
        let cells = || {
            self.processed
                .iter()
                .flat_map(|p| p.weights.cells().iter().map(move |c| (p.catchment.as_str(), c)))
        };
        let codes: Vec<&str> = cells().map(|(code, _)| code).collect();
        let rows: Vec<u32> = cells().map(|(_, c)| c.cell.index.row as u32).collect();
        let cols: Vec<u32> = cells().map(|(_, c)| c.cell.index.col as u32).collect();
        let lats: Vec<f64> = cells().map(|(_, c)| c.cell.lat).collect();
        let lons: Vec<f64> = cells().map(|(_, c)| c.cell.lon).collect();
        let areas: Vec<f64> = cells().map(|(_, c)| c.intersection_area).collect();
        let weights: Vec<f64> = cells().map(|(_, c)| c.weight).collect();
        DataFrame::new(vec![
            Column::new("code".into(), codes),
            Column::new("row".into(), rows),
            Column::new("col".into(), cols),
            Column::new("lat".into(), lats),
            Column::new("lon".into(), lons),
            Column::new("intersection_area".into(), areas),
            Column::new("weight".into(), weights),
        ])
    }
}

fn aggregate_one<S: GridSource + ?Sized>(
    index: &GridIndex,
    source: &S,
    catchment: &Catchment,
    variable: &str,
    output_dir: &Path,
    config: &AggregationConfig,
) -> Result<ProcessedCatchment, GeometryError> {
    // The output file is only opened once the catchment is known to have cells.
    let weights = index.weights(catchment)?;
    let mut writer = CsvSeriesWriter::create(output_dir, variable, &catchment.id)?;
    let time_steps = weights.stream(
        source,
        &mut writer,
        config.chunk_size,
        Some(config.missing_sentinel),
    )?;
    Ok(ProcessedCatchment {
        catchment: catchment.id.clone(),
        path: writer.target().to_path_buf(),
        time_steps,
        weights,
    })
}

/// Writes `{output_dir}/{variable}_{catchment}.csv` for every catchment.
///
/// Catchments run on blocking worker threads, at most `config.concurrency` at a
/// time. A catchment that fails is logged and listed in the report; the others
/// carry on. Only a grid that does not match the index fails the whole batch.
pub async fn aggregate_catchments<S>(
    index: Arc<GridIndex>,
    source: Arc<S>,
    catchments: Vec<Catchment>,
    variable: &str,
    output_dir: &Path,
    config: &AggregationConfig,
) -> Result<BatchReport, EstreamsError>
where
    S: GridSource + Send + Sync + ?Sized + 'static,
{
    index.check_source(source.as_ref())?;
    let total = catchments.len();

    let outcomes = stream::iter(catchments.into_iter().map(|catchment| {
        let index = Arc::clone(&index);
        let source = Arc::clone(&source);
        let variable = variable.to_string();
        let output_dir = output_dir.to_path_buf();
        let config = config.clone();
        task::spawn_blocking(move || {
            let outcome = aggregate_one(
                &index,
                source.as_ref(),
                &catchment,
                &variable,
                &output_dir,
                &config,
            );
            (catchment.id, outcome)
        })
    }))
    .buffer_unordered(config.concurrency.max(1))
    .collect::<Vec<_>>()
    .await;

    let mut report = BatchReport::default();
    for joined in outcomes {
        let (catchment, outcome) = joined?;
        match outcome {
            Ok(processed) => {
                info!(
                    "Aggregated {} for catchment {} over {} cells into {:?}",
                    variable,
                    catchment,
                    processed.weights.cells().len(),
                    processed.path
                );
                report.processed.push(processed);
            }
            Err(reason) => {
                warn!("Skipping catchment {}: {}", catchment, reason);
                report.skipped.push(SkippedCatchment { catchment, reason });
            }
        }
    }
    report.processed.sort_by(|a, b| a.catchment.cmp(&b.catchment));
    report.skipped.sort_by(|a, b| a.catchment.cmp(&b.catchment));

    info!(
        "Aggregated {} of {} catchments for {} ({} skipped)",
        report.processed.len(),
        total,
        variable,
        report.skipped.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::sink::series_path;
    use crate::types::grid::{GridAxes, GridShape, InMemoryGrid};
    use geo::Rect;
    use tempfile::tempdir;

    fn setup() -> (Arc<GridIndex>, Arc<InMemoryGrid>) {
        let axes = GridAxes::new(vec![50.0], vec![10.0, 10.25]).unwrap();
        let index = GridIndex::new(axes, 0.125).unwrap();
        let shape = GridShape { time: 3, rows: 1, cols: 2 };
        let values = vec![1.0, 3.0, -9999.0, 5.0, -9999.0, -9999.0];
        let grid = InMemoryGrid::new(shape, values).unwrap();
        (Arc::new(index), Arc::new(grid))
    }

    #[tokio::test]
    async fn test_batch_skips_catchments_without_cells() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (index, grid) = setup();
        let catchments = vec![
            Catchment::from_polygon("IN", Rect::new((10.0, 49.9), (10.25, 50.1)).to_polygon()),
            Catchment::from_polygon("OUT", Rect::new((30.0, 10.0), (30.1, 10.1)).to_polygon()),
        ];
        let config = AggregationConfig::builder().concurrency(2).chunk_size(2).build();

        let report =
            aggregate_catchments(index, grid, catchments, "tp", dir.path(), &config).await?;
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].catchment, "OUT");
        assert!(matches!(report.skipped[0].reason, GeometryError::NoIntersectingCells { .. }));

        let written = std::fs::read_to_string(series_path(dir.path(), "tp", "IN"))?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["2.0", "5.0", "nan"]);
        assert!(!series_path(dir.path(), "tp", "OUT").exists());

        let pixels = report.pixels_frame()?;
        assert_eq!(pixels.shape(), (2, 7));
        Ok(())
    }

    #[tokio::test]
    async fn test_batch_rejects_mismatched_grid() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (index, _) = setup();
        let wrong = InMemoryGrid::new(GridShape { time: 1, rows: 2, cols: 2 }, vec![0.0; 4])?;
        let result = aggregate_catchments(
            index,
            Arc::new(wrong),
            Vec::new(),
            "tp",
            dir.path(),
            &AggregationConfig::default(),
        )
        .await;
        assert!(matches!(
            result,
            Err(EstreamsError::Geometry(GeometryError::AxesMismatch { .. }))
        ));
        Ok(())
    }
}

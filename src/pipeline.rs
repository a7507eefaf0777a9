//! Entry point tying the aggregation, signature, shape and audit steps to one
//! [`PipelineConfig`].

use crate::audit::completeness::{completeness_frame, CompletenessSummary};
use crate::audit::outliers::{DayOfYearReference, OutlierCheck, OutlierReport};
use crate::batch::{aggregate_catchments, BatchReport};
use crate::config::PipelineConfig;
use crate::error::EstreamsError;
use crate::geometry::aggregator::GridIndex;
use crate::geometry::counting::count_points_in_catchments;
use crate::geometry::shape::{shape_frame, ShapeDescriptors};
use crate::series_data::loader::LandCoverFractions;
use crate::series_data::writer::{ensure_output_dir_exists, write_frame};
use crate::signatures::indices::{interquartile_range, specific_discharge};
use crate::signatures::table::{signatures_frame, SignatureEngine};
use crate::types::catchment::Catchment;
use crate::types::daily_series::SeriesTable;
use crate::types::discharge::QualityTable;
use crate::types::grid::{GridAxes, GridSource};
use crate::types::landcover::dominant_class_per_year;
use bon::bon;
use geo::Point;
use log::warn;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs the EStreams processing steps with one shared configuration.
///
/// # Examples
///
/// ```
/// use estreams::{Pipeline, PipelineConfig};
///
/// let pipeline = Pipeline::new(PipelineConfig::default());
/// assert_eq!(pipeline.config().signatures.threshold_days, 360);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

#[bon]
impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Creates a pipeline from a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EstreamsError::SeriesData`] if the file cannot be read or parsed.
    pub fn from_config_file(path: &Path) -> Result<Self, EstreamsError> {
        Ok(Self::new(PipelineConfig::from_file(path)?))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn signature_engine(&self) -> SignatureEngine {
        SignatureEngine::builder()
            .first_month(self.config.signatures.first_month)
            .threshold_days(self.config.signatures.threshold_days)
            .build()
    }

    /// Aggregates a gridded variable onto every catchment and writes one headerless
    /// CSV file per catchment to `{output_dir}/{variable}_{catchment}.csv`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.catchments(Vec<Catchment>)`: **Required.** Boundaries in longitude/latitude.
    /// * `.axes(GridAxes)`: **Required.** Latitude and longitude of the grid's cell centres.
    /// * `.source(Arc<dyn GridSource + Send + Sync>)`: **Required.** The `[time, lat, lon]` values.
    /// * `.variable(&str)`: **Required.** Variable name used in the output file names.
    /// * `.output_dir(PathBuf)`: Optional. Defaults to the configured output directory.
    ///
    /// # Errors
    ///
    /// Catchments without intersecting cells do not fail the call; they are listed in
    /// [`BatchReport::skipped`]. Errors are returned for an invalid cell extent, a grid
    /// whose shape does not match `axes` and an output directory that cannot be created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use estreams::{Catchment, GridAxes, GridShape, InMemoryGrid, Pipeline};
    /// # use std::sync::Arc;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dir = tempfile::tempdir()?;
    /// let axes = GridAxes::new(vec![50.0], vec![10.0])?;
    /// let grid = InMemoryGrid::new(GridShape { time: 2, rows: 1, cols: 1 }, vec![1.0, 2.0])?;
    /// let square = geo::Rect::new((9.95, 49.95), (10.05, 50.05)).to_polygon();
    ///
    /// let report = Pipeline::default()
    ///     .aggregate_grid()
    ///     .catchments(vec![Catchment::from_polygon("C1", square)])
    ///     .axes(axes)
    ///     .source(Arc::new(grid))
    ///     .variable("tp")
    ///     .output_dir(dir.path().to_path_buf())
    ///     .call()
    ///     .await?;
    /// assert_eq!(report.processed.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn aggregate_grid(
        &self,
        catchments: Vec<Catchment>,
        axes: GridAxes,
        source: Arc<dyn GridSource + Send + Sync>,
        variable: &str,
        output_dir: Option<PathBuf>,
    ) -> Result<BatchReport, EstreamsError> {
        let output_dir = output_dir.unwrap_or_else(|| self.config.output_dir.clone());
        ensure_output_dir_exists(&output_dir).await?;
        let index = GridIndex::new(axes, self.config.aggregation.cell_half_extent)?;
        aggregate_catchments(
            Arc::new(index),
            source,
            catchments,
            variable,
            &output_dir,
            &self.config.aggregation,
        )
        .await
    }

    /// Yearly streamflow signatures of every station, one row per station and
    /// hydrological year.
    ///
    /// Stations without a quality series are treated as entirely good quality.
    /// Years with fewer usable days than the configured threshold keep their row
    /// with empty signature columns.
    #[builder]
    pub fn streamflow_signatures(
        &self,
        discharge: &SeriesTable,
        quality: Option<&QualityTable>,
    ) -> Result<DataFrame, EstreamsError> {
        let no_flags = QualityTable::new();
        let rows = self
            .signature_engine()
            .table(discharge, quality.unwrap_or(&no_flags))?;
        Ok(signatures_frame(&rows)?)
    }

    /// Measurement counts, longest valid run and first/last valid date per series.
    pub fn completeness_summary(&self, series: &SeriesTable) -> Result<DataFrame, EstreamsError> {
        let rows: Vec<CompletenessSummary> = series.iter().map(CompletenessSummary::of).collect();
        Ok(completeness_frame(&rows)?)
    }

    /// Flags values outside `mean ± k·std` of their day of year.
    ///
    /// Series are checked against `references` when given (series without an entry
    /// are skipped), otherwise against a reference built from their own values.
    /// `k` defaults to the configured multiplier.
    #[builder]
    pub fn outlier_check(
        &self,
        series: &SeriesTable,
        references: Option<&BTreeMap<String, DayOfYearReference>>,
        std_multiplier: Option<f64>,
    ) -> Result<Vec<OutlierReport>, EstreamsError> {
        let check = OutlierCheck::builder()
            .std_multiplier(std_multiplier.unwrap_or(self.config.outliers.std_multiplier))
            .build()?;
        Ok(match references {
            Some(references) => check.check_table(series, references),
            None => check.check_table_self_referenced(series),
        })
    }

    /// Area, rotated-rectangle length and width, and elongation ratio per catchment.
    pub fn shape_descriptors(
        &self,
        catchments: &[Catchment],
    ) -> Result<DataFrame, EstreamsError> {
        let descriptors: Vec<ShapeDescriptors> =
            catchments.iter().map(ShapeDescriptors::of).collect();
        Ok(shape_frame(&descriptors)?)
    }

    /// Converts discharge in m³/s to specific discharge in mm/day.
    ///
    /// Catchment areas come from `reported_areas_km2`; missing or non-positive
    /// entries are recomputed from the boundary. Series without a matching
    /// catchment are logged and left out.
    pub fn specific_discharge(
        &self,
        discharge: &SeriesTable,
        catchments: &[Catchment],
        reported_areas_km2: &BTreeMap<String, f64>,
    ) -> SeriesTable {
        let by_id: BTreeMap<&str, &Catchment> =
            catchments.iter().map(|c| (c.id.as_str(), c)).collect();
        discharge
            .iter()
            .filter_map(|series| {
                let Some(catchment) = by_id.get(series.id.as_str()) else {
                    warn!(
                        "No catchment boundary for station {}, skipping specific discharge",
                        series.id
                    );
                    return None;
                };
                let area = catchment.resolve_area_km2(reported_areas_km2.get(&series.id).copied());
                Some(specific_discharge(series, area))
            })
            .collect()
    }

    /// Interquartile range of every series, empty where fewer than `min_count` values exist.
    pub fn interquartile_ranges(
        &self,
        series: &SeriesTable,
        min_count: usize,
    ) -> Result<DataFrame, EstreamsError> {
        let codes: Vec<&str> = series.ids().collect();
        let ranges: Vec<Option<f64>> = series
            .iter()
            .map(|s| interquartile_range(s.values(), min_count))
            .collect();
        Ok(DataFrame::new(vec![
            Column::new("code".into(), codes),
            Column::new("iqr".into(), ranges),
        ])?)
    }

    /// Dominant land-cover class per catchment and year: `code, year, class_code`.
    pub fn dominant_landcover(
        &self,
        fractions: &LandCoverFractions,
    ) -> Result<DataFrame, EstreamsError> {
        let mut codes = Vec::new();
        let mut years = Vec::new();
        let mut classes: Vec<Option<u32>> = Vec::new();
        for (code, columns) in fractions {
            for (year, class_code) in dominant_class_per_year(columns) {
                codes.push(code.as_str());
                years.push(year);
                classes.push(class_code);
            }
        }
        Ok(DataFrame::new(vec![
            Column::new("code".into(), codes),
            Column::new("year".into(), years),
            Column::new("class_code".into(), classes),
        ])?)
    }

    /// Number of `points` inside each catchment: `code, count`.
    pub fn count_points(
        &self,
        points: &[Point<f64>],
        catchments: &[Catchment],
    ) -> Result<DataFrame, EstreamsError> {
        let counts = count_points_in_catchments(points, catchments);
        let codes: Vec<&str> = counts.keys().map(String::as_str).collect();
        let values: Vec<u32> = counts.values().map(|n| *n as u32).collect();
        Ok(DataFrame::new(vec![
            Column::new("code".into(), codes),
            Column::new("count".into(), values),
        ])?)
    }

    /// Writes a summary frame to `{output_dir}/{file_name}` as CSV, or as parquet
    /// when `file_name` ends in `.parquet`.
    pub async fn write_summary(
        &self,
        frame: DataFrame,
        file_name: &str,
    ) -> Result<PathBuf, EstreamsError> {
        ensure_output_dir_exists(&self.config.output_dir).await?;
        let path = self.config.output_dir.join(file_name);
        write_frame(frame, &path).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::daily_series::DailySeries;
    use crate::types::grid::{GridShape, InMemoryGrid};
    use crate::types::landcover::LandCoverKey;
    use chrono::{Duration, NaiveDate};
    use geo::Rect;
    use tempfile::tempdir;

    fn series(id: &str, start: NaiveDate, values: Vec<Option<f64>>) -> DailySeries {
        let dates = (0..values.len()).map(|i| start + Duration::days(i as i64)).collect();
        DailySeries::new(id, dates, values).unwrap()
    }

    fn pipeline_in(dir: &Path) -> Pipeline {
        Pipeline::new(PipelineConfig::builder().output_dir(dir.to_path_buf()).build())
    }

    #[tokio::test]
    async fn test_aggregate_grid_writes_series() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let out = dir.path().join("series");
        let pipeline = pipeline_in(&out);
        let shape = GridShape { time: 3, rows: 1, cols: 1 };
        let grid = InMemoryGrid::new(shape, vec![1.0, -9999.0, 2.5])?;

        let report = pipeline
            .aggregate_grid()
            .catchments(vec![Catchment::from_polygon(
                "C1",
                Rect::new((9.95, 49.95), (10.05, 50.05)).to_polygon(),
            )])
            .axes(GridAxes::new(vec![50.0], vec![10.0])?)
            .source(Arc::new(grid))
            .variable("tp")
            .call()
            .await?;
        assert_eq!(report.processed.len(), 1);
        let text = std::fs::read_to_string(out.join("tp_C1.csv"))?;
        assert_eq!(text, "1.0\nnan\n2.5\n");
        Ok(())
    }

    #[test]
    fn test_streamflow_signatures_frame() -> Result<(), Box<dyn std::error::Error>> {
        let start = NaiveDate::from_ymd_opt(2000, 10, 1).unwrap();
        let table: SeriesTable = vec![series("S1", start, vec![Some(1.0); 365])]
            .into_iter()
            .collect();
        let frame = Pipeline::default().streamflow_signatures().discharge(&table).call()?;
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.column("center_timing")?.u32()?.get(0), Some(183));
        Ok(())
    }

    #[test]
    fn test_outlier_check_uses_configured_multiplier() -> Result<(), Box<dyn std::error::Error>> {
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let values = (0..365).map(|i| Some(if i == 40 { 50.0 } else { 1.0 })).collect();
        let table: SeriesTable = vec![series("S1", start, values)].into_iter().collect();
        let reference = DayOfYearReference::new(vec![Some(1.0); 366], vec![Some(1.0); 366])?;
        let references = BTreeMap::from([("S1".to_string(), reference)]);

        let reports = Pipeline::default()
            .outlier_check()
            .series(&table)
            .references(&references)
            .call()?;
        assert_eq!(reports[0].flagged(), 1);
        assert!(reports[0].mask[40]);

        let strict = Pipeline::default()
            .outlier_check()
            .series(&table)
            .references(&references)
            .std_multiplier(100.0)
            .call()?;
        assert_eq!(strict[0].flagged(), 0);
        Ok(())
    }

    #[test]
    fn test_specific_discharge_recomputes_missing_area() {
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let table: SeriesTable = vec![
            series("A", start, vec![Some(1.0)]),
            series("NOBOUNDARY", start, vec![Some(1.0)]),
        ]
        .into_iter()
        .collect();
        let catchments = vec![Catchment::from_polygon(
            "A",
            Rect::new((9.5, 51.5), (10.5, 52.5)).to_polygon(),
        )];
        let areas = BTreeMap::from([("A".to_string(), 0.0)]);

        let runoff = Pipeline::default().specific_discharge(&table, &catchments, &areas);
        assert_eq!(runoff.len(), 1);
        let value = runoff.get("A").unwrap().values()[0].unwrap();
        let expected = 86_400.0 * 1_000.0 / (catchments[0].equal_area_km2() * 1_000_000.0);
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_summary_frames() -> Result<(), Box<dyn std::error::Error>> {
        let pipeline = Pipeline::default();
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let values = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let table: SeriesTable = vec![series("A", start, values)].into_iter().collect();
        assert_eq!(pipeline.completeness_summary(&table)?.shape(), (1, 9));
        let iqr = pipeline.interquartile_ranges(&table, 3)?;
        assert!((iqr.column("iqr")?.f64()?.get(0).unwrap() - 1.5).abs() < 1e-12);

        let key = |s: &str| s.parse::<LandCoverKey>().unwrap();
        let fractions: LandCoverFractions = BTreeMap::from([(
            "A".to_string(),
            vec![(key("lulc_2000_10"), Some(0.2)), (key("lulc_2000_20"), Some(0.8))],
        )]);
        let landcover = pipeline.dominant_landcover(&fractions)?;
        assert_eq!(landcover.column("class_code")?.u32()?.get(0), Some(20));

        let square = Rect::new((0.0, 0.0), (1.0, 1.0)).to_polygon();
        let catchment = Catchment::from_polygon("A", square);
        let counts =
            pipeline.count_points(&[Point::new(0.5, 0.5)], std::slice::from_ref(&catchment))?;
        assert_eq!(counts.column("count")?.u32()?.get(0), Some(1));
        assert_eq!(pipeline.shape_descriptors(&[catchment])?.height(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_summary() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let pipeline = pipeline_in(dir.path());
        let frame = DataFrame::new(vec![Column::new("code".into(), ["A"])])?;
        let path = pipeline.write_summary(frame, "codes.parquet").await?;
        assert!(path.exists());
        Ok(())
    }
}

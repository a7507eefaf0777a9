//! Run configuration, loadable from a JSON file in which every field is optional.

use crate::audit::outliers::DEFAULT_STD_MULTIPLIER;
use crate::geometry::aggregator::DEFAULT_CHUNK_SIZE;
use crate::series_data::error::SeriesDataError;
use crate::signatures::grouping::DEFAULT_THRESHOLD_DAYS;
use crate::types::daily_series::MISSING_SENTINEL;
use crate::types::grid::DEFAULT_CELL_HALF_EXTENT;
use crate::types::hydro_year::DEFAULT_FIRST_MONTH;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONCURRENCY: usize = 4;

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct AggregationConfig {
    /// Half the side length of a grid cell, in degrees.
    #[builder(default = DEFAULT_CELL_HALF_EXTENT)]
    pub cell_half_extent: f64,
    /// Time steps read from the grid per block.
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    #[builder(default = MISSING_SENTINEL)]
    pub missing_sentinel: f64,
    /// Catchments aggregated at the same time.
    #[builder(default = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct SignatureConfig {
    #[builder(default = DEFAULT_FIRST_MONTH)]
    pub first_month: u32,
    #[builder(default = DEFAULT_THRESHOLD_DAYS)]
    pub threshold_days: usize,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct OutlierConfig {
    #[builder(default = DEFAULT_STD_MULTIPLIER)]
    pub std_multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct PipelineConfig {
    #[builder(default)]
    pub aggregation: AggregationConfig,
    #[builder(default)]
    pub signatures: SignatureConfig,
    #[builder(default)]
    pub outliers: OutlierConfig,
    /// Directory receiving weighted series and summary tables.
    #[builder(default = default_output_dir())]
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, SeriesDataError> {
        serde_json::from_str(json)
            .map_err(|e| SeriesDataError::ConfigParse(origin.to_path_buf(), e))
    }

    pub fn from_file(path: &Path) -> Result<Self, SeriesDataError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SeriesDataError::ConfigRead(path.to_path_buf(), e))?;
        Self::from_json_str(&json, path)
    }
}

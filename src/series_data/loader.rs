//! Reads wide daily tables: first column is the date, every other column one station.

use crate::series_data::error::SeriesDataError;
use crate::types::daily_series::{ingest_value, DailySeries, SeriesTable};
use crate::types::discharge::QualityTable;
use crate::types::landcover::LandCoverKey;
use chrono::NaiveDate;
use log::{info, warn};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads a headed CSV file into a DataFrame.
pub fn read_table(path: &Path) -> Result<DataFrame, SeriesDataError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| SeriesDataError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| SeriesDataError::CsvRead(path.to_path_buf(), e))
}

fn conversion_error(path: &Path, column: &Column) -> impl Fn(PolarsError) -> SeriesDataError {
    let path = path.to_path_buf();
    let column = column.name().to_string();
    move |source| SeriesDataError::ColumnConversion {
        path: path.clone(),
        column: column.clone(),
        source,
    }
}

fn text_column(path: &Path, column: &Column) -> Result<Vec<Option<String>>, SeriesDataError> {
    let to_err = conversion_error(path, column);
    let text = column.cast(&DataType::String).map_err(&to_err)?;
    let values = text.str().map_err(&to_err)?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

fn float_column(
    path: &Path,
    column: &Column,
    sentinel: Option<f64>,
) -> Result<Vec<Option<f64>>, SeriesDataError> {
    let to_err = conversion_error(path, column);
    let floats = column.cast(&DataType::Float64).map_err(&to_err)?;
    let values = floats.f64().map_err(&to_err)?;
    Ok(values
        .into_iter()
        .map(|v| v.and_then(|raw| ingest_value(raw, sentinel)))
        .collect())
}

fn parse_dates(path: &Path, df: &DataFrame) -> Result<Vec<NaiveDate>, SeriesDataError> {
    let column = df
        .get_columns()
        .first()
        .ok_or_else(|| SeriesDataError::MissingDateColumn(path.to_path_buf()))?;
    text_column(path, column)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.unwrap_or_default();
            let trimmed = value.trim();
            // Accept timestamps such as "2001-01-01 00:00:00" by their date part.
            let day = trimmed.get(..10).unwrap_or(trimmed);
            NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|_| SeriesDataError::InvalidDate {
                path: path.to_path_buf(),
                row,
                value: value.clone(),
            })
        })
        .collect()
}

/// Converts a wide daily frame into one series per station column.
///
/// NaN, nulls and `sentinel` become missing values.
pub fn frame_to_series_table(
    path: &Path,
    df: &DataFrame,
    sentinel: Option<f64>,
) -> Result<SeriesTable, SeriesDataError> {
    let dates = parse_dates(path, df)?;
    let mut table = SeriesTable::new();
    for column in df.get_columns().iter().skip(1) {
        let values = float_column(path, column, sentinel)?;
        if let Some(series) = DailySeries::new(column.name().as_str(), dates.clone(), values) {
            table.insert(series);
        }
    }
    Ok(table)
}

/// Loads a wide daily value table such as discharge or an aggregated meteorological variable.
pub fn load_series_table(
    path: &Path,
    sentinel: Option<f64>,
) -> Result<SeriesTable, SeriesDataError> {
    let df = read_table(path)?;
    let table = frame_to_series_table(path, &df, sentinel)?;
    info!("Loaded {} series with {} days from {:?}", table.len(), df.height(), path);
    Ok(table)
}

/// Loads a wide quality-flag table with the same layout as the discharge table.
pub fn load_quality_table(path: &Path) -> Result<QualityTable, SeriesDataError> {
    let df = read_table(path)?;
    let table = frame_to_series_table(path, &df, None)?;
    Ok(table.iter().cloned().collect())
}

/// Land-cover fractions per catchment, keyed by catchment code, in column order.
pub type LandCoverFractions = BTreeMap<String, Vec<(LandCoverKey, Option<f64>)>>;

/// Loads a catchment attribute table whose first column is the catchment code and
/// whose remaining columns are land-cover fractions named like `lulc_2015_40`.
///
/// Columns that do not follow that naming are skipped.
pub fn load_landcover_table(path: &Path) -> Result<LandCoverFractions, SeriesDataError> {
    let df = read_table(path)?;
    frame_to_landcover(path, &df)
}

fn frame_to_landcover(path: &Path, df: &DataFrame) -> Result<LandCoverFractions, SeriesDataError> {
    let code_column = df
        .get_columns()
        .first()
        .ok_or_else(|| SeriesDataError::MissingCodeColumn(path.to_path_buf()))?;
    let codes = text_column(path, code_column)?;

    let mut columns = Vec::new();
    for column in df.get_columns().iter().skip(1) {
        match column.name().as_str().parse::<LandCoverKey>() {
            Ok(key) => columns.push((key, float_column(path, column, None)?)),
            Err(e) => warn!("Skipping column in {:?}: {}", path, e),
        }
    }

    Ok(codes
        .into_iter()
        .enumerate()
        .filter_map(|(row, code)| {
            let fractions = columns
                .iter()
                .map(|(key, values)| (key.clone(), values[row]))
                .collect();
            code.map(|code| (code, fractions))
        })
        .collect())
}

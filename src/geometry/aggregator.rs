//! Area-weighted aggregation of gridded time series onto catchment polygons.
//!
//! Each grid cell is a square around its lattice point. A catchment receives the
//! cells whose square intersects its boundary, weighted by the area of that
//! intersection. At every time step the weighted mean is taken over the cells that
//! actually have a value, so a missing cell shifts its weight onto the others
//! instead of counting as zero.

use crate::geometry::error::GeometryError;
use crate::geometry::sink::SeriesSink;
use crate::types::catchment::Catchment;
use crate::types::daily_series::ingest_value;
use crate::types::grid::{CellIndex, GridAxes, GridCell, GridSource};
use geo::{Area, BooleanOps, Intersects, MultiPolygon};
use log::debug;
use polars::prelude::*;
use rstar::{RTree, AABB};

/// Number of time steps read per block when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// A grid cell selected for a catchment, with its share of the catchment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedCell {
    pub cell: GridCell,
    /// Area of the cell ∩ catchment, in squared coordinate units.
    pub intersection_area: f64,
    /// `intersection_area` divided by the sum over all selected cells.
    pub weight: f64,
}

/// Spatial index over every cell of a grid.
///
/// Build it once per grid and share it between catchments.
#[derive(Debug, Clone)]
pub struct GridIndex {
    axes: GridAxes,
    half_extent: f64,
    tree: RTree<GridCell>,
}

impl GridIndex {
    pub fn new(axes: GridAxes, half_extent: f64) -> Result<Self, GeometryError> {
        if !(half_extent.is_finite() && half_extent > 0.0) {
            return Err(GeometryError::InvalidCellExtent(half_extent));
        }
        let tree = RTree::bulk_load(axes.cells(half_extent));
        Ok(Self {
            axes,
            half_extent,
            tree,
        })
    }

    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    pub fn half_extent(&self) -> f64 {
        self.half_extent
    }

    /// Cells whose square has a non-empty intersection with the catchment, in index order.
    ///
    /// The R-tree only narrows the search down to cells overlapping the catchment's
    /// bounding box; every candidate is then tested against the boundary itself.
    pub fn intersecting_cells(&self, catchment: &Catchment) -> Vec<GridCell> {
        let Some(bbox) = catchment.bounding_rect() else {
            return Vec::new();
        };
        let envelope = AABB::from_corners(
            [bbox.min().x, bbox.min().y],
            [bbox.max().x, bbox.max().y],
        );
        let mut cells: Vec<GridCell> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|cell| cell.polygon().intersects(catchment.geometry()))
            .copied()
            .collect();
        cells.sort_by_key(|cell| cell.index);
        cells
    }

    /// Computes the fixed per-cell weights of a catchment.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoIntersectingCells`] when no cell overlaps the
    /// catchment with a positive area.
    pub fn weights(&self, catchment: &Catchment) -> Result<CellWeights, GeometryError> {
        let overlaps: Vec<(GridCell, f64)> = self
            .intersecting_cells(catchment)
            .into_iter()
            .map(|cell| {
                let square = MultiPolygon::new(vec![cell.polygon()]);
                let area = square.intersection(catchment.geometry()).unsigned_area();
                (cell, area)
            })
            // Cells touching only along an edge or corner carry no weight.
            .filter(|(_, area)| *area > 0.0)
            .collect();

        let total: f64 = overlaps.iter().map(|(_, area)| area).sum();
        if overlaps.is_empty() || total <= 0.0 {
            return Err(GeometryError::NoIntersectingCells {
                catchment: catchment.id.clone(),
            });
        }

        let cells = overlaps
            .into_iter()
            .map(|(cell, area)| WeightedCell {
                cell,
                intersection_area: area,
                weight: area / total,
            })
            .collect::<Vec<_>>();
        debug!("Catchment {} covers {} grid cells", catchment.id, cells.len());

        Ok(CellWeights {
            catchment: catchment.id.clone(),
            cells,
        })
    }

    /// Aggregates `source` onto `catchment`, streaming the result into `sink`.
    ///
    /// Returns the number of time steps written.
    pub fn aggregate<S, K>(
        &self,
        catchment: &Catchment,
        source: &S,
        sink: &mut K,
        chunk_size: usize,
        sentinel: Option<f64>,
    ) -> Result<usize, GeometryError>
    where
        S: GridSource + ?Sized,
        K: SeriesSink + ?Sized,
    {
        self.check_source(source)?;
        self.weights(catchment)?
            .stream(source, sink, chunk_size, sentinel)
    }

    /// Fails when `source` is not laid out on this index's axes.
    pub fn check_source<S: GridSource + ?Sized>(&self, source: &S) -> Result<(), GeometryError> {
        let shape = source.shape();
        if shape.rows != self.axes.rows() || shape.cols != self.axes.cols() {
            return Err(GeometryError::AxesMismatch {
                source_rows: shape.rows,
                source_cols: shape.cols,
                axes_rows: self.axes.rows(),
                axes_cols: self.axes.cols(),
            });
        }
        Ok(())
    }
}

/// The selected cells of one catchment and their weights.
#[derive(Debug, Clone, PartialEq)]
pub struct CellWeights {
    catchment: String,
    cells: Vec<WeightedCell>,
}

impl CellWeights {
    pub fn catchment(&self) -> &str {
        &self.catchment
    }

    pub fn cells(&self) -> &[WeightedCell] {
        &self.cells
    }

    pub fn indices(&self) -> Vec<CellIndex> {
        self.cells.iter().map(|c| c.cell.index).collect()
    }

    /// Weighted mean over the cells that have a value, renormalising the weights
    /// of those cells to one. `None` when no cell has a value.
    ///
    /// `values` must be in the order of [`CellWeights::cells`].
    pub fn combine(&self, values: &[Option<f64>]) -> Option<f64> {
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for (cell, value) in self.cells.iter().zip(values) {
            if let Some(v) = value {
                weighted_sum += cell.weight * v;
                weight_sum += cell.weight;
            }
        }
        if weight_sum > 0.0 {
            Some(weighted_sum / weight_sum)
        } else {
            None
        }
    }

    /// Reads `source` in blocks of `chunk_size` time steps and writes one
    /// combined value per step to `sink`.
    pub fn stream<S, K>(
        &self,
        source: &S,
        sink: &mut K,
        chunk_size: usize,
        sentinel: Option<f64>,
    ) -> Result<usize, GeometryError>
    where
        S: GridSource + ?Sized,
        K: SeriesSink + ?Sized,
    {
        if chunk_size == 0 {
            return Err(GeometryError::InvalidChunkSize);
        }
        let indices = self.indices();
        let n_time = source.shape().time;
        let mut row = vec![None; indices.len()];

        let mut start = 0;
        while start < n_time {
            let end = (start + chunk_size).min(n_time);
            let block = source.read_block(start..end, &indices)?;
            let combined: Vec<Option<f64>> = block
                .chunks(indices.len())
                .map(|raw| {
                    for (slot, value) in row.iter_mut().zip(raw) {
                        *slot = ingest_value(*value, sentinel);
                    }
                    self.combine(&row)
                })
                .collect();
            sink.write_chunk(&combined)?;
            start = end;
        }
        sink.finish()?;
        Ok(n_time)
    }

    /// Lists the selected cells: `row, col, lat, lon, intersection_area, weight`.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let rows: Vec<u32> = self.cells.iter().map(|c| c.cell.index.row as u32).collect();
        let cols: Vec<u32> = self.cells.iter().map(|c| c.cell.index.col as u32).collect();
        let lats: Vec<f64> = self.cells.iter().map(|c| c.cell.lat).collect();
        let lons: Vec<f64> = self.cells.iter().map(|c| c.cell.lon).collect();
        let areas: Vec<f64> = self.cells.iter().map(|c| c.intersection_area).collect();
        let weights: Vec<f64> = self.cells.iter().map(|c| c.weight).collect();
        DataFrame::new(vec![
            Column::new("row".into(), rows),
            Column::new("col".into(), cols),
            Column::new("lat".into(), lats),
            Column::new("lon".into(), lons),
            Column::new("intersection_area".into(), areas),
            Column::new("weight".into(), weights),
        ])
    }
}

/// Aggregates a whole gridded variable onto one catchment, in memory.
pub fn aggregate<S: GridSource + ?Sized>(
    catchment: &Catchment,
    axes: &GridAxes,
    source: &S,
    cell_half_extent: f64,
) -> Result<Vec<Option<f64>>, GeometryError> {
    let index = GridIndex::new(axes.clone(), cell_half_extent)?;
    let mut series = Vec::with_capacity(source.shape().time);
    index.aggregate(
        catchment,
        source,
        &mut series,
        DEFAULT_CHUNK_SIZE,
        Some(crate::types::daily_series::MISSING_SENTINEL),
    )?;
    Ok(series)
}

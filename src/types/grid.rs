//! Regular lat/lon lattice of square cells, and access to gridded values.
//!
//! Coordinates follow the `geo` convention: `x` is longitude, `y` is latitude.

use crate::geometry::error::GeometryError;
use geo::{Polygon, Rect};
use rstar::{RTreeObject, AABB};
use std::ops::Range;

/// Half the side of a 0.25° cell.
pub const DEFAULT_CELL_HALF_EXTENT: f64 = 0.125;

/// Position of a cell on the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

/// Coordinate vectors of a regular grid: one latitude per row, one longitude per column.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
}

impl GridAxes {
    pub fn new(latitudes: Vec<f64>, longitudes: Vec<f64>) -> Result<Self, GeometryError> {
        if latitudes.is_empty() {
            return Err(GeometryError::EmptyAxis("latitude"));
        }
        if longitudes.is_empty() {
            return Err(GeometryError::EmptyAxis("longitude"));
        }
        Ok(Self {
            latitudes,
            longitudes,
        })
    }

    pub fn rows(&self) -> usize {
        self.latitudes.len()
    }

    pub fn cols(&self) -> usize {
        self.longitudes.len()
    }

    /// Builds every cell of the lattice, row-major.
    pub fn cells(&self, half_extent: f64) -> Vec<GridCell> {
        let mut cells = Vec::with_capacity(self.rows() * self.cols());
        for (row, lat) in self.latitudes.iter().enumerate() {
            for (col, lon) in self.longitudes.iter().enumerate() {
                cells.push(GridCell {
                    index: CellIndex { row, col },
                    lat: *lat,
                    lon: *lon,
                    half_extent,
                });
            }
        }
        cells
    }
}

/// A square cell centred on a lattice point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub index: CellIndex,
    pub lat: f64,
    pub lon: f64,
    pub half_extent: f64,
}

impl GridCell {
    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            (self.lon - self.half_extent, self.lat - self.half_extent),
            (self.lon + self.half_extent, self.lat + self.half_extent),
        )
    }

    pub fn polygon(&self) -> Polygon<f64> {
        self.rect().to_polygon()
    }
}

/// Lets the cell index answer envelope queries with the cell's square footprint.
impl RTreeObject for GridCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.lon - self.half_extent, self.lat - self.half_extent],
            [self.lon + self.half_extent, self.lat + self.half_extent],
        )
    }
}

/// Extent of a gridded variable: `time × rows × cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub time: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Read access to a gridded variable shaped `[time, lat_idx, lon_idx]`.
///
/// Implementations are free to keep the array on disk; the aggregator only ever
/// asks for a contiguous block of time steps at a fixed set of cells.
pub trait GridSource {
    fn shape(&self) -> GridShape;

    /// Raw values for `time` at `cells`, laid out `[t][cell]` in the order of `cells`.
    ///
    /// Missing samples are returned as they are stored (sentinel or NaN).
    fn read_block(
        &self,
        time: Range<usize>,
        cells: &[CellIndex],
    ) -> Result<Vec<f64>, GeometryError>;
}

/// Gridded variable held in one row-major buffer.
#[derive(Debug, Clone)]
pub struct InMemoryGrid {
    shape: GridShape,
    values: Vec<f64>,
}

impl InMemoryGrid {
    pub fn new(shape: GridShape, values: Vec<f64>) -> Result<Self, GeometryError> {
        let expected = shape.time * shape.rows * shape.cols;
        if values.len() != expected {
            return Err(GeometryError::GridShapeMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    fn offset(&self, t: usize, cell: CellIndex) -> usize {
        (t * self.shape.rows + cell.row) * self.shape.cols + cell.col
    }
}

impl GridSource for InMemoryGrid {
    fn shape(&self) -> GridShape {
        self.shape
    }

    fn read_block(
        &self,
        time: Range<usize>,
        cells: &[CellIndex],
    ) -> Result<Vec<f64>, GeometryError> {
        if time.end > self.shape.time || time.start > time.end {
            return Err(GeometryError::ChunkOutOfRange {
                start: time.start,
                end: time.end,
                len: self.shape.time,
            });
        }
        let mut block = Vec::with_capacity(time.len() * cells.len());
        for t in time {
            for cell in cells {
                if cell.row >= self.shape.rows || cell.col >= self.shape.cols {
                    return Err(GeometryError::CellOutOfRange(*cell));
                }
                block.push(self.values[self.offset(t, *cell)]);
            }
        }
        Ok(block)
    }
}

mod audit;
mod batch;
mod config;
mod error;
mod geometry;
mod pipeline;
mod series_data;
mod signatures;
mod types;

pub use error::EstreamsError;
pub use pipeline::*;

pub use config::*;

pub use batch::*;

pub use types::catchment::*;
pub use types::daily_series::*;
pub use types::discharge::*;
pub use types::grid::*;
pub use types::hydro_year::*;
pub use types::landcover::*;

pub use geometry::aggregator::*;
pub use geometry::counting::*;
pub use geometry::projection::*;
pub use geometry::shape::*;
pub use geometry::sink::*;

pub use signatures::grouping::*;
pub use signatures::indices::*;
pub use signatures::reducers::*;
pub use signatures::table::*;

pub use audit::completeness::*;
pub use audit::outliers::*;

pub use series_data::loader::*;
pub use series_data::writer::*;

pub use audit::error::AuditError;
pub use geometry::error::GeometryError;
pub use series_data::error::SeriesDataError;
pub use signatures::error::SignatureError;

pub mod catchment;
pub mod daily_series;
pub mod discharge;
pub mod grid;
pub mod hydro_year;
pub mod landcover;

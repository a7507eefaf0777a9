pub mod error;
pub mod grouping;
pub mod indices;
pub mod reducers;
pub mod table;

pub mod aggregator;
pub mod counting;
pub mod error;
pub mod projection;
pub mod shape;
pub mod sink;

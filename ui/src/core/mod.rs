//! Platform-agnostic data handling: table model, payload normalization,
//! aggregation, formatting and configuration.

pub mod config;
pub mod format;
pub mod normalize;
pub mod platform;
pub mod series;
pub mod table;

pub use normalize::normalize;
pub use series::{aggregate, SeriesPoint, SeriesSummary};
pub use table::{Column, Row, Table};

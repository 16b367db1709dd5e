//! Shared crate for the Sigma bar chart widget. Data handling, the host message
//! bridge, the chart renderer and the widget view all live here; the `web`
//! crate only launches it.

pub mod bridge;
pub mod chart;
pub mod core;
pub mod views;

pub use views::ChartWidget;

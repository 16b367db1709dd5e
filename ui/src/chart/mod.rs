//! Bar chart rendering: scales, per-frame scene layout, the chart state model
//! and the Dioxus component that draws it as SVG.

mod model;
pub mod scale;
pub mod scene;
mod view;

pub use model::{BarChartModel, Tooltip, EMPTY_SERIES_MESSAGE, LISTENING_MESSAGE};
pub use scene::{BarShape, CategoryLabel, ChartScene, Gridline, PlotArea};
pub use view::BarChart;

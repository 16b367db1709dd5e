mod widget;
pub use widget::{ChartWidget, INITIAL_STATUS};

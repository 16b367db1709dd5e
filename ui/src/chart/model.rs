use crate::core::format::{format_number, NumberLocale};
use crate::core::series::SeriesPoint;

use super::scene::ChartScene;

pub const LISTENING_MESSAGE: &str = "Listening for Sigma data…";
pub const EMPTY_SERIES_MESSAGE: &str = "Add a numeric measure to your Sigma dataset to render bars.";

/// Floating label shown while the pointer is over a bar. Coordinates are
/// relative to the chart container.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub category: String,
    pub value_label: String,
    pub x: f64,
    pub y: f64,
}

/// Chart state: the current series, container size, placeholder message and
/// hover tooltip. Every call to [`BarChartModel::scene`] is a full relayout.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartModel {
    series: Vec<SeriesPoint>,
    width: f64,
    height: f64,
    message: Option<String>,
    tooltip: Option<Tooltip>,
    locale: NumberLocale,
}

impl BarChartModel {
    pub fn new(locale: NumberLocale) -> Self {
        Self {
            series: Vec::new(),
            width: 0.0,
            height: 0.0,
            message: Some(LISTENING_MESSAGE.to_string()),
            tooltip: None,
            locale,
        }
    }

    pub fn set_data(&mut self, series: Vec<SeriesPoint>) {
        self.series = series;
        self.tooltip = None;
        if self.series.is_empty() {
            self.show_message(EMPTY_SERIES_MESSAGE);
        } else {
            self.hide_message();
        }
    }

    pub fn series(&self) -> &[SeriesPoint] {
        &self.series
    }

    pub fn show_message(&mut self, text: impl Into<String>) {
        self.message = Some(text.into());
    }

    pub fn hide_message(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// `None` when there is nothing to draw and the surface should be cleared.
    pub fn scene(&self) -> Option<ChartScene> {
        if self.series.is_empty() {
            return None;
        }
        Some(ChartScene::build(
            &self.series,
            self.width,
            self.height,
            self.locale,
        ))
    }

    pub fn hover(&mut self, point: &SeriesPoint, x: f64, y: f64) {
        self.tooltip = Some(Tooltip {
            category: point.category.clone(),
            value_label: format_number(point.value, self.locale),
            x,
            y,
        });
    }

    /// Follow the pointer while a tooltip is visible.
    pub fn track(&mut self, x: f64, y: f64) {
        if let Some(tooltip) = self.tooltip.as_mut() {
            tooltip.x = x;
            tooltip.y = y;
        }
    }

    pub fn leave(&mut self) {
        self.tooltip = None;
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }
}

impl Default for BarChartModel {
    fn default() -> Self {
        Self::new(NumberLocale::default())
    }
}

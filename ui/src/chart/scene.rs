//! Geometry for one frame of the bar chart, independent of the DOM.

use std::fmt::Write as _;

use crate::core::format::{format_number, NumberLocale};
use crate::core::series::SeriesPoint;

use super::scale::{ticks, BandScale, LinearScale, CHART_PADDING};

pub const FALLBACK_WIDTH: f64 = 300.0;
pub const FALLBACK_HEIGHT: f64 = 240.0;
pub const MAX_BAR_WIDTH: f64 = 60.0;
pub const BAR_BAND_RATIO: f64 = 0.8;
pub const BAR_RADIUS: f64 = 6.0;
pub const TICK_INTERVALS: usize = 4;
pub const ROTATE_LABELS_AFTER: usize = 6;
pub const LABEL_ROTATION_DEG: f64 = -35.0;
pub const GRADIENT_ID: &str = "barGradient";

const MIN_PLOT_EXTENT: f64 = 10.0;
const LABEL_BASELINE_OFFSET: f64 = 12.0;
const TICK_LABEL_GAP: f64 = 12.0;
const TICK_LABEL_NUDGE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gridline {
    pub value: f64,
    pub y: f64,
    pub label: String,
    /// Baseline of the tick label, nudged below the line.
    pub label_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub point: SeriesPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
    /// Degrees, applied around (`x`, `y`).
    pub rotation: Option<f64>,
}

impl CategoryLabel {
    pub fn transform(&self) -> Option<String> {
        self.rotation
            .map(|deg| format!("rotate({deg} {} {})", self.x, self.y))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartScene {
    pub width: f64,
    pub height: f64,
    pub plot: PlotArea,
    pub gridlines: Vec<Gridline>,
    pub bars: Vec<BarShape>,
    pub labels: Vec<CategoryLabel>,
}

impl ChartScene {
    /// Lay out `series` in a `width` × `height` container. Zero dimensions (a
    /// hidden container) fall back to 300 × 240.
    pub fn build(series: &[SeriesPoint], width: f64, height: f64, locale: NumberLocale) -> Self {
        let width = if width > 0.0 { width } else { FALLBACK_WIDTH };
        let height = if height > 0.0 { height } else { FALLBACK_HEIGHT };
        let pad = CHART_PADDING;

        let plot = PlotArea {
            left: pad.left,
            top: pad.top,
            width: (width - pad.left - pad.right).max(MIN_PLOT_EXTENT),
            height: (height - pad.top - pad.bottom).max(MIN_PLOT_EXTENT),
        };

        let max_value = series.iter().map(|p| p.value).fold(0.0_f64, f64::max);
        let y_scale = LinearScale::new(max_value, plot.bottom(), plot.top);
        let x_scale = BandScale::new(plot.left, plot.width, series.len());

        let gridlines = ticks(max_value, TICK_INTERVALS)
            .into_iter()
            .map(|value| {
                let y = y_scale.map(value);
                Gridline {
                    value,
                    y,
                    label: format_number(value, locale),
                    label_y: y + TICK_LABEL_NUDGE,
                }
            })
            .collect();

        let bar_width = MAX_BAR_WIDTH.min(x_scale.step() * BAR_BAND_RATIO);
        let rotation = (series.len() > ROTATE_LABELS_AFTER).then_some(LABEL_ROTATION_DEG);
        let label_y = height - LABEL_BASELINE_OFFSET;

        let mut bars = Vec::with_capacity(series.len());
        let mut labels = Vec::with_capacity(series.len());
        for (index, point) in series.iter().enumerate() {
            let center = x_scale.center(index);
            let top = y_scale.map(point.value);
            bars.push(BarShape {
                x: center - bar_width / 2.0,
                y: top,
                width: bar_width,
                height: (plot.bottom() - top).max(0.0),
                point: point.clone(),
            });
            labels.push(CategoryLabel {
                x: center,
                y: label_y,
                text: point.category.clone(),
                rotation,
            });
        }

        Self {
            width,
            height,
            plot,
            gridlines,
            bars,
            labels,
        }
    }

    pub fn view_box(&self) -> String {
        format!("0 0 {} {}", self.width, self.height)
    }

    pub fn tick_label_x(&self) -> f64 {
        self.plot.left - TICK_LABEL_GAP
    }

    /// Standalone SVG document for snapshots.
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{}\">",
            self.view_box()
        );
        let _ = writeln!(
            svg,
            "  <g stroke=\"#d0d5dd\" stroke-width=\"1\" fill=\"none\">"
        );
        for line in &self.gridlines {
            let _ = writeln!(
                svg,
                "    <line x1=\"{}\" x2=\"{}\" y1=\"{y}\" y2=\"{y}\" stroke=\"#e4e7ec\"/>",
                self.plot.left,
                self.plot.right(),
                y = line.y
            );
            let _ = writeln!(
                svg,
                "    <text x=\"{}\" y=\"{}\" text-anchor=\"end\" fill=\"#475467\" font-size=\"12\">{}</text>",
                self.tick_label_x(),
                line.label_y,
                escape_xml(&line.label)
            );
        }
        svg.push_str("  </g>\n");
        let _ = writeln!(
            svg,
            "  <defs><linearGradient id=\"{GRADIENT_ID}\" x1=\"0%\" x2=\"0%\" y1=\"0%\" y2=\"100%\">\
             <stop offset=\"0%\" stop-color=\"#6366f1\" stop-opacity=\"0.95\"/>\
             <stop offset=\"100%\" stop-color=\"#4f46e5\" stop-opacity=\"0.8\"/>\
             </linearGradient></defs>"
        );
        svg.push_str("  <g>\n");
        for (bar, label) in self.bars.iter().zip(&self.labels) {
            let _ = writeln!(
                svg,
                "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{BAR_RADIUS}\" fill=\"url(#{GRADIENT_ID})\" data-category=\"{}\" data-value=\"{}\"/>",
                bar.x,
                bar.y,
                bar.width,
                bar.height,
                escape_xml(&bar.point.category),
                bar.point.value
            );
            let transform = label
                .transform()
                .map(|t| format!(" transform=\"{t}\""))
                .unwrap_or_default();
            let _ = writeln!(
                svg,
                "    <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" fill=\"#475467\" font-size=\"12\"{transform}>{}</text>",
                label.x,
                label.y,
                escape_xml(&label.text)
            );
        }
        svg.push_str("  </g>\n</svg>\n");
        svg
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

//! Pixel scales for the bar chart.

/// Insets between the container edge and the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const CHART_PADDING: Padding = Padding {
    top: 12.0,
    right: 24.0,
    bottom: 42.0,
    left: 64.0,
};

/// Maps `[0, max]` linearly onto `[bottom, top]` (SVG y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    max: f64,
    bottom: f64,
    top: f64,
}

impl LinearScale {
    pub fn new(max: f64, bottom: f64, top: f64) -> Self {
        Self {
            max: max.max(0.0),
            bottom,
            top,
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        if self.max == 0.0 {
            return self.bottom;
        }
        self.bottom - (value / self.max) * (self.bottom - self.top)
    }
}

/// Equal-width bands, one per category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    start: f64,
    step: f64,
}

impl BandScale {
    pub fn new(start: f64, extent: f64, count: usize) -> Self {
        let step = if count == 0 { 0.0 } else { extent / count as f64 };
        Self { start, step }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn center(&self, index: usize) -> f64 {
        self.start + self.step * index as f64 + self.step / 2.0
    }
}

/// `intervals + 1` tick values from 0 to `max`, rounded to whole numbers.
pub fn ticks(max: f64, intervals: usize) -> Vec<f64> {
    if max <= 0.0 || intervals == 0 {
        return vec![0.0];
    }
    let step = max / intervals as f64;
    (0..=intervals).map(|i| (step * i as f64).round()).collect()
}

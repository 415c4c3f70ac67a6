//! Rolling sample windows and the sparkline paths drawn from them.

use std::collections::VecDeque;
use std::fmt::Write;

use serde::Serialize;

pub const HISTORY_SIZE: usize = 20;

/// Canvas the sparkline paths are drawn on.
pub const CHART_WIDTH: f64 = 100.0;
pub const CHART_HEIGHT: f64 = 50.0;

/// Fixed-length FIFO window. Prefilled at construction so `len()` never changes.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    window: VecDeque<f64>,
    size: usize,
}

impl HistoryBuffer {
    pub fn prefilled(size: usize, fill: f64) -> Self {
        Self {
            window: std::iter::repeat(fill).take(size).collect(),
            size,
        }
    }

    /// Append `value`, evicting the oldest sample.
    pub fn push(&mut self, value: f64) {
        if self.size == 0 {
            return;
        }
        self.window.push_back(value);
        while self.window.len() > self.size {
            self.window.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.window.back().copied()
    }

    /// Oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.window.iter().copied().collect()
    }

    pub fn render(&self, max_value: f64, mode: ChartMode) -> String {
        if self.is_empty() {
            return String::new();
        }
        render_sparkline(&self.values(), max_value, mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    /// Open polyline.
    Line,
    /// Polyline closed down to the baseline.
    Area,
}

fn y_for(value: f64, max_value: f64) -> f64 {
    if !value.is_finite() || !max_value.is_finite() || max_value <= 0.0 {
        return CHART_HEIGHT;
    }
    let v = value.clamp(0.0, max_value);
    CHART_HEIGHT - (v / max_value) * CHART_HEIGHT
}

/// SVG path data for `values` scaled into the chart canvas.
///
/// Values are clamped to `[0, max_value]`; anything non-finite sits on the
/// baseline. Never fails.
pub fn render_sparkline(values: &[f64], max_value: f64, mode: ChartMode) -> String {
    if values.is_empty() {
        return String::new();
    }
    let last = (values.len().max(2) - 1) as f64;

    let mut path = format!("M 0 {}", y_for(values[0], max_value));
    for (i, v) in values.iter().enumerate().skip(1) {
        let _ = write!(
            path,
            " L {} {}",
            i as f64 * CHART_WIDTH / last,
            y_for(*v, max_value)
        );
    }
    if mode == ChartMode::Area {
        let _ = write!(
            path,
            " L {} {} L 0 {} Z",
            CHART_WIDTH, CHART_HEIGHT, CHART_HEIGHT
        );
    }
    path
}

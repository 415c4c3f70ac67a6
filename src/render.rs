//! Renderer input contract and the two renderers shipped with the binary.
//!
//! Renderers only read. Visual mapping (colors, CSS classes, SVG attributes)
//! belongs to whoever consumes the snapshot.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::feed::Density;
use crate::history::ChartMode;
use crate::logging::{log, Domain, Level};
use crate::signal::{Lamps, Phase};
use crate::state::{Config, DashboardState, RendererKind};
use crate::stats::VehicleBreakdown;

pub const COUNT_CHART_MODE: ChartMode = ChartMode::Line;
pub const DENSITY_CHART_MODE: ChartMode = ChartMode::Area;

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: Phase,
    pub lamps: Lamps,
    pub remaining: u32,
    pub max_duration: u32,
    /// remaining / max, drives the countdown gauge.
    pub gauge: f64,
    /// (max - remaining) / max * 100.
    pub phase_progress_pct: f64,
    pub cycle_count: u64,
    pub vehicle_count: u64,
    pub density: Density,
    pub count_path: String,
    pub density_path: String,
    pub count_history: Vec<f64>,
    pub density_history: Vec<f64>,
    pub avg_density: Option<Density>,
    pub runtime: String,
    pub total_vehicles: u64,
    pub breakdown: VehicleBreakdown,
}

impl Snapshot {
    pub fn capture(state: &DashboardState, cfg: &Config) -> Self {
        let remaining = state.clock.remaining();
        let max_duration = state.clock.max_duration();
        let max = max_duration.max(1) as f64;
        Self {
            tick: state.tick,
            phase: state.clock.phase(),
            lamps: state.clock.phase().lamps(),
            remaining,
            max_duration,
            gauge: remaining as f64 / max,
            phase_progress_pct: (max - remaining as f64) / max * 100.0,
            cycle_count: state.clock.cycles(),
            vehicle_count: state.latest.vehicle_count,
            density: state.latest.density,
            count_path: state.count_history.render(cfg.count_chart_max, COUNT_CHART_MODE),
            density_path: state
                .density_history
                .render(cfg.density_chart_max, DENSITY_CHART_MODE),
            count_history: state.count_history.values(),
            density_history: state.density_history.values(),
            avg_density: state.stats.average_density(),
            runtime: state.stats.runtime(),
            total_vehicles: state.stats.vehicle_total(),
            breakdown: VehicleBreakdown::from_total(state.latest.vehicle_count),
        }
    }
}

pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Emits each snapshot as a structured log record.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        let fields = match serde_json::to_value(snapshot)? {
            Value::Object(map) => map,
            _ => return Ok(()),
        };
        log(Level::Info, Domain::Render, "snapshot", fields);
        Ok(())
    }
}

/// One status block per tick on stderr.
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn lamp_row(lamps: Lamps) -> String {
        let dot = |on: bool, c: char| if on { c } else { '.' };
        format!(
            "[{}{}{}]",
            dot(lamps.red, 'R'),
            dot(lamps.yellow, 'Y'),
            dot(lamps.green, 'G')
        )
    }

    pub fn format(snapshot: &Snapshot) -> String {
        let avg = snapshot.avg_density.map(|d| d.as_str()).unwrap_or("--");
        let b = snapshot.breakdown;
        format!(
            "[TICK {}] {} {:<6} {:>2}/{:<2}s cycles={} runtime={}\n  \
             [TRAFFIC] now={} density={} avg={} total={}\n  \
             [TYPES] car={} bus={} truck={} bike={}",
            snapshot.tick,
            Self::lamp_row(snapshot.lamps),
            snapshot.phase.as_str(),
            snapshot.remaining,
            snapshot.max_duration,
            snapshot.cycle_count,
            snapshot.runtime,
            snapshot.vehicle_count,
            snapshot.density.as_str(),
            avg,
            snapshot.total_vehicles,
            b.car,
            b.bus,
            b.truck,
            b.bike,
        )
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        eprintln!("{}", Self::format(snapshot));
        Ok(())
    }
}

pub fn build_renderer(kind: RendererKind) -> Box<dyn Renderer + Send> {
    match kind {
        RendererKind::Console => Box::new(ConsoleRenderer),
        RendererKind::Json => Box::new(LogRenderer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StatusSample;

    fn fresh() -> (DashboardState, Config) {
        let cfg = Config::default();
        (DashboardState::new(&cfg), cfg)
    }

    #[test]
    fn test_initial_snapshot() {
        let (state, cfg) = fresh();
        let snap = Snapshot::capture(&state, &cfg);
        assert_eq!(snap.phase, Phase::Red);
        assert!(snap.lamps.red && !snap.lamps.green);
        assert_eq!(snap.remaining, 2);
        assert_eq!(snap.max_duration, 2);
        assert_eq!(snap.gauge, 1.0);
        assert_eq!(snap.phase_progress_pct, 0.0);
        assert_eq!(snap.avg_density, None);
        assert_eq!(snap.runtime, "00:00");
        assert!(!snap.count_path.contains('Z'));
        assert!(snap.density_path.ends_with('Z'));
        assert_eq!(snap.count_history.len(), 20);
    }

    #[test]
    fn test_gauge_and_progress() {
        let (mut state, cfg) = fresh();
        state.clock.advance();
        let snap = Snapshot::capture(&state, &cfg);
        assert_eq!(snap.remaining, 1);
        assert_eq!(snap.gauge, 0.5);
        assert_eq!(snap.phase_progress_pct, 50.0);
    }

    #[test]
    fn test_breakdown_tracks_latest_sample() {
        let (mut state, cfg) = fresh();
        state.latest = StatusSample::new(100, Density::High);
        let snap = Snapshot::capture(&state, &cfg);
        assert_eq!(snap.breakdown.car, 60);
        assert_eq!(snap.breakdown.bike, 15);
    }

    #[test]
    fn test_snapshot_serializes_for_renderers() {
        let (state, cfg) = fresh();
        let v = serde_json::to_value(Snapshot::capture(&state, &cfg)).unwrap();
        assert_eq!(v["phase"], "RED");
        assert_eq!(v["density"], "LOW");
        assert_eq!(v["lamps"]["red"], true);
        assert!(v["avg_density"].is_null());
    }

    #[test]
    fn test_console_format() {
        let (state, cfg) = fresh();
        let text = ConsoleRenderer::format(&Snapshot::capture(&state, &cfg));
        assert!(text.starts_with("[TICK 0] [R..] RED"));
        assert!(text.contains("avg=--"));
        assert!(text.contains("car=0 bus=0 truck=0 bike=0"));
    }
}

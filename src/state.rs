use crate::feed::{Density, StatusSample};
use crate::history::{HistoryBuffer, HISTORY_SIZE};
use crate::signal::{PhaseClock, PhaseTimings};
use crate::stats::Aggregator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Console,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Status endpoint. Unset runs against the built-in simulator.
    pub status_url: Option<String>,
    pub tick_ms: u64,
    pub history_size: usize,
    pub count_chart_max: f64,
    pub density_chart_max: f64,
    /// HTTP timeout. Unset means requests are never cut off.
    pub fetch_timeout_secs: Option<u64>,
    /// Samples whose `last_update` is older than this are logged as stale.
    pub stale_after_secs: f64,
    /// Retune green time from the running average density.
    pub adaptive_green: bool,
    pub rng_seed: Option<u64>,
    /// Stop after this many ticks. Unset runs forever.
    pub max_ticks: Option<u64>,
    pub renderer: RendererKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            status_url: None,
            tick_ms: 1_000,
            history_size: HISTORY_SIZE,
            count_chart_max: 50.0,
            density_chart_max: 3.0,
            fetch_timeout_secs: None,
            stale_after_secs: 5.0,
            adaptive_green: false,
            rng_seed: None,
            max_ticks: None,
            renderer: RendererKind::Console,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            status_url: std::env::var("STATUS_URL").ok().filter(|v| !v.trim().is_empty()),
            tick_ms: std::env::var("TICK_MS").ok().and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(d.tick_ms),
            history_size: std::env::var("HISTORY_SIZE").ok().and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(d.history_size),
            count_chart_max: std::env::var("COUNT_CHART_MAX").ok().and_then(|v| v.parse().ok()).unwrap_or(d.count_chart_max),
            density_chart_max: std::env::var("DENSITY_CHART_MAX").ok().and_then(|v| v.parse().ok()).unwrap_or(d.density_chart_max),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()),
            stale_after_secs: std::env::var("STALE_AFTER_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.stale_after_secs),
            adaptive_green: std::env::var("ADAPTIVE_GREEN").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(d.adaptive_green),
            rng_seed: std::env::var("RNG_SEED").ok().and_then(|v| v.parse().ok()),
            max_ticks: std::env::var("MAX_TICKS").ok().and_then(|v| v.parse().ok()),
            renderer: match std::env::var("RENDERER").unwrap_or_default().to_lowercase().as_str() {
                "json" => RendererKind::Json,
                _ => d.renderer,
            },
        }
    }
}

/// All mutable dashboard state, owned by the monitor.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub clock: PhaseClock,
    pub count_history: HistoryBuffer,
    pub density_history: HistoryBuffer,
    pub stats: Aggregator,
    /// Most recently applied sample.
    pub latest: StatusSample,
    pub samples_applied: u64,
    pub tick: u64,
}

impl DashboardState {
    pub fn new(cfg: &Config) -> Self {
        Self {
            clock: PhaseClock::new(PhaseTimings::default()),
            count_history: HistoryBuffer::prefilled(cfg.history_size, 0.0),
            density_history: HistoryBuffer::prefilled(
                cfg.history_size,
                Density::Low.level() as f64,
            ),
            stats: Aggregator::new(),
            latest: StatusSample::default(),
            samples_applied: 0,
            tick: 0,
        }
    }
}

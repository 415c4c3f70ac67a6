//! Tick-driven controller.
//!
//! One task owns `DashboardState`. It alternates between two handlers: the
//! one-second tick (advance the clock, count runtime, issue a fetch, render)
//! and fetch completion (apply one resolved sample). Both run on the same
//! task, so they never overlap and the state needs no lock.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::feed::{Density, StatusSample};
use crate::ingest::{FetchOutcome, SampleIngestor};
use crate::logging::{
    log, log_fetch_failed, log_phase_change, log_sample, obj, ts_epoch_secs, v_num, v_str,
    Domain, Level,
};
use crate::render::{Renderer, Snapshot};
use crate::signal::{PhaseTick, PhaseTimings};
use crate::state::{Config, DashboardState};
use crate::stats::{ArrivalSource, RandomArrivals};

pub struct Monitor {
    cfg: Config,
    state: DashboardState,
    arrivals: Box<dyn ArrivalSource + Send>,
}

impl Monitor {
    pub fn new(cfg: Config, arrivals: Box<dyn ArrivalSource + Send>) -> Self {
        let state = DashboardState::new(&cfg);
        Self {
            cfg,
            state,
            arrivals,
        }
    }

    /// Arrivals drawn from `RNG_SEED` when set, entropy otherwise.
    pub fn from_config(cfg: Config) -> Self {
        let rng = match cfg.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(cfg, Box::new(RandomArrivals::new(rng)))
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Tick handler minus the fetch: advance the clock and the runtime.
    pub fn on_tick(&mut self) -> PhaseTick {
        self.state.tick += 1;
        let tick = self.state.clock.advance();
        if tick.changed {
            log_phase_change(
                self.state.tick,
                tick.phase.as_str(),
                tick.max_duration,
                self.state.clock.cycles(),
            );
        }
        if tick.cycle_completed {
            log(
                Level::Info,
                Domain::Signal,
                "cycle_completed",
                obj(&[
                    ("tick", json!(self.state.tick)),
                    ("cycles", json!(self.state.clock.cycles())),
                ]),
            );
        }
        self.state.stats.tick_runtime();
        tick
    }

    /// Fetch-completion handler. A failed fetch is logged and changes nothing.
    /// Returns whether a sample was applied.
    pub fn apply_outcome(&mut self, outcome: FetchOutcome) -> bool {
        match outcome.result {
            Ok(sample) => {
                self.apply_sample(outcome.tick, sample);
                true
            }
            Err(e) => {
                log_fetch_failed(outcome.tick, &format!("{:#}", e));
                false
            }
        }
    }

    pub fn apply_sample(&mut self, issued_tick: u64, sample: StatusSample) {
        if let Some(age) = sample.age_secs(ts_epoch_secs()) {
            if age > self.cfg.stale_after_secs {
                log(
                    Level::Warn,
                    Domain::Ingest,
                    "stale_sample",
                    obj(&[
                        ("tick", json!(issued_tick)),
                        ("age_secs", v_num(age)),
                        ("threshold_secs", v_num(self.cfg.stale_after_secs)),
                    ]),
                );
            }
        }
        log_sample(issued_tick, sample.vehicle_count, sample.density.as_str());

        let st = &mut self.state;
        st.latest = sample;
        st.count_history.push(sample.vehicle_count as f64);
        st.density_history.push(sample.density.level() as f64);
        st.stats.record_density(sample.density);
        st.stats.record_vehicle_total(self.arrivals.as_mut());
        st.samples_applied += 1;

        if self.cfg.adaptive_green {
            self.retune_green(issued_tick, sample.density);
        }
    }

    /// Green time follows the latest reading, not the running average.
    /// Takes effect on the next GREEN entry.
    fn retune_green(&mut self, issued_tick: u64, density: Density) {
        let green = PhaseTimings::green_for(density);
        if self.state.clock.timings().green != green {
            self.state.clock.set_green(green);
            log(
                Level::Info,
                Domain::Signal,
                "green_retuned",
                obj(&[
                    ("tick", json!(issued_tick)),
                    ("density", v_str(density.as_str())),
                    ("green_secs", json!(green)),
                ]),
            );
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, &self.cfg)
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        if let Err(e) = renderer.render(&self.snapshot()) {
            log(
                Level::Warn,
                Domain::Render,
                "render_failed",
                obj(&[("tick", json!(self.state.tick)), ("error", v_str(&e.to_string()))]),
            );
        }
    }

    /// Main loop. Returns after `max_ticks` ticks when configured, otherwise
    /// runs until the task is dropped.
    pub async fn run(
        &mut self,
        ingestor: &SampleIngestor,
        outcomes: &mut mpsc::UnboundedReceiver<FetchOutcome>,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        log(
            Level::Info,
            Domain::System,
            "start",
            obj(&[
                ("source", v_str(ingestor.source_name())),
                ("tick_ms", json!(self.cfg.tick_ms)),
                ("history_size", json!(self.cfg.history_size)),
                ("adaptive_green", json!(self.cfg.adaptive_green)),
            ]),
        );

        // Prime the charts before the first tick.
        ingestor.dispatch(self.state.tick);
        self.render(renderer);

        let mut ticker = interval(Duration::from_millis(self.cfg.tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick();
                    ingestor.dispatch(self.state.tick);
                    self.render(renderer);
                    if self.cfg.max_ticks.is_some_and(|max| self.state.tick >= max) {
                        break;
                    }
                }
                Some(outcome) = outcomes.recv() => {
                    self.apply_outcome(outcome);
                }
            }
        }

        log(
            Level::Info,
            Domain::System,
            "stop",
            obj(&[
                ("ticks", json!(self.state.tick)),
                ("samples_applied", json!(self.state.samples_applied)),
                ("fetches_in_flight", json!(ingestor.in_flight())),
                ("cycles", json!(self.state.clock.cycles())),
                ("total_vehicles", json!(self.state.stats.vehicle_total())),
                ("elapsed_secs", json!(self.state.stats.elapsed_secs())),
                ("runtime", v_str(&self.state.stats.runtime())),
            ]),
        );
        Ok(())
    }
}

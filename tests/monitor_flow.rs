//! End-to-end flow over the public API: ticks, resolved samples, failures,
//! and the snapshot a renderer would receive.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use signalboard::feed::{Density, StatusSample, StatusSource};
use signalboard::history::ChartMode;
use signalboard::ingest::{FetchOutcome, SampleIngestor};
use signalboard::monitor::Monitor;
use signalboard::render::{Renderer, Snapshot};
use signalboard::signal::Phase;
use signalboard::state::Config;
use signalboard::stats::ArrivalSource;

struct Scripted(VecDeque<u64>);

impl ArrivalSource for Scripted {
    fn arrivals(&mut self) -> u64 {
        self.0.pop_front().unwrap_or(0)
    }
}

fn monitor(arrivals: &[u64]) -> Monitor {
    Monitor::new(
        Config::default(),
        Box::new(Scripted(arrivals.iter().copied().collect())),
    )
}

/// A backend that is up for the first `healthy` calls, then goes down.
struct Flaky {
    healthy: u64,
    calls: std::sync::atomic::AtomicU64,
}

#[async_trait]
impl StatusSource for Flaky {
    async fn fetch(&self) -> Result<StatusSample> {
        let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n < self.healthy {
            Ok(StatusSample::new(n + 1, Density::Medium))
        } else {
            Err(anyhow!("connection reset"))
        }
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[test]
fn phase_sequence_over_three_cycles() {
    let mut m = monitor(&[]);
    let mut phases = vec![m.state().clock.phase()];
    for _ in 0..45 {
        let t = m.on_tick();
        if t.changed {
            phases.push(t.phase);
        }
    }
    let expected: Vec<Phase> = [Phase::Red, Phase::Green, Phase::Yellow]
        .iter()
        .copied()
        .cycle()
        .take(10)
        .collect();
    assert_eq!(phases, expected);
    assert_eq!(m.state().clock.cycles(), 3);
    assert_eq!(m.snapshot().runtime, "00:45");
}

#[test]
fn hundred_samples_keep_twenty_point_window() {
    let mut m = monitor(&[]);
    for i in 0..100u64 {
        m.on_tick();
        m.apply_outcome(FetchOutcome {
            tick: i,
            result: Ok(StatusSample::new(i, Density::from_vehicle_count(i))),
        });
    }
    let snap = m.snapshot();
    assert_eq!(snap.count_history.len(), 20);
    assert_eq!(snap.count_history.first(), Some(&80.0));
    assert_eq!(snap.count_history.last(), Some(&99.0));
    assert!(snap.density_history.iter().all(|v| *v == 3.0));
    // 99 is far above the 50 ceiling: clamped to the top of the chart.
    assert!(snap.count_path.ends_with(" L 100 0"));
    assert_eq!(snap.avg_density, Some(Density::High));
}

#[test]
fn failed_fetch_between_good_ones_is_invisible() {
    let mut with_failure = monitor(&[1, 2]);
    let mut without = monitor(&[1, 2]);

    for m in [&mut with_failure, &mut without] {
        m.on_tick();
        m.apply_outcome(FetchOutcome {
            tick: 1,
            result: Ok(StatusSample::new(4, Density::Low)),
        });
    }
    with_failure.apply_outcome(FetchOutcome {
        tick: 2,
        result: Err(anyhow!("timeout")),
    });
    for m in [&mut with_failure, &mut without] {
        m.apply_outcome(FetchOutcome {
            tick: 3,
            result: Ok(StatusSample::new(9, Density::Medium)),
        });
    }

    assert_eq!(with_failure.snapshot(), without.snapshot());
    assert_eq!(with_failure.snapshot().total_vehicles, 3);
}

#[test]
fn snapshot_paths_use_chart_modes() {
    let m = monitor(&[]);
    let snap = m.snapshot();
    let count_line = signalboard::history::render_sparkline(&snap.count_history, 50.0, ChartMode::Line);
    let density_area =
        signalboard::history::render_sparkline(&snap.density_history, 3.0, ChartMode::Area);
    assert_eq!(snap.count_path, count_line);
    assert_eq!(snap.density_path, density_area);
    assert!(!snap.count_path.contains('Z'));
    assert!(snap.density_path.ends_with("L 100 50 L 0 50 Z"));
}

struct Frames(Vec<Snapshot>);

impl Renderer for Frames {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.0.push(snapshot.clone());
        Ok(())
    }
}

#[tokio::test]
async fn run_loop_survives_backend_outage() {
    let cfg = Config {
        tick_ms: 10,
        max_ticks: Some(8),
        rng_seed: Some(5),
        ..Config::default()
    };
    let mut m = Monitor::from_config(cfg);
    let source = Arc::new(Flaky {
        healthy: 2,
        calls: std::sync::atomic::AtomicU64::new(0),
    });
    let (ingestor, mut rx) = SampleIngestor::new(source);
    let mut frames = Frames(Vec::new());

    m.run(&ingestor, &mut rx, &mut frames).await.unwrap();

    assert_eq!(m.state().tick, 8);
    assert!(m.state().samples_applied <= 2);
    assert_eq!(frames.0.len(), 9);
    assert!(frames.0.iter().all(|f| f.count_history.len() == 20));
    assert_eq!(frames.0.last().map(|f| f.runtime.as_str()), Some("00:08"));
}

/// A backend that accepts the request and never answers.
struct Hung;

#[async_trait]
impl StatusSource for Hung {
    async fn fetch(&self) -> Result<StatusSample> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "hung"
    }
}

#[tokio::test]
async fn hung_fetches_never_stall_ticks() {
    let cfg = Config {
        tick_ms: 10,
        max_ticks: Some(4),
        rng_seed: Some(5),
        ..Config::default()
    };
    let mut m = Monitor::from_config(cfg);
    let before = m.snapshot();
    let (ingestor, mut rx) = SampleIngestor::new(Arc::new(Hung));
    let mut frames = Frames(Vec::new());

    tokio::time::timeout(
        Duration::from_secs(5),
        m.run(&ingestor, &mut rx, &mut frames),
    )
    .await
    .expect("run blocked on a pending fetch")
    .unwrap();

    assert_eq!(m.state().tick, 4);
    let ticks: Vec<u64> = frames.0.iter().map(|f| f.tick).collect();
    assert_eq!(ticks, vec![0, 1, 2, 3, 4]);
    assert_eq!(m.state().samples_applied, 0);
    assert_eq!(ingestor.in_flight(), 5);

    let last = m.snapshot();
    assert_eq!(last.count_history, before.count_history);
    assert_eq!(last.density_history, before.density_history);
    assert_eq!(last.total_vehicles, 0);
    assert_eq!(last.avg_density, None);
    assert_eq!(last.runtime, "00:04");
}

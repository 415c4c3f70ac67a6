use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use super::{Density, StatusSample, StatusSource};
use crate::logging::ts_epoch_secs;

/// Offline stand-in for the status endpoint.
///
/// Vehicle count drifts as a bounded random walk so the charts move the way a
/// real intersection would; density is classified from the count.
pub struct SimulatedStatusSource {
    inner: Mutex<Walk>,
}

struct Walk {
    rng: StdRng,
    count: u64,
}

impl SimulatedStatusSource {
    pub const MAX_COUNT: u64 = 30;

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Mutex::new(Walk { rng, count: 4 }),
        }
    }

    fn step(&self) -> Result<StatusSample> {
        let mut walk = self
            .inner
            .lock()
            .map_err(|_| anyhow!("simulated source lock poisoned"))?;
        let delta: i64 = walk.rng.gen_range(-3..=3);
        let next = (walk.count as i64 + delta).clamp(0, Self::MAX_COUNT as i64) as u64;
        walk.count = next;
        Ok(StatusSample {
            vehicle_count: next,
            density: Density::from_vehicle_count(next),
            last_update: Some(ts_epoch_secs()),
        })
    }
}

#[async_trait]
impl StatusSource for SimulatedStatusSource {
    async fn fetch(&self) -> Result<StatusSample> {
        self.step()
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

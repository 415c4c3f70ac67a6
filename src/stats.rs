//! Running statistics: average density, cumulative vehicle total, runtime,
//! and the vehicle-type split.

use rand::Rng;
use serde::Serialize;

use crate::feed::Density;

/// Source of per-tick vehicle arrivals for the cumulative total.
pub trait ArrivalSource {
    fn arrivals(&mut self) -> u64;
}

/// With probability `active_probability` add a uniform draw in
/// `0..=max_per_tick`, otherwise nothing.
#[derive(Debug, Clone)]
pub struct RandomArrivals<R> {
    rng: R,
    pub active_probability: f64,
    pub max_per_tick: u64,
}

impl<R: Rng> RandomArrivals<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            active_probability: 0.7,
            max_per_tick: 2,
        }
    }
}

impl<R: Rng> ArrivalSource for RandomArrivals<R> {
    fn arrivals(&mut self) -> u64 {
        if self.rng.gen_bool(self.active_probability.clamp(0.0, 1.0)) {
            self.rng.gen_range(0..=self.max_per_tick)
        } else {
            0
        }
    }
}

/// Vehicle-type split of a count. Always sums to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VehicleBreakdown {
    pub car: u64,
    pub bus: u64,
    pub truck: u64,
    pub bike: u64,
}

impl VehicleBreakdown {
    pub const CAR_SHARE: f64 = 0.60;
    pub const BUS_SHARE: f64 = 0.10;
    pub const TRUCK_SHARE: f64 = 0.15;

    pub fn from_total(total: u64) -> Self {
        let share = |p: f64| (total as f64 * p).round() as u64;
        let car = share(Self::CAR_SHARE);
        let bus = share(Self::BUS_SHARE);
        let truck = share(Self::TRUCK_SHARE);
        // Rounded shares come to at most 0.85n + 1.5, which never exceeds n.
        let bike = total.saturating_sub(car + bus + truck);
        Self {
            car,
            bus,
            truck,
            bike,
        }
    }

    pub fn sum(&self) -> u64 {
        self.car + self.bus + self.truck + self.bike
    }
}

/// `MM:SS`, zero-padded. Minutes keep counting past 99.
pub fn format_runtime(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    density_sum: u64,
    density_readings: u64,
    vehicle_total: u64,
    elapsed_secs: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_density(&mut self, density: Density) {
        self.density_sum += density.level() as u64;
        self.density_readings += 1;
    }

    /// `None` until the first reading.
    pub fn average_density(&self) -> Option<Density> {
        classify_average(self.density_sum, self.density_readings)
    }

    pub fn record_vehicle_total(&mut self, arrivals: &mut dyn ArrivalSource) -> u64 {
        self.vehicle_total = self.vehicle_total.saturating_add(arrivals.arrivals());
        self.vehicle_total
    }

    pub fn tick_runtime(&mut self) -> String {
        self.elapsed_secs += 1;
        format_runtime(self.elapsed_secs)
    }

    pub fn vehicle_total(&self) -> u64 {
        self.vehicle_total
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn runtime(&self) -> String {
        format_runtime(self.elapsed_secs)
    }

    pub fn density_readings(&self) -> u64 {
        self.density_readings
    }

    pub fn density_sum(&self) -> u64 {
        self.density_sum
    }
}

pub fn classify_average(sum: u64, count: u64) -> Option<Density> {
    if count == 0 {
        return None;
    }
    Some(Density::from_average(sum as f64 / count as f64))
}

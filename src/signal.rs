//! Signal-phase state machine.
//!
//! RED → GREEN → YELLOW → RED, one step per tick. A cycle is counted on
//! every entry into RED.

use serde::Serialize;

use crate::feed::Density;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Red,
    Yellow,
    Green,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Yellow,
            Phase::Yellow => Phase::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Red => "RED",
            Phase::Yellow => "YELLOW",
            Phase::Green => "GREEN",
        }
    }

    /// Lamp states for this phase. Exactly one lamp is lit.
    pub fn lamps(self) -> Lamps {
        Lamps {
            red: self == Phase::Red,
            yellow: self == Phase::Yellow,
            green: self == Phase::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lamps {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

/// Seconds spent in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub red: u32,
    pub green: u32,
    pub yellow: u32,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            red: 2,
            green: 10,
            yellow: 3,
        }
    }
}

impl PhaseTimings {
    pub fn duration(&self, phase: Phase) -> u32 {
        // A zero duration would stall the countdown at 0; treat it as one tick.
        let secs = match phase {
            Phase::Red => self.red,
            Phase::Green => self.green,
            Phase::Yellow => self.yellow,
        };
        secs.max(1)
    }

    /// Green time scaled to traffic load.
    pub fn green_for(density: Density) -> u32 {
        match density {
            Density::Low => 10,
            Density::Medium => 20,
            Density::High => 30,
        }
    }
}

/// Result of one `advance()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTick {
    pub phase: Phase,
    pub remaining: u32,
    pub max_duration: u32,
    pub changed: bool,
    pub cycle_completed: bool,
}

#[derive(Debug, Clone)]
pub struct PhaseClock {
    timings: PhaseTimings,
    phase: Phase,
    remaining: u32,
    max_duration: u32,
    cycles: u64,
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new(PhaseTimings::default())
    }
}

impl PhaseClock {
    pub fn new(timings: PhaseTimings) -> Self {
        let initial = timings.duration(Phase::Red);
        Self {
            timings,
            phase: Phase::Red,
            remaining: initial,
            max_duration: initial,
            cycles: 0,
        }
    }

    pub fn advance(&mut self) -> PhaseTick {
        self.remaining = self.remaining.saturating_sub(1);
        let mut changed = false;
        let mut cycle_completed = false;

        if self.remaining == 0 {
            self.phase = self.phase.next();
            self.max_duration = self.timings.duration(self.phase);
            self.remaining = self.max_duration;
            changed = true;
            if self.phase == Phase::Red {
                self.cycles += 1;
                cycle_completed = true;
            }
        }

        PhaseTick {
            phase: self.phase,
            remaining: self.remaining,
            max_duration: self.max_duration,
            changed,
            cycle_completed,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Duration the current phase was entered with.
    pub fn max_duration(&self) -> u32 {
        self.max_duration
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn timings(&self) -> PhaseTimings {
        self.timings
    }

    /// Retune the green time. Applies from the next entry into GREEN; a green
    /// phase already running keeps its countdown.
    pub fn set_green(&mut self, secs: u32) {
        self.timings.green = secs;
    }
}

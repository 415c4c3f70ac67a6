//! Core of a traffic-intersection monitor front end: a signal-phase clock,
//! rolling sample histories with sparkline rendering, a fire-and-forget
//! status ingestor, and running statistics, driven by a one-second tick.

pub mod feed;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod monitor;
pub mod render;
pub mod signal;
pub mod state;
pub mod stats;

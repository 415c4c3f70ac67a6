use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::Config;

pub mod http;
pub mod simulated;

/// Coarse traffic-load label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Density {
    #[default]
    Low,
    Medium,
    High,
}

impl Density {
    /// Case-insensitive. Unknown labels read as LOW.
    pub fn parse(label: &str) -> Density {
        match label.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Density::High,
            "MEDIUM" => Density::Medium,
            _ => Density::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Low => "LOW",
            Density::Medium => "MEDIUM",
            Density::High => "HIGH",
        }
    }

    /// Numeric level used for histories and averages.
    pub fn level(self) -> u8 {
        match self {
            Density::Low => 1,
            Density::Medium => 2,
            Density::High => 3,
        }
    }

    pub fn from_average(avg: f64) -> Density {
        if avg > 2.5 {
            Density::High
        } else if avg > 1.5 {
            Density::Medium
        } else {
            Density::Low
        }
    }

    /// Classification by raw vehicle count (0-5 LOW, 6-15 MEDIUM, 16+ HIGH).
    pub fn from_vehicle_count(count: u64) -> Density {
        if count <= 5 {
            Density::Low
        } else if count <= 15 {
            Density::Medium
        } else {
            Density::High
        }
    }
}

/// One normalized status reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSample {
    pub vehicle_count: u64,
    pub density: Density,
    /// Epoch seconds the backend last refreshed its state, if it says.
    pub last_update: Option<f64>,
}

impl Default for StatusSample {
    fn default() -> Self {
        Self {
            vehicle_count: 0,
            density: Density::Low,
            last_update: None,
        }
    }
}

impl StatusSample {
    pub fn new(vehicle_count: u64, density: Density) -> Self {
        Self {
            vehicle_count,
            density,
            last_update: None,
        }
    }

    pub fn age_secs(&self, now_secs: f64) -> Option<f64> {
        self.last_update.map(|ts| (now_secs - ts).max(0.0))
    }
}

// Status API response; every field is optional.
#[derive(Deserialize, Debug, Default)]
struct RawStatus {
    #[serde(default)]
    vehicle_count: Option<Value>,
    #[serde(default)]
    density: Option<Value>,
    #[serde(default)]
    last_update: Option<Value>,
}

fn count_from(value: Option<Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn density_from(value: Option<Value>) -> Density {
    match value {
        Some(Value::String(s)) => Density::parse(&s),
        _ => Density::Low,
    }
}

/// Normalize a decoded status body. Missing or odd fields fall back to
/// defaults; only a body that is not a JSON object is rejected.
pub fn normalize(body: Value) -> Result<StatusSample> {
    if !body.is_object() {
        return Err(anyhow!("status payload is not an object"));
    }
    let raw: RawStatus = serde_json::from_value(body).unwrap_or_default();
    Ok(StatusSample {
        vehicle_count: count_from(raw.vehicle_count),
        density: density_from(raw.density),
        last_update: raw
            .last_update
            .and_then(|v| v.as_f64())
            .filter(|t| t.is_finite()),
    })
}

/// Parse and normalize a raw response body.
pub fn parse_status(text: &str) -> Result<StatusSample> {
    let body: Value = serde_json::from_str(text)?;
    normalize(body)
}

/// Anything that can produce one status reading on demand.
#[async_trait]
pub trait StatusSource {
    async fn fetch(&self) -> Result<StatusSample>;
    fn name(&self) -> &'static str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    Simulated,
}

impl SourceKind {
    /// HTTP when a status URL is configured, otherwise the offline simulator.
    pub fn from_config(cfg: &Config) -> Self {
        if cfg.status_url.is_some() {
            SourceKind::Http
        } else {
            SourceKind::Simulated
        }
    }

    pub fn build(self, cfg: &Config) -> Result<Box<dyn StatusSource + Send + Sync>> {
        match self {
            SourceKind::Http => Ok(Box::new(http::HttpStatusSource::new(cfg)?)),
            SourceKind::Simulated => Ok(Box::new(simulated::SimulatedStatusSource::new(
                cfg.rng_seed,
            ))),
        }
    }
}

use crate::error::{NvsharptopError, Result};
use std::process::Command;

/// Query field list handed to nvidia-smi. The parser depends on exactly this
/// order and on the csv,noheader,nounits output format.
pub const QUERY_FIELDS: &str =
    "index,name,temperature.gpu,utilization.gpu,memory.used,memory.total";

const SMI_BINARY: &str = "nvidia-smi";
const FIELD_COUNT: usize = 6;

/// One parsed row of GPU telemetry, produced fresh on every sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    pub index: u32,
    pub name: String,
    pub temperature: f64,
    pub utilization: f64,
    pub memory_used: f64,
    pub memory_total: f64,
}

impl DeviceReading {
    #[must_use]
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total <= 0.0 {
            0.0
        } else {
            self.memory_used / self.memory_total * 100.0
        }
    }
}

/// Seam between the query tool and everything above it, so the collector
/// and views can run against a synthetic sampler in tests.
pub trait GpuSampler: Send {
    /// One fresh query; no state is held between invocations.
    fn sample(&self) -> Result<Vec<DeviceReading>>;
    fn is_available(&self) -> bool;
}

pub struct SmiSampler;

impl Default for SmiSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SmiSampler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl GpuSampler for SmiSampler {
    fn sample(&self) -> Result<Vec<DeviceReading>> {
        let output = Command::new(SMI_BINARY)
            .arg(format!("--query-gpu={QUERY_FIELDS}"))
            .arg("--format=csv,noheader,nounits")
            .output()
            .map_err(|e| NvsharptopError::Launch(format!("{SMI_BINARY}: {e}")))?;

        Ok(parse_batch(&String::from_utf8_lossy(&output.stdout)))
    }

    fn is_available(&self) -> bool {
        Command::new(SMI_BINARY).arg("--version").output().is_ok()
    }
}

/// Parses a whole query output; malformed lines are skipped, siblings in the
/// same batch still parse.
#[must_use]
pub fn parse_batch(output: &str) -> Vec<DeviceReading> {
    output.lines().filter_map(parse_reading).collect()
}

/// A line is accepted only if it splits into at least the expected field
/// count and every numeric field parses.
#[must_use]
pub fn parse_reading(line: &str) -> Option<DeviceReading> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < FIELD_COUNT {
        return None;
    }

    let reading = DeviceReading {
        index: parts[0].parse().ok()?,
        name: parts[1].to_string(),
        temperature: parse_finite(parts[2])?,
        utilization: parse_finite(parts[3])?,
        memory_used: parse_finite(parts[4])?,
        memory_total: parse_finite(parts[5])?,
    };
    Some(reading)
}

// "nan" and "inf" parse as f64 but would poison every downstream ratio.
fn parse_finite(field: &str) -> Option<f64> {
    field.parse().ok().filter(|v: &f64| v.is_finite())
}

//! Metrics computed from other columns.

use std::fmt;

/// "Memory used" values above this are megabytes, at or below it gigabytes.
pub const RAM_MB_THRESHOLD: f64 = 512.0;

/// Transfer rates (MT/s) above this are classified as DDR5.
pub const DDR5_MIN_TRANSFER_RATE: u32 = 4600;

/// Normalizes a "memory used" reading to GB.
///
/// Tools report it in MB or GB depending on configuration.
pub fn ram_used_gb(raw: f64) -> f64 {
    if raw > RAM_MB_THRESHOLD {
        raw / 1024.0
    } else {
        raw
    }
}

/// Total RAM in GB from used GB and load percent.
///
/// `None` when either input is missing or the load is zero.
pub fn ram_total_gb(used_gb: Option<f64>, load_percent: Option<f64>) -> Option<f64> {
    match (used_gb, load_percent) {
        (Some(used), Some(load)) if load != 0.0 => Some(used / (load / 100.0)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdrGeneration {
    Ddr4,
    Ddr5,
}

impl DdrGeneration {
    pub fn label(self) -> &'static str {
        match self {
            DdrGeneration::Ddr4 => "DDR4",
            DdrGeneration::Ddr5 => "DDR5",
        }
    }
}

/// Memory speed class, rendered as `DDR5-6000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamSpeed {
    pub generation: DdrGeneration,
    /// Megatransfers per second.
    pub transfer_rate: u32,
}

impl RamSpeed {
    /// Classifies a memory clock (MHz). Double data rate: MT/s = 2 × clock.
    ///
    /// `None` for a non-positive clock.
    pub fn from_clock(clock_mhz: f64) -> Option<Self> {
        if clock_mhz.is_nan() || clock_mhz <= 0.0 {
            return None;
        }
        let transfer_rate = (clock_mhz * 2.0) as u32;
        let generation = if transfer_rate > DDR5_MIN_TRANSFER_RATE {
            DdrGeneration::Ddr5
        } else {
            DdrGeneration::Ddr4
        };
        Some(Self {
            generation,
            transfer_rate,
        })
    }
}

impl fmt::Display for RamSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.generation.label(), self.transfer_rate)
    }
}

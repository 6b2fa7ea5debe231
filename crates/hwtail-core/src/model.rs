//! Published snapshot schema.
//!
//! One `MetricSnapshot` = one complete view of the monitored machine as of the
//! last successful tick. Unavailable numbers are `null`.

use serde::Serialize;

/// Placeholder shown until hardware names are detected.
pub const DETECTING: &str = "Detecting...";

/// Placeholder shown until a memory clock is read.
pub const RAM_TYPE_UNKNOWN: &str = "DDR-UNK";

/// Top-level snapshot served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct MetricSnapshot {
    pub cpu: ComputeGroup,
    pub gpu: ComputeGroup,
    pub ram: RamGroup,
    pub info: InfoGroup,
    pub raw: RawGroup,
}

/// Processor metrics (shared shape for CPU and GPU).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct ComputeGroup {
    /// Load, percent.
    pub usage: Option<f64>,
    /// Clock, MHz.
    pub clock: Option<f64>,
    /// Power draw, W.
    pub power: Option<f64>,
    /// Temperature, °C.
    pub temp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct RamGroup {
    pub usage_percent: Option<f64>,
    pub used_gb: Option<f64>,
    /// Derived from used and load; keeps the last computed value.
    pub total_gb: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct InfoGroup {
    pub cpu_name: String,
    pub gpu_name: String,
    /// e.g. `DDR5-6000`.
    pub ram_type: String,
}

impl Default for InfoGroup {
    fn default() -> Self {
        Self {
            cpu_name: DETECTING.to_string(),
            gpu_name: DETECTING.to_string(),
            ram_type: RAM_TYPE_UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct RawGroup {
    pub status: Status,
    /// Unix timestamp (seconds) of the last successful tick.
    pub updated_at: Option<i64>,
    /// Log file currently tracked.
    pub source: Option<String>,
    /// Last error, present only while `status` is `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Monitor status as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No record parsed yet.
    #[default]
    Starting,
    /// The last tick produced a record.
    Live,
    /// The monitor is recovering from a failure, or stopped.
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Starting => "starting",
            Status::Live => "live",
            Status::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_serializes_with_nulls() {
        let json = serde_json::to_value(MetricSnapshot::default()).unwrap();
        assert_eq!(json["cpu"]["usage"], serde_json::Value::Null);
        assert_eq!(json["ram"]["total_gb"], serde_json::Value::Null);
        assert_eq!(json["info"]["cpu_name"], "Detecting...");
        assert_eq!(json["info"]["ram_type"], "DDR-UNK");
        assert_eq!(json["raw"]["status"], "starting");
        assert!(json["raw"].get("message").is_none());
    }

    #[test]
    fn status_names() {
        assert_eq!(Status::Live.as_str(), "live");
        assert_eq!(
            serde_json::to_value(Status::Error).unwrap(),
            serde_json::json!("error")
        );
    }
}

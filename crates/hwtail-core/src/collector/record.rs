//! From one raw log row to typed metrics.

use crate::collector::derived::{RamSpeed, ram_total_gb, ram_used_gb};
use crate::collector::header::{ColumnIndexMap, Field, LogLayout};
use crate::collector::normalize::normalize_value;
use crate::model::{ComputeGroup, RamGroup};

/// Rows with fewer fields are treated as a parse miss for the tick.
pub const MIN_RECORD_FIELDS: usize = 3;

/// Metrics extracted from one row, derived values included.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub cpu: ComputeGroup,
    pub gpu: ComputeGroup,
    /// `total_gb` is `None` when it cannot be computed from this row.
    pub ram: RamGroup,
    pub ram_speed: Option<RamSpeed>,
}

impl Reading {
    /// Parses a row using the file's layout.
    ///
    /// `None` when the row is the header itself or has too few fields.
    pub fn parse(line: &str, layout: &LogLayout) -> Option<Self> {
        if layout.is_header(line) {
            return None;
        }
        let fields: Vec<&str> = line.split(layout.delimiter).collect();
        if fields.len() < MIN_RECORD_FIELDS {
            return None;
        }
        Some(Self::from_fields(&fields, &layout.columns))
    }

    /// Builds a reading from already split fields.
    pub fn from_fields(fields: &[&str], columns: &ColumnIndexMap) -> Self {
        let value = |field: Field| {
            columns
                .get(field)
                .and_then(|i| fields.get(i))
                .and_then(|raw| normalize_value(raw))
        };

        let used_gb = value(Field::RamUsed).map(ram_used_gb);
        let usage_percent = value(Field::RamLoad);

        Self {
            cpu: ComputeGroup {
                usage: value(Field::CpuUsage),
                clock: value(Field::CpuClock),
                power: value(Field::CpuPower),
                temp: value(Field::CpuTemp),
            },
            gpu: ComputeGroup {
                usage: value(Field::GpuUsage),
                clock: value(Field::GpuClock),
                power: value(Field::GpuPower),
                temp: value(Field::GpuTemp),
            },
            ram: RamGroup {
                usage_percent,
                used_gb,
                total_gb: ram_total_gb(used_gb, usage_percent),
            },
            ram_speed: value(Field::RamSpeed).and_then(RamSpeed::from_clock),
        }
    }
}

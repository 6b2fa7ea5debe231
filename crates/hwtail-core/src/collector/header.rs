//! Header mapping: which column holds which metric.
//!
//! Monitoring tools name their columns differently ("Total CPU Usage [%]",
//! "CPU Package Power [W]", "GPU Core Load", ...). Each [`Field`] owns an
//! ordered list of keyword sets. A column matches a set when its lowercased
//! header contains every keyword of the set. Sets are tried in priority order,
//! columns left to right, and the first hit wins.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::TailError;

/// Semantic metrics supported by the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CpuUsage,
    CpuTemp,
    CpuClock,
    CpuPower,
    GpuUsage,
    GpuTemp,
    GpuClock,
    GpuPower,
    RamLoad,
    RamUsed,
    RamSpeed,
}

impl Field {
    pub const COUNT: usize = 11;

    pub const ALL: [Field; Field::COUNT] = [
        Field::CpuUsage,
        Field::CpuTemp,
        Field::CpuClock,
        Field::CpuPower,
        Field::GpuUsage,
        Field::GpuTemp,
        Field::GpuClock,
        Field::GpuPower,
        Field::RamLoad,
        Field::RamUsed,
        Field::RamSpeed,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::CpuUsage => "cpu_usage",
            Field::CpuTemp => "cpu_temp",
            Field::CpuClock => "cpu_clock",
            Field::CpuPower => "cpu_power",
            Field::GpuUsage => "gpu_usage",
            Field::GpuTemp => "gpu_temp",
            Field::GpuClock => "gpu_clock",
            Field::GpuPower => "gpu_power",
            Field::RamLoad => "ram_load",
            Field::RamUsed => "ram_used",
            Field::RamSpeed => "ram_speed",
        }
    }

    /// Keyword sets in priority order. Keywords are lowercase.
    pub fn keyword_sets(self) -> &'static [&'static [&'static str]] {
        match self {
            Field::CpuUsage => &[&["total", "cpu", "usage"], &["cpu", "total"], &["cpu", "usage"]],
            Field::CpuTemp => &[
                &["cpu", "tctl"],
                &["cpu", "package"],
                &["core", "max"],
                &["cpu", "temp"],
            ],
            Field::CpuClock => &[&["core", "clock"], &["bus", "clock"]],
            Field::CpuPower => &[&["cpu", "package", "power"], &["cpu", "power"]],
            Field::GpuUsage => &[
                &["gpu", "core", "load"],
                &["gpu", "utilization"],
                &["gpu", "usage"],
            ],
            Field::GpuTemp => &[&["gpu", "temperature"], &["gpu", "temp"]],
            Field::GpuClock => &[&["gpu", "clock"], &["gpu", "core", "clock"]],
            Field::GpuPower => &[&["gpu", "power"], &["gpu", "ppt"]],
            Field::RamLoad => &[&["physical", "memory", "load"], &["memory", "usage"]],
            Field::RamUsed => &[&["physical", "memory", "used"], &["memory", "used"]],
            Field::RamSpeed => &[&["memory", "clock"], &["dram", "frequency"]],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Column position of every [`Field`], `None` when the log has no such column.
///
/// Built once per log file and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnIndexMap {
    columns: [Option<usize>; Field::COUNT],
}

impl ColumnIndexMap {
    /// Resolves every field against the given header cells.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let lowered: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().to_lowercase())
            .collect();

        let mut columns = [None; Field::COUNT];
        for field in Field::ALL {
            columns[field.slot()] = find_column(&lowered, field.keyword_sets());
        }
        Self { columns }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns[field.slot()]
    }

    /// `(field, column)` pairs in `Field::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<usize>)> + '_ {
        Field::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Number of fields that resolved to a column.
    pub fn resolved(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }
}

fn find_column(lowered: &[String], keyword_sets: &[&[&str]]) -> Option<usize> {
    keyword_sets.iter().find_map(|keywords| {
        lowered
            .iter()
            .position(|header| keywords.iter().all(|k| header.contains(k)))
    })
}

/// Picks `;` when the header has strictly more semicolons than commas.
pub fn detect_delimiter(header_line: &str) -> char {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas { ';' } else { ',' }
}

/// Everything learned from the header line of one log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    pub delimiter: char,
    pub columns: ColumnIndexMap,
    /// The header line itself, trimmed. Used to reject the header as a record.
    pub header: String,
    pub column_count: usize,
}

impl LogLayout {
    /// Builds the layout from a raw header line.
    pub fn from_header_line(line: &str) -> Self {
        let header = clean_line(line).to_string();
        let delimiter = detect_delimiter(&header);
        let cells: Vec<&str> = header.split(delimiter).collect();
        Self {
            delimiter,
            columns: ColumnIndexMap::resolve(&cells),
            column_count: cells.len(),
            header,
        }
    }

    /// Reads the first line of `path` and builds the layout.
    ///
    /// The file is opened, read up to the first newline and closed again.
    pub fn read(path: &Path) -> Result<Self, TailError> {
        let header_err = |source| TailError::HeaderRead {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(header_err)?;
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        reader.read_until(b'\n', &mut raw).map_err(header_err)?;

        let line = String::from_utf8_lossy(&raw);
        if clean_line(&line).is_empty() {
            return Err(TailError::EmptyHeader {
                path: path.to_path_buf(),
            });
        }
        Ok(Self::from_header_line(&line))
    }

    /// Whether `line` is the header row repeated.
    pub fn is_header(&self, line: &str) -> bool {
        clean_line(line) == self.header
    }
}

/// Strips a UTF-8 BOM, line terminators and surrounding whitespace.
pub(crate) fn clean_line(line: &str) -> &str {
    line.trim_start_matches('\u{feff}').trim()
}

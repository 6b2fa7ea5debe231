//! Conversion of raw log cells into numbers.
//!
//! Cells may carry unit suffixes (`MHz`, `%`, `°C`, `W`) and either of two
//! decimal conventions:
//! - comma only (`45,5`): comma is the decimal mark
//! - comma and period (`1.234,5` or `1,234.5`): whichever mark comes last
//!   is the decimal mark, the other is a thousands separator and is dropped
//!
//! [`normalize_value`] is total: malformed input yields `None`, never a panic.

/// Unit suffixes stripped from the end of a cell, lowercase.
///
/// `\u{fffd}c` covers a Latin-1 degree sign that did not survive UTF-8 decoding,
/// `Â°c` a UTF-8 degree sign read back as Latin-1.
const UNIT_SUFFIXES: &[&str] = &["mhz", "%", "â°c", "°c", "\u{fffd}c", "w"];

/// Parses a raw cell into a finite number.
pub fn normalize_value(raw: &str) -> Option<f64> {
    let mut s = raw.trim();

    // Units may be stacked or padded ("70 %").
    loop {
        let Some(stripped) = strip_unit(s) else { break };
        s = stripped.trim_end();
    }

    if s.is_empty() {
        return None;
    }

    let cleaned = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(period)) if comma > period => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        (None, _) => s.to_string(),
    };

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn strip_unit(s: &str) -> Option<&str> {
    UNIT_SUFFIXES.iter().find_map(|suffix| {
        let cut = s.len().checked_sub(suffix.len())?;
        let tail = s.get(cut..)?;
        if tail.to_lowercase() == *suffix {
            Some(&s[..cut])
        } else {
            None
        }
    })
}

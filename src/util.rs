use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DURATION: Regex = Regex::new(
        r"(?i)^(-?\d*\.?\d+) *(milliseconds?|msecs?|ms|seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|wks?|w|years?|yrs?|y)?$"
    )
    .unwrap();
}

/// Parse a human duration such as `"500"`, `"1.5h"` or `"2 days"` into
/// milliseconds. A bare number is milliseconds. A year is 365.25 days.
///
/// Returns `None` when the string is not a duration.
pub fn parse_duration_ms(value: &str) -> Option<f64> {
    let captures = DURATION.captures(value.trim())?;
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();

    let factor = match unit.chars().next() {
        None => 1.0,
        Some('m') if unit.starts_with("ms") || unit.starts_with("mil") => 1.0,
        Some('s') => 1_000.0,
        Some('m') => 60_000.0,
        Some('h') => 3_600_000.0,
        Some('d') => 86_400_000.0,
        Some('w') => 604_800_000.0,
        Some('y') => 31_557_600_000.0,
        Some(_) => return None,
    };
    Some(amount * factor)
}

pub fn format_file_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, units[unit_index])
}

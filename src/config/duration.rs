//! Human-readable duration parsing for intervals.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration '{0}' (expected e.g. 500ms, 30s, 15m, 1h, 1d)")]
pub struct InvalidDuration(pub String);

/// Parse a duration such as `"30s"` or `"15m"`.
///
/// Supported suffixes: `ms`, `s`, `m`, `h`, `d`. A bare number is rejected.
///
/// ```
/// use jsmon::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, InvalidDuration> {
    let s = s.trim();
    let invalid = || InvalidDuration(s.to_string());

    let (digits, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else {
        let split = s.len().checked_sub(1).ok_or_else(invalid)?;
        if !s.is_char_boundary(split) {
            return Err(invalid());
        }
        s.split_at(split)
    };

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let secs = match unit {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => Some(value),
        "m" => value.checked_mul(60),
        "h" => value.checked_mul(3_600),
        "d" => value.checked_mul(86_400),
        _ => None,
    };
    secs.map(Duration::from_secs).ok_or_else(invalid)
}

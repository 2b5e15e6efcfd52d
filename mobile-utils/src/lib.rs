//! Utilities shared by the mobile runtime crates and its extensions
//!
//! ## Core Features:
//! - **Duration Conversion**: String-to-Duration parsing supporting multiple time units
//! - **Timestamp Utilities**: Millisecond timestamps and human-readable formatting
//! - **Blank Strings**: The "blank is absent" rule used when reading host-provided data
//!
//! ## Usage Examples:
//! ```rust
//! use mobile_utils::{non_blank, to_duration};
//!
//! let duration = to_duration("1m30s");
//! assert_eq!(duration.as_secs(), 90);
//!
//! assert_eq!(non_blank(Some("  ")), None);
//! assert_eq!(non_blank(Some("server")), Some("server"));
//! ```

#![deny(unsafe_code)]

use std::time::Duration;

use serde::de::{Deserialize, Deserializer};

/// Timestamp representation in milliseconds since Unix epoch
pub type TimestampMillis = i64;

/// Deserialize Duration from a human-readable string such as "5s" or "1m30s"
#[inline]
pub fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let v = String::deserialize(deserializer)?;
    Ok(to_duration(&v))
}

/// Convert human-readable duration string to Duration
///
/// # Supported units:
/// - ms: milliseconds
/// - s: seconds
/// - m: minutes
/// - h: hours
/// - d: days
///
/// # Example:
/// ```
/// let duration = mobile_utils::to_duration("1h30m15s");
/// assert_eq!(duration.as_secs(), 5415);
///
/// let millis = mobile_utils::to_duration("1500ms");
/// assert_eq!(millis.as_millis(), 1500);
/// ```
#[inline]
pub fn to_duration(text: &str) -> Duration {
    let text = text.to_lowercase().replace("ms", "Y");
    let ms: u64 = text
        .split_inclusive(['s', 'm', 'h', 'd', 'Y'])
        .map(|x| {
            let mut chars = x.chars();
            let u = match chars.nth_back(0) {
                None => return 0,
                Some(u) => u,
            };
            let v = match chars.as_str().trim().parse::<u64>() {
                Err(_e) => return 0,
                Ok(v) => v,
            };
            match u {
                'Y' => v,
                's' => v * 1000,
                'm' => v * 60000,
                'h' => v * 3600000,
                'd' => v * 86400000,
                _ => 0,
            }
        })
        .sum();
    Duration::from_millis(ms)
}

/// Current time in milliseconds since Unix epoch
#[inline]
pub fn timestamp_millis() -> TimestampMillis {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|t| t.as_millis() as i64)
        .unwrap_or_else(|_| chrono::Local::now().timestamp_millis())
}

/// Format timestamp (milliseconds) to human-readable string
#[inline]
pub fn format_timestamp_millis(t: TimestampMillis) -> String {
    if t <= 0 {
        "".into()
    } else {
        use chrono::TimeZone;
        if let chrono::LocalResult::Single(t) = chrono::Local.timestamp_millis_opt(t) {
            t.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
        } else {
            "".into()
        }
    }
}

/// Returns `true` for an empty string or one made only of whitespace
#[inline]
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Treats a blank string the same as an absent one
#[inline]
pub fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !is_blank(s))
}

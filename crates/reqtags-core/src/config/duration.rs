//! Free-text durations: `"<N> <unit>"`, e.g. `"3 weeks"`, `"5 minutes"`, `"1w 2d"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DurationError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// A non-negative offset parsed from free text.
///
/// Stored with second precision. Renders back in the largest unit that
/// divides it exactly, so `"14 days"` displays as `"2 weeks"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HumanDuration {
    seconds: u64,
}

impl HumanDuration {
    pub const ZERO: HumanDuration = HumanDuration { seconds: 0 };

    pub fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn from_days(days: u64) -> Self {
        Self::from_secs(days * DAY)
    }

    pub fn from_weeks(weeks: u64) -> Self {
        Self::from_secs(weeks * WEEK)
    }

    pub fn as_secs(&self) -> u64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }

    /// Convert to a `chrono::Duration` for timestamp arithmetic.
    /// Values beyond chrono's range saturate at `chrono::Duration::MAX`.
    pub fn to_chrono(&self) -> chrono::Duration {
        i64::try_from(self.seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

/// Parse a duration string.
///
/// Accepts one or more `<number><unit>` pairs separated by optional
/// whitespace or commas. Units are case-insensitive.
pub fn parse_duration(input: &str) -> Result<HumanDuration, DurationError> {
    let text = input.trim().to_ascii_lowercase();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }

    let mut chars = text.chars().peekable();
    let mut total: u64 = 0;

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut digits = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            digits.push(c);
        }
        if digits.is_empty() {
            return Err(DurationError::MissingNumber {
                input: input.to_string(),
            });
        }
        let number: u64 = digits.parse().map_err(|_| DurationError::Overflow {
            input: input.to_string(),
        })?;

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut unit = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_alphabetic) {
            unit.push(c);
        }
        if unit.is_empty() {
            return Err(DurationError::MissingUnit {
                input: input.to_string(),
                number,
            });
        }

        let scale = unit_seconds(&unit).ok_or_else(|| DurationError::UnknownUnit {
            input: input.to_string(),
            unit: unit.clone(),
        })?;

        total = number
            .checked_mul(scale)
            .and_then(|part| total.checked_add(part))
            .filter(|t| i64::try_from(*t).is_ok())
            .ok_or_else(|| DurationError::Overflow {
                input: input.to_string(),
            })?;
    }

    Ok(HumanDuration::from_secs(total))
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(HOUR),
        "d" | "day" | "days" => Some(DAY),
        "w" | "wk" | "wks" | "week" | "weeks" => Some(WEEK),
        _ => None,
    }
}

impl FromStr for HumanDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (count, unit) = [(WEEK, "week"), (DAY, "day"), (HOUR, "hour"), (MINUTE, "minute")]
            .into_iter()
            .find(|(scale, _)| self.seconds != 0 && self.seconds % scale == 0)
            .map(|(scale, unit)| (self.seconds / scale, unit))
            .unwrap_or((self.seconds, "second"));

        if count == 1 {
            write!(f, "{count} {unit}")
        } else {
            write!(f, "{count} {unit}s")
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

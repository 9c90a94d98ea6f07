use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60_000;

/// Format a millisecond count as `MM:SS:mmm`.
///
/// Minutes are zero-padded but never wrapped, so durations of 100 minutes
/// or more simply produce a longer minutes field.
pub fn format_duration(ms: u64) -> String {
    let minutes = ms / MS_PER_MINUTE;
    let seconds = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;
    format!("{minutes:02}:{seconds:02}:{millis:03}")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDurationError {
    #[error("expected MM:SS:mmm, got {0:?}")]
    Shape(String),
    #[error("seconds field out of range in {0:?}")]
    SecondsOutOfRange(String),
    #[error("minutes field too large in {0:?}")]
    Overflow(String),
}

/// Parse a `MM:SS:mmm` string back into milliseconds.
///
/// Only strings of the exact shape produced by [`format_duration`] are
/// accepted: at least two minute digits, exactly two second digits and
/// exactly three millisecond digits.
pub fn parse_duration(s: &str) -> Result<u64, ParseDurationError> {
    let shape_err = || ParseDurationError::Shape(s.to_string());

    let mut fields = s.split(':');
    let (Some(minutes), Some(seconds), Some(millis), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(shape_err());
    };

    let all_digits = |f: &str| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(minutes) || !all_digits(seconds) || !all_digits(millis) {
        return Err(shape_err());
    }
    if minutes.len() < 2 || seconds.len() != 2 || millis.len() != 3 {
        return Err(shape_err());
    }

    let minutes: u64 = minutes
        .parse()
        .map_err(|_| ParseDurationError::Overflow(s.to_string()))?;
    // widths are fixed above, these cannot fail
    let seconds: u64 = seconds.parse().map_err(|_| shape_err())?;
    let millis: u64 = millis.parse().map_err(|_| shape_err())?;

    if seconds >= 60 {
        return Err(ParseDurationError::SecondsOutOfRange(s.to_string()));
    }

    minutes
        .checked_mul(MS_PER_MINUTE)
        .and_then(|m| m.checked_add(seconds * MS_PER_SECOND + millis))
        .ok_or_else(|| ParseDurationError::Overflow(s.to_string()))
}

/// A single completed timing, in whole milliseconds.
///
/// The `MM:SS:mmm` string is only the display and storage encoding; all
/// arithmetic happens on the numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RecordedTime(u64);

impl RecordedTime {
    pub const ZERO: RecordedTime = RecordedTime(0);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl FromStr for RecordedTime {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(RecordedTime)
    }
}

impl Serialize for RecordedTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordedTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

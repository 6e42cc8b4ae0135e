//! Attendance records keyed by calendar date.
//!
//! A user has at most one [`AttendanceRecord`] per [`DateKey`]. A missing key
//! means the day is unmarked, which is distinct from both statuses.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar::YearMonth;
use crate::error::ValidationError;

/// Whole attendance set of one user, ordered by date.
pub type AttendanceMap = BTreeMap<DateKey, AttendanceRecord>;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` key of a calendar day.
///
/// Ordering is chronological, which for four-digit years is the same as the
/// lexicographic order of the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Parse a strict `YYYY-MM-DD` key (zero-padded, years 1..=9999).
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDateKey(s.to_string());
        if s.len() != 10 {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(s, DATE_KEY_FORMAT).map_err(|_| invalid())?;
        if date.format(DATE_KEY_FORMAT).to_string() != s {
            return Err(invalid());
        }
        Self::from_date(date).ok_or_else(invalid)
    }

    /// Wrap a date. Returns `None` outside years 1..=9999.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        (1..=9999).contains(&date.year()).then_some(Self(date))
    }

    /// Key for the UTC calendar day of `at`.
    pub fn from_datetime(at: DateTime<Utc>) -> Option<Self> {
        Self::from_date(at.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.0)
    }

    /// Midnight UTC of this day; the timestamp stored on freshly marked records.
    pub fn midnight_utc(&self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateKey::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Attendance status of a marked day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    /// Older clients wrote `bunk`; it is read back as `bunked`.
    #[serde(alias = "bunk")]
    Bunked,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Bunked => "bunked",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "bunked" | "bunk" => Ok(AttendanceStatus::Bunked),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Free-text justification attached to a bunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkDetails {
    /// What the user did instead.
    pub activity: Option<String>,
    /// What was missed.
    pub missed: Option<String>,
}

impl MarkDetails {
    pub fn new(activity: impl Into<String>, missed: impl Into<String>) -> Self {
        Self {
            activity: Some(activity.into()),
            missed: Some(missed.into()),
        }
    }
}

/// One marked day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub status: AttendanceStatus,
    #[serde(default, alias = "did", skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed: Option<String>,
    /// Timestamp the record was created/edited for. Records written by
    /// older clients may lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Build the record stored for `key`. Details are kept only for bunks.
    pub fn new(key: DateKey, status: AttendanceStatus, details: MarkDetails) -> Self {
        let (activity, missed) = match status {
            AttendanceStatus::Bunked => (details.activity, details.missed),
            AttendanceStatus::Present => (None, None),
        };
        Self {
            status,
            activity,
            missed,
            date: Some(key.midnight_utc()),
        }
    }

    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }

    pub fn is_bunked(&self) -> bool {
        self.status == AttendanceStatus::Bunked
    }

    /// The record timestamp, falling back to midnight of its key.
    pub fn effective_date(&self, key: DateKey) -> DateTime<Utc> {
        self.date.unwrap_or_else(|| key.midnight_utc())
    }
}

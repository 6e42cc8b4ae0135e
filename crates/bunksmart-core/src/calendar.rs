//! Month view generation.
//!
//! Every month renders as a fixed grid of 6 weeks x 7 days. The grid starts on
//! the week-start day on or before the first of the month and is padded with
//! days of the adjacent months; six rows fit any Gregorian month regardless
//! of the weekday it starts on.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::attendance::{AttendanceMap, AttendanceStatus, DateKey};
use crate::error::ValidationError;

/// Number of cells in a month grid.
pub const GRID_CELLS: usize = 42;
pub const DAYS_PER_WEEK: usize = 7;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// A calendar month. `month0` is zero-based (January = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month0: u32,
}

impl YearMonth {
    pub fn new(year: i32, month0: u32) -> Result<Self, ValidationError> {
        if month0 > 11 {
            return Err(ValidationError::InvalidMonth(month0));
        }
        if !(1..=9999).contains(&year) {
            return Err(ValidationError::InvalidValue {
                field: "year".into(),
                message: format!("{year} is outside 1..=9999"),
            });
        }
        Ok(Self { year, month0 })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month0: date.month0(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month0(&self) -> u32 {
        self.month0
    }

    /// One-based month number.
    pub fn month(&self) -> u32 {
        self.month0 + 1
    }

    pub fn first_day(&self) -> NaiveDate {
        // Year and month are validated on construction.
        NaiveDate::from_ymd_opt(self.year, self.month(), 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.next().first_day();
        (next - self.first_day()).num_days() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month0
    }

    pub fn prev(&self) -> Self {
        if self.month0 == 0 {
            Self { year: self.year - 1, month0: 11 }
        } else {
            Self { year: self.year, month0: self.month0 - 1 }
        }
    }

    pub fn next(&self) -> Self {
        if self.month0 == 11 {
            Self { year: self.year + 1, month0: 0 }
        } else {
            Self { year: self.year, month0: self.month0 + 1 }
        }
    }

    /// Header label, e.g. `January 2026`.
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month0 as usize], self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    /// Parses `YYYY-MM` (one-based month).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidValue {
            field: "month".into(),
            message: format!("'{s}' is not YYYY-MM"),
        };
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Self::new(year, month - 1)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// First column of the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Columns between the week start and `weekday`.
    fn offset(&self, weekday: Weekday) -> u32 {
        match self {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        }
    }

    pub fn day_names(&self) -> [&'static str; DAYS_PER_WEEK] {
        match self {
            WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStart::Sunday => "sunday",
            WeekStart::Monday => "monday",
        }
    }
}

impl FromStr for WeekStart {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sunday" => Ok(WeekStart::Sunday),
            "monday" => Ok(WeekStart::Monday),
            other => Err(ValidationError::InvalidValue {
                field: "startWeek".into(),
                message: format!("'{other}' is not sunday or monday"),
            }),
        }
    }
}

/// Status class of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    Present,
    Bunked,
    #[serde(rename = "none")]
    Unmarked,
}

impl From<AttendanceStatus> for CellStatus {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => CellStatus::Present,
            AttendanceStatus::Bunked => CellStatus::Bunked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    /// Always `Unmarked` for filler days of adjacent months.
    pub status: CellStatus,
}

impl CalendarCell {
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn key(&self) -> Option<DateKey> {
        DateKey::from_date(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarGrid {
    pub month: YearMonth,
    pub week_start: WeekStart,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    /// Rows of seven cells.
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    pub fn in_month_cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.cells.iter().filter(|c| c.in_month)
    }

    pub fn day_names(&self) -> [&'static str; DAYS_PER_WEEK] {
        self.week_start.day_names()
    }
}

/// Build the 42-cell grid for `month`, reading statuses from `records`.
pub fn month_grid(month: YearMonth, records: &AttendanceMap, week_start: WeekStart) -> CalendarGrid {
    let first = month.first_day();
    let start = first - Duration::days(i64::from(week_start.offset(first.weekday())));

    let cells = (0..GRID_CELLS as i64)
        .map(|i| {
            let date = start + Duration::days(i);
            let in_month = month.contains(date);
            let status = if in_month {
                DateKey::from_date(date)
                    .and_then(|key| records.get(&key))
                    .map(|record| CellStatus::from(record.status))
                    .unwrap_or(CellStatus::Unmarked)
            } else {
                CellStatus::Unmarked
            };
            CalendarCell { date, in_month, status }
        })
        .collect();

    CalendarGrid {
        month,
        week_start,
        cells,
    }
}

//! Calendar arithmetic for month and week views.
//!
//! Weeks run Sunday through Saturday. The month grid always shows five weeks
//! starting at the Sunday on or before the first day of the month.

use chrono::{Datelike, Days, Months, NaiveDate};

/// Wire and display format for calendar dates.
pub const YMD_FORMAT: &str = "%Y-%m-%d";

/// Number of weeks shown by the month grid.
pub const GRID_WEEKS: u64 = 5;

const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

/// Column headings for Sunday-first weeks
pub const WEEKDAY_ABBREVIATIONS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
  chrono::Local::now().date_naive()
}

/// Name of a month given its 1-based number
pub fn month_name(month: u32) -> &'static str {
  month
    .checked_sub(1)
    .and_then(|i| MONTH_NAMES.get(i as usize))
    .copied()
    .unwrap_or("Invalid month")
}

/// The Sunday on or before `date`
pub fn last_sunday(date: NaiveDate) -> NaiveDate {
  let diff = date.weekday().num_days_from_sunday() as u64;
  date - Days::new(diff)
}

/// The Saturday on or after `date`
pub fn next_saturday(date: NaiveDate) -> NaiveDate {
  let diff = 6 - date.weekday().num_days_from_sunday() as u64;
  date + Days::new(diff)
}

/// Sunday..=Saturday week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
  (last_sunday(date), next_saturday(date))
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

/// Move `months` months forward (or backward when negative), landing on the
/// first day of the target month.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
  let first = first_of_month(date);
  let shifted = if months >= 0 {
    first.checked_add_months(Months::new(months as u32))
  } else {
    first.checked_sub_months(Months::new(months.unsigned_abs()))
  };
  shifted.unwrap_or(first)
}

/// Shift by a signed number of days, saturating at the calendar limits.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
  let shifted = if days >= 0 {
    date.checked_add_days(Days::new(days as u64))
  } else {
    date.checked_sub_days(Days::new(days.unsigned_abs()))
  };
  shifted.unwrap_or(date)
}

/// Inclusive bounds of the five-week grid shown for `date`'s month
pub fn month_grid(date: NaiveDate) -> (NaiveDate, NaiveDate) {
  let start = last_sunday(first_of_month(date));
  let end = start + Days::new(GRID_WEEKS * 7 - 1);
  (start, end)
}

/// "January 2024"
pub fn month_title(date: NaiveDate) -> String {
  format!("{} {}", month_name(date.month()), date.year())
}

/// "December 31, 2023 - January 6, 2024"
pub fn week_title(date: NaiveDate) -> String {
  let (start, end) = week_bounds(date);
  format!(
    "{} {}, {} - {} {}, {}",
    month_name(start.month()),
    start.day(),
    start.year(),
    month_name(end.month()),
    end.day(),
    end.year()
  )
}

pub fn format_ymd(date: NaiveDate) -> String {
  date.format(YMD_FORMAT).to_string()
}

pub fn parse_ymd(s: &str) -> Result<NaiveDate, chrono::ParseError> {
  NaiveDate::parse_from_str(s.trim(), YMD_FORMAT)
}

/// Serde adapter for `YYYY-MM-DD` dates.
pub mod ymd {
  use chrono::NaiveDate;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&super::format_ymd(*date))
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    super::parse_ymd(&s).map_err(serde::de::Error::custom)
  }
}

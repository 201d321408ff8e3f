//! Calendar windows and business-timezone conversions.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

use crate::attendance::error::{AttendanceError, Result};

const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 9999;

/// Calendar date of an instant as seen in the business timezone.
pub fn business_date(instant: DateTime<Utc>, tz: &FixedOffset) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Seconds since business-local midnight.
pub fn seconds_of_day(instant: DateTime<Utc>, tz: &FixedOffset) -> u32 {
    instant.with_timezone(tz).num_seconds_from_midnight()
}

/// Business-local wall clock time of an instant, truncated to the second.
pub fn local_time(instant: DateTime<Utc>, tz: &FixedOffset) -> NaiveTime {
    let secs = seconds_of_day(instant, tz);
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN)
}

/// Today's date in the business timezone.
pub fn business_today(tz: &FixedOffset) -> NaiveDate {
    business_date(Utc::now(), tz)
}

/// An inclusive range of business-local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl Window {
    pub fn new(first_day: NaiveDate, last_day: NaiveDate) -> Result<Self> {
        if last_day < first_day {
            return Err(AttendanceError::invalid_window(format!(
                "end {last_day} is before start {first_day}"
            )));
        }
        Ok(Self { first_day, last_day })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            first_day: date,
            last_day: date,
        }
    }

    pub fn month(year: i32, month: u32) -> Result<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(AttendanceError::invalid_window(format!(
                "year {year} is outside {MIN_YEAR}..={MAX_YEAR}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(AttendanceError::invalid_window(format!(
                "month {month} is outside 1..=12"
            )));
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AttendanceError::invalid_window(format!("{year}-{month} is not a date")))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| AttendanceError::invalid_window(format!("{year}-{month} has no successor")))?;

        Self::new(first_day, next_month - Duration::days(1))
    }

    /// From the first of `date`'s month up to and including `date`.
    pub fn month_to_date(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
            last_day: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day <= date && date <= self.last_day
    }

    pub fn day_count(&self) -> u32 {
        (self.last_day - self.first_day).num_days() as u32 + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last_day = self.last_day;
        self.first_day.iter_days().take_while(move |d| *d <= last_day)
    }

    /// Half-open `[start, end)` UTC instants covering the window in the
    /// business timezone.
    pub fn instants(&self, tz: &FixedOffset) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let end_day = self
            .last_day
            .succ_opt()
            .ok_or_else(|| AttendanceError::invalid_window("window ends at the last representable day"))?;
        Ok((local_midnight(self.first_day, tz)?, local_midnight(end_day, tz)?))
    }
}

fn local_midnight(date: NaiveDate, tz: &FixedOffset) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| AttendanceError::internal(format!("no single local midnight for {date}")))
}

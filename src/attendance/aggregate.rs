//! Folding classified days into monthly and cross-employee statistics.

use std::iter::Sum;

use chrono::{NaiveTime, Timelike};
use derive_more::{Add, AddAssign};
use serde::Serialize;
use utoipa::ToSchema;

use crate::attendance::classify::{AbsenceRule, DayAttendanceRecord};
use crate::utils::time_utils::{average_time_of_day, round2};

/// Per-employee statistics over a calendar window, usually one month.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyStatistics {
    /// Days with a check-in and a check-out.
    pub working_days: u32,
    /// Days with at least one punch.
    pub present_days: u32,
    pub late_days: u32,
    pub early_leave_days: u32,
    /// Days with a single punch and no checkout.
    pub absent_days: u32,
    pub total_working_hours: f64,
    pub overtime_minutes: i64,
    pub overtime_hours: f64,
    #[schema(value_type = Option<String>, example = "07:55:00")]
    pub average_checkin_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:20:00")]
    pub average_checkout_time: Option<NaiveTime>,
    /// `working_days / days_in_window * 100`, two decimals, never clamped.
    pub attendance_rate: f64,
}

/// Running fold behind [`MonthlyStatistics`].
#[derive(Debug, Default, Clone)]
pub struct MonthlyAccumulator {
    working_days: u32,
    present_days: u32,
    late_days: u32,
    early_leave_days: u32,
    absent_days: u32,
    worked_minutes: i64,
    overtime_minutes: i64,
    checkin_minutes: Vec<u32>,
    checkout_minutes: Vec<u32>,
}

impl MonthlyAccumulator {
    pub fn push(&mut self, record: &DayAttendanceRecord) {
        if !record.is_present {
            return;
        }
        self.present_days += 1;
        if record.is_late {
            self.late_days += 1;
        }
        if record.is_absent_under(AbsenceRule::MissingCheckout) {
            self.absent_days += 1;
        }
        if let Some(checkin) = record.checkin_time {
            self.checkin_minutes.push(minutes_of(checkin));
        }
        if record.has_checkout() {
            self.working_days += 1;
            self.worked_minutes += record.worked_minutes;
            self.overtime_minutes += record.overtime_minutes;
            if record.is_early_leave {
                self.early_leave_days += 1;
            }
            if let Some(checkout) = record.checkout_time {
                self.checkout_minutes.push(minutes_of(checkout));
            }
        }
    }

    pub fn finish(self, days_in_window: u32) -> MonthlyStatistics {
        let attendance_rate = if days_in_window == 0 {
            0.0
        } else {
            round2(f64::from(self.working_days) / f64::from(days_in_window) * 100.0)
        };
        MonthlyStatistics {
            working_days: self.working_days,
            present_days: self.present_days,
            late_days: self.late_days,
            early_leave_days: self.early_leave_days,
            absent_days: self.absent_days,
            total_working_hours: round2(self.worked_minutes as f64 / 60.0),
            overtime_minutes: self.overtime_minutes,
            overtime_hours: round2(self.overtime_minutes as f64 / 60.0),
            average_checkin_time: average_time_of_day(&self.checkin_minutes),
            average_checkout_time: average_time_of_day(&self.checkout_minutes),
            attendance_rate,
        }
    }
}

impl<'a> FromIterator<&'a DayAttendanceRecord> for MonthlyAccumulator {
    fn from_iter<I: IntoIterator<Item = &'a DayAttendanceRecord>>(records: I) -> Self {
        let mut acc = Self::default();
        for record in records {
            acc.push(record);
        }
        acc
    }
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Cross-employee counts for one day or month.
///
/// Every field is a plain sum, so partial results over disjoint employee
/// sets can be added in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema, Add, AddAssign)]
pub struct OverviewStatistics {
    pub total_employees: u32,
    pub employees_present: u32,
    pub employees_absent: u32,
    pub total_late: u32,
    pub total_early_leave: u32,
    pub total_overtime_minutes: i64,
}

impl OverviewStatistics {
    /// Contribution of a single employee's classified days in the window.
    /// Presence is counted once per employee, lateness once per day.
    pub fn from_employee_days(records: &[DayAttendanceRecord]) -> Self {
        let present = !records
            .iter()
            .all(|r| r.is_absent_under(AbsenceRule::NoEvents));
        Self {
            total_employees: 1,
            employees_present: u32::from(present),
            employees_absent: u32::from(!present),
            total_late: records.iter().filter(|r| r.is_late).count() as u32,
            total_early_leave: records.iter().filter(|r| r.is_early_leave).count() as u32,
            total_overtime_minutes: records.iter().map(|r| r.overtime_minutes).sum(),
        }
    }
}

impl Sum for OverviewStatistics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, part| acc + part)
    }
}

//! Decorated result records returned to callers.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use crate::attendance::aggregate::{MonthlyAccumulator, MonthlyStatistics, OverviewStatistics};
use crate::attendance::classify::DayAttendanceRecord;
use crate::attendance::shift::{ShiftPolicy, ShiftVariant};
use crate::attendance::window::{Window, local_time};
use crate::model::employee::EmployeeProfile;
use crate::utils::time_utils::format_minutes;

pub const ALL_DEPARTMENTS: &str = "All Departments";
pub const ALL_POSITIONS: &str = "All Positions";
const NOT_AVAILABLE: &str = "N/A";

/// An employee left out of an aggregate, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SkippedEmployee {
    #[schema(example = "NV009")]
    pub employee_id: String,
    #[schema(example = "employee NV009 has unknown shift variant '<unset>'")]
    pub reason: String,
}

/// Department and position names used to decorate output.
#[derive(Debug, Clone, Default)]
pub struct NameBook {
    pub departments: HashMap<u64, String>,
    pub positions: HashMap<u64, String>,
}

impl NameBook {
    pub fn department(&self, id: Option<u64>) -> String {
        lookup(&self.departments, id)
    }

    pub fn position(&self, id: Option<u64>) -> String {
        lookup(&self.positions, id)
    }
}

fn lookup(names: &HashMap<u64, String>, id: Option<u64>) -> String {
    id.and_then(|id| names.get(&id).cloned())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeInfo {
    #[schema(example = "NV001")]
    pub employee_id: String,
    #[schema(example = "Nguyen Van A")]
    pub full_name: String,
    #[schema(example = "Engineering")]
    pub department_name: String,
    #[schema(example = "Developer")]
    pub position_name: String,
    pub shift: Option<ShiftVariant>,
}

impl EmployeeInfo {
    pub fn new(employee: &EmployeeProfile, names: &NameBook) -> Self {
        Self {
            employee_id: employee.employee_id.clone(),
            full_name: employee.full_name.clone(),
            department_name: names.department(employee.department_id),
            position_name: names.position(employee.position_id),
            shift: ShiftVariant::from_label(employee.shift.as_deref()),
        }
    }
}

/// One present day in a monthly report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayRecordSummary {
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, example = "07:55:00")]
    pub checkin_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:05:00")]
    pub checkout_time: Option<NaiveTime>,
    pub is_late: bool,
    pub is_early_leave: bool,
    pub overtime_minutes: i64,
}

impl From<&DayAttendanceRecord> for DayRecordSummary {
    fn from(record: &DayAttendanceRecord) -> Self {
        Self {
            date: record.date,
            checkin_time: record.checkin_time,
            checkout_time: record.checkout_time,
            is_late: record.is_late,
            is_early_leave: record.is_early_leave,
            overtime_minutes: record.overtime_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeMonthlyReport {
    pub employee: EmployeeInfo,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
    pub statistics: MonthlyStatistics,
    /// Days with at least one punch, ascending.
    pub daily_records: Vec<DayRecordSummary>,
}

impl EmployeeMonthlyReport {
    /// Fold the employee's classified days of a whole month.
    pub fn new(employee: EmployeeInfo, window: &Window, days: &[DayAttendanceRecord]) -> Self {
        Self {
            employee,
            year: window.first_day.year(),
            month: window.first_day.month(),
            statistics: days
                .iter()
                .collect::<MonthlyAccumulator>()
                .finish(window.day_count()),
            daily_records: days
                .iter()
                .filter(|r| r.is_present)
                .map(DayRecordSummary::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub department_name: String,
    pub position_name: String,
    pub employees: Vec<EmployeeMonthlyReport>,
    pub skipped: Vec<SkippedEmployee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceOverview {
    #[schema(value_type = String, format = "date")]
    pub first_day: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub last_day: NaiveDate,
    #[schema(example = "All Departments")]
    pub department_name: String,
    #[schema(example = "All Positions")]
    pub position_name: String,
    #[serde(flatten)]
    pub statistics: OverviewStatistics,
    #[schema(example = "1h 10m")]
    pub total_overtime_hours: String,
    pub skipped: Vec<SkippedEmployee>,
}

impl AttendanceOverview {
    pub fn total_overtime(statistics: &OverviewStatistics) -> String {
        format_minutes(statistics.total_overtime_minutes)
    }
}

/// Daily exception lists: who was late, left early or stayed late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExceptionKind {
    Late,
    EarlyLeave,
    Overtime,
}

impl ExceptionKind {
    pub fn applies(&self, record: &DayAttendanceRecord) -> bool {
        match self {
            ExceptionKind::Late => record.is_late,
            ExceptionKind::EarlyLeave => record.is_early_leave,
            ExceptionKind::Overtime => record.overtime_minutes > 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ExceptionEntry {
    pub employee: EmployeeInfo,
    #[schema(value_type = Option<String>, example = "08:12:00")]
    pub checkin_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:10:00")]
    pub checkout_time: Option<NaiveTime>,
    /// Shift boundary the day was judged against.
    #[schema(value_type = String, example = "08:00:00")]
    pub policy_time: NaiveTime,
    pub late_minutes: i64,
    pub overtime_minutes: i64,
    /// Days from the first of the month up to the report date with the same exception.
    pub month_count: u32,
    pub month_overtime_minutes: i64,
    #[schema(example = "3h 5m")]
    pub month_overtime: String,
}

impl ExceptionEntry {
    /// Build the entry for `date` when that day shows the exception.
    ///
    /// `month_days` are the employee's classified days from the first of the
    /// month through `date`.
    pub fn build(
        kind: ExceptionKind,
        employee: &EmployeeProfile,
        policy: &ShiftPolicy,
        names: &NameBook,
        month_days: &[DayAttendanceRecord],
        date: NaiveDate,
    ) -> Option<Self> {
        let today = month_days.iter().find(|r| r.date == date)?;
        if !kind.applies(today) {
            return None;
        }
        let month_count = month_days.iter().filter(|r| kind.applies(r)).count() as u32;
        let month_overtime_minutes = month_days.iter().map(|r| r.overtime_minutes).sum();
        let policy_time = match kind {
            ExceptionKind::Late => policy.late_time(),
            ExceptionKind::EarlyLeave | ExceptionKind::Overtime => policy.shift_end(),
        };
        Some(Self {
            employee: EmployeeInfo::new(employee, names),
            checkin_time: today.checkin_time,
            checkout_time: today.checkout_time,
            policy_time,
            late_minutes: today.late_minutes,
            overtime_minutes: today.overtime_minutes,
            month_count,
            month_overtime_minutes,
            month_overtime: format_minutes(month_overtime_minutes),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ExceptionReport {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    pub department_name: String,
    /// Every employee in scope, including the ones listed under `skipped`.
    pub total_employees: u32,
    pub matched_employees: u32,
    pub employees: Vec<ExceptionEntry>,
    pub skipped: Vec<SkippedEmployee>,
}

/// One employee's status on a day next to their month-to-date totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeAttendanceSummary {
    pub employee: EmployeeInfo,
    pub is_present_today: bool,
    #[schema(value_type = Option<String>, example = "07:55:00")]
    pub first_checkin_today: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:05:00")]
    pub last_checkin_today: Option<NaiveTime>,
    /// Punches from the first of the month through the day.
    pub total_checkins_this_month: u32,
    pub late_days_this_month: u32,
    pub early_leave_days_this_month: u32,
    pub overtime_minutes_this_month: i64,
    #[schema(example = "3h 5m")]
    pub overtime_this_month: String,
}

impl EmployeeAttendanceSummary {
    /// `month_days` are the employee's classified days from the first of the
    /// month through `date`.
    pub fn build(
        employee: &EmployeeProfile,
        names: &NameBook,
        month_days: &[DayAttendanceRecord],
        date: NaiveDate,
        tz: &FixedOffset,
    ) -> Self {
        let today = month_days.iter().find(|r| r.date == date);
        let today_time = |instant: Option<DateTime<Utc>>| instant.map(|i| local_time(i, tz));
        let overtime_minutes_this_month = month_days.iter().map(|r| r.overtime_minutes).sum();

        Self {
            employee: EmployeeInfo::new(employee, names),
            is_present_today: today.is_some_and(|r| r.is_present),
            first_checkin_today: today.and_then(|r| today_time(r.first_event)),
            last_checkin_today: today.and_then(|r| today_time(r.last_event)),
            total_checkins_this_month: month_days.iter().map(|r| r.event_count as u32).sum(),
            late_days_this_month: month_days.iter().filter(|r| r.is_late).count() as u32,
            early_leave_days_this_month: month_days.iter().filter(|r| r.is_early_leave).count()
                as u32,
            overtime_minutes_this_month,
            overtime_this_month: format_minutes(overtime_minutes_this_month),
        }
    }
}

/// Every employee in scope with today's status and month-to-date totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceRoster {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub department_name: String,
    pub position_name: String,
    pub employees: Vec<EmployeeAttendanceSummary>,
    pub skipped: Vec<SkippedEmployee>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::classify::classify;
    use crate::model::checkin::{Checkin, CheckinStatus};
    use chrono::{FixedOffset, TimeZone, Utc};

    fn ict() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn employee() -> EmployeeProfile {
        EmployeeProfile {
            employee_id: "NV001".to_string(),
            full_name: "Nguyen Van A".to_string(),
            shift: Some("Cả ngày".to_string()),
            department_id: Some(10),
            position_id: None,
            device_id: None,
        }
    }

    fn day(d: u32, punches: &[(u32, u32)]) -> DayAttendanceRecord {
        let events: Vec<_> = punches
            .iter()
            .map(|(h, m)| Checkin {
                employee_id: "NV001".to_string(),
                device_id: "GATE-01".to_string(),
                timestamp: ict().with_ymd_and_hms(2026, 3, d, *h, *m, 0).unwrap().with_timezone(&Utc),
                status: CheckinStatus::Checkin,
            })
            .collect();
        classify(
            "NV001",
            NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
            &events,
            &ShiftPolicy::FULL_DAY,
            &ict(),
        )
        .unwrap()
    }

    fn names() -> NameBook {
        let mut book = NameBook::default();
        book.departments.insert(10, "Engineering".to_string());
        book
    }

    #[test]
    fn employee_info_decorates_and_falls_back() {
        let info = EmployeeInfo::new(&employee(), &names());
        assert_eq!(info.department_name, "Engineering");
        assert_eq!(info.position_name, "N/A");
        assert_eq!(info.shift, Some(ShiftVariant::FullDay));
    }

    #[test]
    fn late_entry_counts_month_to_date() {
        let month = vec![day(1, &[(8, 30), (17, 0)]), day(2, &[]), day(3, &[(8, 12)])];
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let entry = ExceptionEntry::build(
            ExceptionKind::Late,
            &employee(),
            &ShiftPolicy::FULL_DAY,
            &names(),
            &month,
            date,
        )
        .unwrap();
        assert_eq!(entry.late_minutes, 12);
        assert_eq!(entry.month_count, 2);
        assert_eq!(entry.policy_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(entry.checkout_time, None);
    }

    #[test]
    fn no_entry_when_day_is_clean() {
        let month = vec![day(1, &[(8, 30), (17, 0)]), day(2, &[(7, 45), (17, 0)])];
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        for kind in [ExceptionKind::Late, ExceptionKind::EarlyLeave, ExceptionKind::Overtime] {
            assert!(
                ExceptionEntry::build(kind, &employee(), &ShiftPolicy::FULL_DAY, &names(), &month, date)
                    .is_none(),
                "{kind}"
            );
        }
    }

    #[test]
    fn overtime_entry_formats_month_total() {
        let month = vec![day(1, &[(8, 0), (18, 0)]), day(2, &[(8, 0), (19, 5)])];
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let entry = ExceptionEntry::build(
            ExceptionKind::Overtime,
            &employee(),
            &ShiftPolicy::FULL_DAY,
            &names(),
            &month,
            date,
        )
        .unwrap();
        assert_eq!(entry.overtime_minutes, 125);
        assert_eq!(entry.month_count, 2);
        assert_eq!(entry.month_overtime_minutes, 185);
        assert_eq!(entry.month_overtime, "3h 5m");
    }

    #[test]
    fn exception_kind_displays_snake_case() {
        assert_eq!(ExceptionKind::EarlyLeave.to_string(), "early_leave");
        assert_eq!(ExceptionKind::Overtime.to_string(), "overtime");
    }

    #[test]
    fn monthly_report_lists_present_days_only() {
        let month = vec![day(1, &[(8, 30), (18, 0)]), day(2, &[]), day(3, &[(7, 50)])];
        let window = Window::month(2026, 3).unwrap();
        let info = EmployeeInfo::new(&employee(), &names());
        let report = EmployeeMonthlyReport::new(info, &window, &month);

        assert_eq!(report.year, 2026);
        assert_eq!(report.month, 3);
        assert_eq!(report.statistics.present_days, 2);
        let dates: Vec<_> = report.daily_records.iter().map(|r| r.date.day()).collect();
        assert_eq!(dates, vec![1, 3]);
        assert!(report.daily_records[0].is_late);
        assert_eq!(report.daily_records[0].overtime_minutes, 60);
        assert_eq!(report.daily_records[1].checkout_time, None);
    }

    #[test]
    fn roster_entry_combines_today_and_month() {
        let month = vec![
            day(1, &[(8, 30), (18, 0)]),
            day(2, &[(7, 40), (12, 0), (16, 30)]),
        ];
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let entry = EmployeeAttendanceSummary::build(&employee(), &names(), &month, date, &ict());

        assert!(entry.is_present_today);
        assert_eq!(entry.first_checkin_today, NaiveTime::from_hms_opt(7, 40, 0));
        assert_eq!(entry.last_checkin_today, NaiveTime::from_hms_opt(16, 30, 0));
        assert_eq!(entry.total_checkins_this_month, 5);
        assert_eq!(entry.late_days_this_month, 1);
        assert_eq!(entry.early_leave_days_this_month, 1);
        assert_eq!(entry.overtime_minutes_this_month, 60);
        assert_eq!(entry.overtime_this_month, "1h 0m");
    }

    #[test]
    fn roster_entry_for_absent_day() {
        let month = vec![day(1, &[(8, 0), (17, 0)]), day(2, &[])];
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let entry = EmployeeAttendanceSummary::build(&employee(), &names(), &month, date, &ict());
        assert!(!entry.is_present_today);
        assert_eq!(entry.first_checkin_today, None);
        assert_eq!(entry.last_checkin_today, None);
        assert_eq!(entry.total_checkins_this_month, 2);
    }
}

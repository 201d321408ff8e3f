use crate::api::attendance::{DayQuery, ExceptionQuery, MonthQuery, MonthlyScopeQuery, OverviewQuery};
use crate::attendance::aggregate::{MonthlyStatistics, OverviewStatistics};
use crate::attendance::classify::DayAttendanceRecord;
use crate::attendance::report::{
    AttendanceOverview, AttendanceRoster, DayRecordSummary, EmployeeAttendanceSummary, EmployeeInfo,
    EmployeeMonthlyReport, ExceptionEntry, ExceptionKind, ExceptionReport, MonthlySummary,
    SkippedEmployee,
};
use crate::attendance::shift::ShiftVariant;
use crate::attendance::store::ScopeFilter;
use crate::model::checkin::Checkin;
use crate::model::employee::EmployeeProfile;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance Classification & Reporting

Turns raw device punches into per-day attendance facts and rolls them up.

### 🔹 Key Features
- **Day classification**
  - On time, late, early leave, overtime or absent, judged against the employee's shift
- **Monthly statistics**
  - Working days, late days, working hours, overtime, average check-in/check-out, attendance rate
- **Overviews**
  - Cross-employee counts for a day or month, scoped by department, position, device or employee
- **Roster**
  - Every employee in scope with today's status and month-to-date totals
- **Exception lists**
  - Late, early-leave and overtime employees for a day, with month-to-date counts

### 🕒 Time
Days and shift boundaries are evaluated in the configured business timezone
(UTC+07:00 unless `BUSINESS_UTC_OFFSET_MINUTES` says otherwise).

### 📦 Response Format
- JSON responses; errors carry a `message` field
- Employees that cannot be classified are listed under `skipped`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::day_attendance,
        crate::api::attendance::monthly_statistics,
        crate::api::attendance::overview,
        crate::api::attendance::monthly_overview,
        crate::api::attendance::monthly_summary,
        crate::api::attendance::roster,
        crate::api::attendance::late_employees,
        crate::api::attendance::early_leave_employees,
        crate::api::attendance::overtime_employees
    ),
    components(
        schemas(
            DayQuery,
            MonthQuery,
            OverviewQuery,
            MonthlyScopeQuery,
            ExceptionQuery,
            ScopeFilter,
            Checkin,
            EmployeeProfile,
            ShiftVariant,
            DayAttendanceRecord,
            MonthlyStatistics,
            OverviewStatistics,
            EmployeeInfo,
            DayRecordSummary,
            EmployeeMonthlyReport,
            MonthlySummary,
            EmployeeAttendanceSummary,
            AttendanceRoster,
            AttendanceOverview,
            SkippedEmployee,
            ExceptionKind,
            ExceptionEntry,
            ExceptionReport
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance classification and reporting APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance/employees/{employee_id}/day",
            "/api/attendance/employees/{employee_id}/monthly",
            "/api/attendance/overview",
            "/api/attendance/overview/monthly",
            "/api/attendance/summary",
            "/api/attendance/employees",
            "/api/attendance/late",
            "/api/attendance/early-leave",
            "/api/attendance/overtime",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}

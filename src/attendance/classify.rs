//! Classification of one employee's business day.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::attendance::error::{AttendanceError, Result};
use crate::attendance::shift::ShiftPolicy;
use crate::attendance::window::{business_date, local_time, seconds_of_day};
use crate::model::checkin::Checkin;
use crate::utils::time_utils::round_to_minutes;

/// How a day without a complete check-in/check-out pair is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsenceRule {
    /// Absent only when there are no punches at all.
    NoEvents,
    /// Absent when the day has a single punch and never checked out.
    MissingCheckout,
}

/// Attendance facts derived from one day bucket.
///
/// Early leave and overtime are only evaluated when the day has a checkout
/// (two or more punches); otherwise they read `false`/`0` and
/// [`DayAttendanceRecord::has_checkout`] tells the caller why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayAttendanceRecord {
    #[schema(example = "NV001")]
    pub employee_id: String,

    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub first_event: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_event: Option<DateTime<Utc>>,

    /// Business-local time of the first punch.
    #[schema(value_type = Option<String>, example = "07:50:00")]
    pub checkin_time: Option<NaiveTime>,

    /// Business-local time of the last punch, only when it is a checkout.
    #[schema(value_type = Option<String>, example = "18:10:00")]
    pub checkout_time: Option<NaiveTime>,

    pub event_count: usize,
    pub is_present: bool,
    pub is_absent: bool,
    pub is_late: bool,
    pub late_minutes: i64,
    pub is_early_leave: bool,
    pub overtime_minutes: i64,
    pub worked_minutes: i64,

    /// Every punch of the day, including the ones between first and last.
    pub events: Vec<Checkin>,
}

impl DayAttendanceRecord {
    fn empty(employee_id: &str, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            date,
            first_event: None,
            last_event: None,
            checkin_time: None,
            checkout_time: None,
            event_count: 0,
            is_present: false,
            is_absent: true,
            is_late: false,
            late_minutes: 0,
            is_early_leave: false,
            overtime_minutes: 0,
            worked_minutes: 0,
            events: Vec::new(),
        }
    }

    pub fn has_checkout(&self) -> bool {
        self.event_count >= 2
    }

    pub fn is_absent_under(&self, rule: AbsenceRule) -> bool {
        match rule {
            AbsenceRule::NoEvents => !self.is_present,
            AbsenceRule::MissingCheckout => self.event_count == 1,
        }
    }
}

/// Classify one ordered day bucket against a shift policy.
///
/// The first punch is the check-in and the last one the check-out. Threshold
/// comparisons use the business-local time of day of the punch itself, so the
/// result depends only on the bucket and the policy.
pub fn classify(
    employee_id: &str,
    date: NaiveDate,
    events: &[Checkin],
    policy: &ShiftPolicy,
    tz: &FixedOffset,
) -> Result<DayAttendanceRecord> {
    validate_bucket(employee_id, date, events, tz)?;

    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Ok(DayAttendanceRecord::empty(employee_id, date));
    };

    let checkin_secs = i64::from(seconds_of_day(first.timestamp, tz));
    let late_secs = checkin_secs - i64::from(policy.late_threshold_secs());
    let is_late = late_secs > 0;

    let mut record = DayAttendanceRecord {
        employee_id: employee_id.to_string(),
        date,
        first_event: Some(first.timestamp),
        last_event: Some(last.timestamp),
        checkin_time: Some(local_time(first.timestamp, tz)),
        checkout_time: None,
        event_count: events.len(),
        is_present: true,
        is_absent: false,
        is_late,
        late_minutes: if is_late { round_to_minutes(late_secs) } else { 0 },
        is_early_leave: false,
        overtime_minutes: 0,
        worked_minutes: 0,
        events: events.to_vec(),
    };

    if events.len() >= 2 {
        let checkout_secs = i64::from(seconds_of_day(last.timestamp, tz));
        record.checkout_time = Some(local_time(last.timestamp, tz));
        record.is_early_leave = checkout_secs < i64::from(policy.early_leave_threshold_secs());
        record.overtime_minutes =
            round_to_minutes(checkout_secs - i64::from(policy.overtime_threshold_secs()));
        record.worked_minutes = round_to_minutes((last.timestamp - first.timestamp).num_seconds());
    }

    Ok(record)
}

fn validate_bucket(
    employee_id: &str,
    date: NaiveDate,
    events: &[Checkin],
    tz: &FixedOffset,
) -> Result<()> {
    if let Some(stray) = events.iter().find(|e| e.employee_id != employee_id) {
        return Err(AttendanceError::internal(format!(
            "bucket {employee_id}/{date} holds an event of {}",
            stray.employee_id
        )));
    }
    if let Some(stray) = events.iter().find(|e| business_date(e.timestamp, tz) != date) {
        return Err(AttendanceError::internal(format!(
            "bucket {employee_id}/{date} holds an event at {}",
            stray.timestamp
        )));
    }
    if events.windows(2).any(|pair| pair[0].timestamp > pair[1].timestamp) {
        return Err(AttendanceError::internal(format!(
            "bucket {employee_id}/{date} is not in chronological order"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::shift::ShiftVariant;
    use crate::model::checkin::CheckinStatus;
    use chrono::TimeZone;

    fn ict() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    /// A punch at business-local `h:m:s` on [`day`].
    fn punch(h: u32, m: u32, s: u32) -> Checkin {
        let local = ict().with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap();
        Checkin {
            employee_id: "NV001".to_string(),
            device_id: "GATE-01".to_string(),
            timestamp: local.with_timezone(&Utc),
            status: CheckinStatus::Checkin,
        }
    }

    fn run(events: &[Checkin], variant: ShiftVariant) -> DayAttendanceRecord {
        classify("NV001", day(), events, &ShiftPolicy::resolve(variant), &ict()).unwrap()
    }

    #[test]
    fn no_events_is_not_present() {
        let record = run(&[], ShiftVariant::FullDay);
        assert!(!record.is_present);
        assert!(record.is_absent);
        assert!(!record.is_late);
        assert!(!record.is_early_leave);
        assert_eq!(record.overtime_minutes, 0);
        assert_eq!(record.first_event, None);
    }

    #[test]
    fn single_event_only_evaluates_lateness() {
        let record = run(&[punch(8, 20, 0)], ShiftVariant::FullDay);
        assert!(record.is_present);
        assert!(record.is_late);
        assert_eq!(record.late_minutes, 20);
        assert!(!record.has_checkout());
        assert!(!record.is_early_leave);
        assert_eq!(record.overtime_minutes, 0);
        assert_eq!(record.checkout_time, None);

        // a lone punch at 21:00 is neither an early leave nor overtime
        let evening = run(&[punch(21, 0, 0)], ShiftVariant::FullDay);
        assert!(evening.is_late);
        assert!(!evening.is_early_leave);
        assert_eq!(evening.overtime_minutes, 0);
    }

    #[test]
    fn single_event_on_time() {
        let record = run(&[punch(7, 59, 59)], ShiftVariant::FullDay);
        assert!(!record.is_late);
        assert_eq!(record.late_minutes, 0);
    }

    #[test]
    fn exactly_on_threshold_is_not_late() {
        assert!(!run(&[punch(8, 0, 0)], ShiftVariant::MorningOnly).is_late);
        assert!(run(&[punch(8, 0, 1)], ShiftVariant::MorningOnly).is_late);
    }

    #[test]
    fn morning_shift_late_and_early_leave() {
        let record = run(&[punch(8, 5, 0), punch(11, 50, 0)], ShiftVariant::MorningOnly);
        assert!(record.is_late);
        assert_eq!(record.late_minutes, 5);
        assert!(record.is_early_leave);
        assert_eq!(record.overtime_minutes, 0);
    }

    #[test]
    fn full_day_overtime() {
        let record = run(&[punch(7, 50, 0), punch(18, 10, 0)], ShiftVariant::FullDay);
        assert!(!record.is_late);
        assert!(!record.is_early_leave);
        assert_eq!(record.overtime_minutes, 70);
        assert_eq!(record.worked_minutes, 10 * 60 + 20);
        assert_eq!(record.checkout_time, NaiveTime::from_hms_opt(18, 10, 0));
    }

    #[test]
    fn middle_events_are_ignored_but_retained() {
        let events = [punch(12, 55, 0), punch(15, 0, 0), punch(16, 0, 0), punch(17, 30, 0)];
        let record = run(&events, ShiftVariant::AfternoonOnly);
        assert!(!record.is_late);
        assert!(!record.is_early_leave);
        assert_eq!(record.overtime_minutes, 30);
        assert_eq!(record.event_count, 4);
        assert_eq!(record.events.len(), 4);
    }

    #[test]
    fn overtime_is_never_negative() {
        let record = run(&[punch(7, 0, 0), punch(9, 0, 0)], ShiftVariant::FullDay);
        assert_eq!(record.overtime_minutes, 0);
        assert!(record.is_early_leave);
    }

    #[test]
    fn classification_is_idempotent() {
        let events = [punch(8, 30, 0), punch(17, 45, 0)];
        let policy = ShiftPolicy::resolve(ShiftVariant::FullDay);
        let a = classify("NV001", day(), &events, &policy, &ict()).unwrap();
        let b = classify("NV001", day(), &events, &policy, &ict()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn absence_rules() {
        let none = run(&[], ShiftVariant::FullDay);
        let one = run(&[punch(8, 0, 0)], ShiftVariant::FullDay);
        let two = run(&[punch(8, 0, 0), punch(17, 0, 0)], ShiftVariant::FullDay);

        assert!(none.is_absent_under(AbsenceRule::NoEvents));
        assert!(!one.is_absent_under(AbsenceRule::NoEvents));
        assert!(!none.is_absent_under(AbsenceRule::MissingCheckout));
        assert!(one.is_absent_under(AbsenceRule::MissingCheckout));
        assert!(!two.is_absent_under(AbsenceRule::MissingCheckout));
    }

    #[test]
    fn unordered_bucket_fails_loudly() {
        let err = classify(
            "NV001",
            day(),
            &[punch(17, 0, 0), punch(8, 0, 0)],
            &ShiftPolicy::FULL_DAY,
            &ict(),
        )
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Internal(_)));
    }

    #[test]
    fn foreign_events_fail_loudly() {
        let mut other = punch(8, 0, 0);
        other.employee_id = "NV002".to_string();
        assert!(classify("NV001", day(), &[other], &ShiftPolicy::FULL_DAY, &ict()).is_err());

        let next_day = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        assert!(classify("NV001", next_day, &[punch(8, 0, 0)], &ShiftPolicy::FULL_DAY, &ict()).is_err());
    }
}

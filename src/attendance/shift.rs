//! Shift policy resolution.
//!
//! Every threshold lives here, once per variant, as business-local minutes
//! since midnight. Classification never computes its own boundaries.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::attendance::error::{AttendanceError, Result};
use crate::model::employee::EmployeeProfile;

/// Closed set of work schedules an employee can be assigned to.
///
/// Besides the canonical names, the labels written by the legacy site
/// software are accepted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
pub enum ShiftVariant {
    #[strum(to_string = "FullDay", serialize = "full_day", serialize = "Cả ngày")]
    FullDay,
    #[strum(to_string = "MorningOnly", serialize = "morning_only", serialize = "Ca sáng")]
    MorningOnly,
    #[strum(to_string = "AfternoonOnly", serialize = "afternoon_only", serialize = "Ca chiều")]
    AfternoonOnly,
}

impl ShiftVariant {
    /// Parse a stored shift label. Blank and unset labels yield `None`.
    pub fn from_label(label: Option<&str>) -> Option<Self> {
        let label = label?.trim();
        if label.is_empty() {
            return None;
        }
        label.parse().ok()
    }
}

const fn hm(hours: u32, minutes: u32) -> u32 {
    hours * 60 + minutes
}

/// Time-of-day boundaries for one shift variant, in business-local minutes
/// since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShiftPolicy {
    pub variant: ShiftVariant,
    /// A first punch strictly after this is late.
    pub late_threshold: u32,
    /// A last punch strictly before this is an early leave.
    pub early_leave_threshold: u32,
    /// Shift end; minutes worked past it count as overtime.
    pub overtime_threshold: u32,
}

impl ShiftPolicy {
    pub const FULL_DAY: ShiftPolicy = ShiftPolicy {
        variant: ShiftVariant::FullDay,
        late_threshold: hm(8, 0),
        early_leave_threshold: hm(17, 0),
        overtime_threshold: hm(17, 0),
    };

    pub const MORNING_ONLY: ShiftPolicy = ShiftPolicy {
        variant: ShiftVariant::MorningOnly,
        late_threshold: hm(8, 0),
        early_leave_threshold: hm(12, 0),
        overtime_threshold: hm(12, 0),
    };

    pub const AFTERNOON_ONLY: ShiftPolicy = ShiftPolicy {
        variant: ShiftVariant::AfternoonOnly,
        late_threshold: hm(13, 0),
        early_leave_threshold: hm(17, 0),
        overtime_threshold: hm(17, 0),
    };

    pub fn resolve(variant: ShiftVariant) -> ShiftPolicy {
        match variant {
            ShiftVariant::FullDay => Self::FULL_DAY,
            ShiftVariant::MorningOnly => Self::MORNING_ONLY,
            ShiftVariant::AfternoonOnly => Self::AFTERNOON_ONLY,
        }
    }

    /// Resolve the policy for an employee's stored shift label.
    ///
    /// Employees without a recognised shift are never given a default policy;
    /// callers must report them instead of classifying them.
    pub fn for_employee(employee: &EmployeeProfile) -> Result<ShiftPolicy> {
        ShiftVariant::from_label(employee.shift.as_deref())
            .map(Self::resolve)
            .ok_or_else(|| AttendanceError::UnknownShiftVariant {
                employee_id: employee.employee_id.clone(),
                label: employee.shift.clone(),
            })
    }

    pub fn late_threshold_secs(&self) -> u32 {
        self.late_threshold * 60
    }

    pub fn early_leave_threshold_secs(&self) -> u32 {
        self.early_leave_threshold * 60
    }

    pub fn overtime_threshold_secs(&self) -> u32 {
        self.overtime_threshold * 60
    }

    pub fn late_time(&self) -> NaiveTime {
        minutes_to_time(self.late_threshold)
    }

    pub fn shift_end(&self) -> NaiveTime {
        minutes_to_time(self.overtime_threshold)
    }
}

fn minutes_to_time(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn employee(shift: Option<&str>) -> EmployeeProfile {
        EmployeeProfile {
            employee_id: "NV001".to_string(),
            full_name: "Test".to_string(),
            shift: shift.map(str::to_string),
            department_id: None,
            position_id: None,
            device_id: None,
        }
    }

    #[test]
    fn thresholds_never_exceed_shift_end() {
        for variant in ShiftVariant::iter() {
            let policy = ShiftPolicy::resolve(variant);
            assert_eq!(policy.variant, variant);
            assert!(policy.late_threshold <= policy.overtime_threshold, "{variant}");
            assert!(policy.early_leave_threshold <= policy.overtime_threshold, "{variant}");
        }
    }

    #[test]
    fn canonical_and_legacy_labels_resolve() {
        assert_eq!(ShiftVariant::from_label(Some("FullDay")), Some(ShiftVariant::FullDay));
        assert_eq!(ShiftVariant::from_label(Some("morning_only")), Some(ShiftVariant::MorningOnly));
        assert_eq!(ShiftVariant::from_label(Some("Ca chiều")), Some(ShiftVariant::AfternoonOnly));
        assert_eq!(ShiftVariant::from_label(Some("  Cả ngày ")), Some(ShiftVariant::FullDay));
    }

    #[test]
    fn display_uses_canonical_name() {
        assert_eq!(ShiftVariant::MorningOnly.to_string(), "MorningOnly");
    }

    #[test]
    fn unset_shift_is_an_error_not_a_default() {
        let err = ShiftPolicy::for_employee(&employee(None)).unwrap_err();
        assert!(matches!(
            err,
            AttendanceError::UnknownShiftVariant { ref employee_id, label: None } if employee_id == "NV001"
        ));
        assert!(ShiftPolicy::for_employee(&employee(Some("   "))).is_err());
    }

    #[test]
    fn unknown_label_is_an_error() {
        let err = ShiftPolicy::for_employee(&employee(Some("Night"))).unwrap_err();
        assert!(matches!(err, AttendanceError::UnknownShiftVariant { label: Some(ref l), .. } if l == "Night"));
    }

    #[test]
    fn boundary_times() {
        let morning = ShiftPolicy::resolve(ShiftVariant::MorningOnly);
        assert_eq!(morning.late_time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(morning.shift_end(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(ShiftPolicy::AFTERNOON_ONLY.late_threshold_secs(), 13 * 3600);
    }
}

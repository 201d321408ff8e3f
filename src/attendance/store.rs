//! Interface to the employee and punch stores the engine reads from.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::model::checkin::Checkin;
use crate::model::employee::EmployeeProfile;

/// Which employees a cross-employee query covers. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ScopeFilter {
    #[schema(example = 10)]
    pub department_id: Option<u64>,
    #[schema(example = 3)]
    pub position_id: Option<u64>,
    #[schema(example = "GATE-01")]
    pub device_id: Option<String>,
    #[schema(example = "NV001")]
    pub employee_id: Option<String>,
}

impl ScopeFilter {
    pub fn matches(&self, employee: &EmployeeProfile) -> bool {
        self.department_id.is_none_or(|id| employee.department_id == Some(id))
            && self.position_id.is_none_or(|id| employee.position_id == Some(id))
            && self
                .device_id
                .as_deref()
                .is_none_or(|id| employee.device_id.as_deref() == Some(id))
            && self
                .employee_id
                .as_deref()
                .is_none_or(|id| employee.employee_id == id)
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Employees matching the scope.
    async fn fetch_employees(&self, scope: &ScopeFilter) -> anyhow::Result<Vec<EmployeeProfile>>;

    async fn find_employee(&self, employee_id: &str) -> anyhow::Result<Option<EmployeeProfile>>;

    /// Punches of the given employees with `start <= timestamp < end`,
    /// optionally restricted to one device.
    async fn fetch_events(
        &self,
        employee_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        device_id: Option<&str>,
    ) -> anyhow::Result<Vec<Checkin>>;

    async fn department_name(&self, department_id: u64) -> anyhow::Result<Option<String>>;

    async fn position_name(&self, position_id: u64) -> anyhow::Result<Option<String>>;

    async fn device_exists(&self, device_id: &str) -> anyhow::Result<bool>;
}


#[cfg(test)]
mod tests {
    use super::*;

    fn profile(department_id: Option<u64>, device_id: Option<&str>) -> EmployeeProfile {
        EmployeeProfile {
            employee_id: "NV001".to_string(),
            full_name: "A".to_string(),
            shift: Some("FullDay".to_string()),
            department_id,
            position_id: Some(3),
            device_id: device_id.map(str::to_string),
        }
    }

    #[test]
    fn empty_scope_matches_everyone() {
        assert!(ScopeFilter::default().matches(&profile(None, None)));
    }

    #[test]
    fn scope_fields_filter_conjunctively() {
        let scope = ScopeFilter {
            department_id: Some(10),
            device_id: Some("GATE-01".to_string()),
            ..Default::default()
        };
        assert!(scope.matches(&profile(Some(10), Some("GATE-01"))));
        assert!(!scope.matches(&profile(Some(10), Some("GATE-02"))));
        assert!(!scope.matches(&profile(None, Some("GATE-01"))));
    }
}

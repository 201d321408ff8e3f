use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use strum_macros::IntoStaticStr;
use tracing::{debug, error};

use crate::attendance::store::{AttendanceStore, ScopeFilter};
use crate::model::checkin::{Checkin, CheckinStatus};
use crate::model::department::NamedRecord;
use crate::model::employee::EmployeeProfile;
use crate::utils::db_utils::{WhereClause, bind_values};

/// Employee ids per `IN (...)` list when loading check-ins.
const EVENT_BATCH: usize = 500;

const EMPLOYEE_COLUMNS: &str =
    "employee_id, full_name, shift, department_id, position_id, device_id";

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await.inspect_err(|e| {
        error!(error = %e, "Failed to connect to database");
    })
}

/// Lookup tables whose names decorate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
enum NameTable {
    #[strum(serialize = "departments")]
    Department,
    #[strum(serialize = "positions")]
    Position,
}

#[derive(sqlx::FromRow)]
struct CheckinRow {
    employee_id: String,
    device_id: String,
    timestamp: DateTime<Utc>,
    checkin_status: Option<String>,
}

impl From<CheckinRow> for Checkin {
    fn from(row: CheckinRow) -> Self {
        Checkin {
            employee_id: row.employee_id,
            device_id: row.device_id,
            timestamp: row.timestamp,
            status: CheckinStatus::from(row.checkin_status.unwrap_or_default()),
        }
    }
}

/// [`AttendanceStore`] over the MySQL attendance schema.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
    names: Cache<(NameTable, u64), String>,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        let names = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300))
            .build();
        Self { pool, names }
    }

    async fn lookup_name(&self, table: NameTable, id: u64) -> anyhow::Result<Option<String>> {
        if let Some(name) = self.names.get(&(table, id)).await {
            return Ok(Some(name));
        }

        let table_name: &'static str = table.into();
        let sql = format!("SELECT id, name FROM {table_name} WHERE id = ?");
        let record = sqlx::query_as::<_, NamedRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading {table_name} #{id}"))?;

        if let Some(record) = &record {
            self.names.insert((table, id), record.name.clone()).await;
        }
        Ok(record.map(|r| r.name))
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn fetch_employees(&self, scope: &ScopeFilter) -> anyhow::Result<Vec<EmployeeProfile>> {
        // ---------- build WHERE clause dynamically ----------
        let mut clause = WhereClause::new();
        if let Some(department_id) = scope.department_id {
            clause.push("department_id = ?", department_id);
        }
        if let Some(position_id) = scope.position_id {
            clause.push("position_id = ?", position_id);
        }
        if let Some(device_id) = &scope.device_id {
            clause.push("device_id = ?", device_id);
        }
        if let Some(employee_id) = &scope.employee_id {
            clause.push("employee_id = ?", employee_id);
        }

        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees {} ORDER BY employee_id",
            clause.to_sql()
        );
        debug!(sql = %sql, bindings = ?clause.values(), "Fetching employees");

        bind_values(sqlx::query_as::<_, EmployeeProfile>(&sql), clause.values())
            .fetch_all(&self.pool)
            .await
            .context("loading employees")
    }

    async fn find_employee(&self, employee_id: &str) -> anyhow::Result<Option<EmployeeProfile>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?");
        sqlx::query_as::<_, EmployeeProfile>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading employee {employee_id}"))
    }

    async fn fetch_events(
        &self,
        employee_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        device_id: Option<&str>,
    ) -> anyhow::Result<Vec<Checkin>> {
        let mut events = Vec::new();

        for batch in employee_ids.chunks(EVENT_BATCH) {
            let mut clause = WhereClause::new();
            clause
                .push_in("employee_id", batch)
                .push("`timestamp` >= ?", start)
                .push("`timestamp` < ?", end);
            if let Some(device_id) = device_id {
                clause.push("device_id = ?", device_id);
            }

            let sql = format!(
                "SELECT employee_id, device_id, `timestamp`, checkin_status FROM checkins {} \
                 ORDER BY `timestamp` ASC, id ASC",
                clause.to_sql()
            );
            debug!(sql = %sql, employees = batch.len(), %start, %end, "Streaming check-ins");

            let mut stream =
                bind_values(sqlx::query_as::<_, CheckinRow>(&sql), clause.values()).fetch(&self.pool);
            while let Some(row) = stream.next().await {
                events.push(Checkin::from(row.context("reading check-in row")?));
            }
        }

        Ok(events)
    }

    async fn department_name(&self, department_id: u64) -> anyhow::Result<Option<String>> {
        self.lookup_name(NameTable::Department, department_id).await
    }

    async fn position_name(&self, position_id: u64) -> anyhow::Result<Option<String>> {
        self.lookup_name(NameTable::Position, position_id).await
    }

    async fn device_exists(&self, device_id: &str) -> anyhow::Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM devices WHERE device_id = ?")
            .bind(device_id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("looking up device {device_id}"))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_tables_map_to_schema() {
        let departments: &'static str = NameTable::Department.into();
        let positions: &'static str = NameTable::Position.into();
        assert_eq!(departments, "departments");
        assert_eq!(positions, "positions");
    }

    #[test]
    fn missing_status_becomes_free_form() {
        let row = CheckinRow {
            employee_id: "NV001".to_string(),
            device_id: "GATE-01".to_string(),
            timestamp: Utc::now(),
            checkin_status: None,
        };
        assert_eq!(Checkin::from(row).status, CheckinStatus::Other(String::new()));

        let row = CheckinRow {
            employee_id: "NV001".to_string(),
            device_id: "GATE-01".to_string(),
            timestamp: Utc::now(),
            checkin_status: Some("checkout".to_string()),
        };
        assert_eq!(Checkin::from(row).status, CheckinStatus::Checkout);
    }
}

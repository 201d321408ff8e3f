//! Attendance query façade: resolve scope, load punches, bucket, classify, fold.

use std::collections::BTreeSet;
use std::panic;
use std::thread;

use actix_web::web;
use chrono::{FixedOffset, NaiveDate};
use futures::future::join_all;
use tracing::{debug, error, warn};

use crate::attendance::aggregate::OverviewStatistics;
use crate::attendance::bucket::DayBuckets;
use crate::attendance::classify::{DayAttendanceRecord, classify};
use crate::attendance::error::{AttendanceError, Result, ScopeKind};
use crate::attendance::report::{
    ALL_DEPARTMENTS, ALL_POSITIONS, AttendanceOverview, AttendanceRoster,
    EmployeeAttendanceSummary, EmployeeInfo, EmployeeMonthlyReport, ExceptionEntry, ExceptionKind,
    ExceptionReport, MonthlySummary, NameBook, SkippedEmployee,
};
use crate::attendance::shift::ShiftPolicy;
use crate::attendance::store::{AttendanceStore, ScopeFilter};
use crate::attendance::window::{Window, business_today};
use crate::model::employee::EmployeeProfile;

#[derive(Debug, Clone, Copy)]
pub struct AttendanceSettings {
    /// Fixed UTC offset in which days and shift boundaries are defined.
    pub business_offset: FixedOffset,
    /// Scopes with at least this many employees are classified on worker threads.
    pub parallel_threshold: usize,
}

/// One employee's classified days in a window.
#[derive(Debug, Clone)]
pub struct ClassifiedEmployee {
    pub policy: ShiftPolicy,
    pub days: Vec<DayAttendanceRecord>,
}

/// Names resolved for a scope filter.
struct ResolvedScope {
    department_name: String,
    position_name: String,
    employees: Vec<EmployeeProfile>,
}

pub struct AttendanceService<S> {
    store: S,
    settings: AttendanceSettings,
}

impl<S: AttendanceStore> AttendanceService<S> {
    pub fn new(store: S, settings: AttendanceSettings) -> Self {
        Self { store, settings }
    }

    pub fn business_offset(&self) -> &FixedOffset {
        &self.settings.business_offset
    }

    pub fn today(&self) -> NaiveDate {
        business_today(&self.settings.business_offset)
    }

    /// Classification of one employee's day.
    pub async fn day_attendance(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<DayAttendanceRecord> {
        let employee = self.require_employee(employee_id).await?;
        let policy = ShiftPolicy::for_employee(&employee)?;
        let window = Window::day(date);
        let buckets = self
            .load_buckets(std::slice::from_ref(&employee), &window, None)
            .await?;

        classify(
            &employee.employee_id,
            date,
            buckets.events(&employee.employee_id, date),
            &policy,
            self.business_offset(),
        )
    }

    /// Monthly statistics of one employee.
    pub async fn monthly_statistics(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
    ) -> Result<EmployeeMonthlyReport> {
        let window = Window::month(year, month)?;
        let employee = self.require_employee(employee_id).await?;
        let policy = ShiftPolicy::for_employee(&employee)?;
        let employees = std::slice::from_ref(&employee);
        let buckets = self.load_buckets(employees, &window, None).await?;
        let days = classify_days(&employee, &policy, &buckets, &window, self.business_offset())?;
        let names = self.name_book(employees).await?;

        Ok(EmployeeMonthlyReport::new(
            EmployeeInfo::new(&employee, &names),
            &window,
            &days,
        ))
    }

    /// Cross-employee counts for one business day.
    pub async fn overview(&self, scope: &ScopeFilter, date: NaiveDate) -> Result<AttendanceOverview> {
        self.overview_for(scope, Window::day(date)).await
    }

    /// Cross-employee counts for a whole month.
    pub async fn monthly_overview(
        &self,
        scope: &ScopeFilter,
        year: i32,
        month: u32,
    ) -> Result<AttendanceOverview> {
        self.overview_for(scope, Window::month(year, month)?).await
    }

    async fn overview_for(&self, scope: &ScopeFilter, window: Window) -> Result<AttendanceOverview> {
        let resolved = self.resolve_scope(scope).await?;
        let buckets = self
            .load_buckets(&resolved.employees, &window, scope.device_id.as_deref())
            .await?;

        let ScopeClassification { classified, skipped } =
            self.classify_scope(resolved.employees, buckets, window).await?;
        let statistics: OverviewStatistics = classified
            .iter()
            .map(|(_, c)| OverviewStatistics::from_employee_days(&c.days))
            .sum();

        Ok(AttendanceOverview {
            first_day: window.first_day,
            last_day: window.last_day,
            department_name: resolved.department_name,
            position_name: resolved.position_name,
            total_overtime_hours: AttendanceOverview::total_overtime(&statistics),
            statistics,
            skipped,
        })
    }

    /// Monthly statistics of every employee in scope.
    pub async fn monthly_summary(
        &self,
        scope: &ScopeFilter,
        year: i32,
        month: u32,
    ) -> Result<MonthlySummary> {
        let window = Window::month(year, month)?;
        let resolved = self.resolve_scope(scope).await?;
        let buckets = self
            .load_buckets(&resolved.employees, &window, scope.device_id.as_deref())
            .await?;
        let names = self.name_book(&resolved.employees).await?;

        let ScopeClassification { classified, skipped } =
            self.classify_scope(resolved.employees, buckets, window).await?;
        let employees = classified
            .iter()
            .map(|(employee, c)| {
                EmployeeMonthlyReport::new(EmployeeInfo::new(employee, &names), &window, &c.days)
            })
            .collect();

        Ok(MonthlySummary {
            year,
            month,
            department_name: resolved.department_name,
            position_name: resolved.position_name,
            employees,
            skipped,
        })
    }

    /// Employees in scope who were late, left early or worked overtime on `date`,
    /// with month-to-date counts.
    pub async fn exception_report(
        &self,
        kind: ExceptionKind,
        scope: &ScopeFilter,
        date: NaiveDate,
    ) -> Result<ExceptionReport> {
        let window = Window::month_to_date(date);
        let resolved = self.resolve_scope(scope).await?;
        let buckets = self
            .load_buckets(&resolved.employees, &window, scope.device_id.as_deref())
            .await?;
        let names = self.name_book(&resolved.employees).await?;

        let total_employees = resolved.employees.len() as u32;
        let ScopeClassification { classified, skipped } =
            self.classify_scope(resolved.employees, buckets, window).await?;
        let employees: Vec<_> = classified
            .iter()
            .filter_map(|(employee, c)| {
                ExceptionEntry::build(kind, employee, &c.policy, &names, &c.days, date)
            })
            .collect();

        Ok(ExceptionReport {
            date,
            kind,
            department_name: resolved.department_name,
            total_employees,
            matched_employees: employees.len() as u32,
            employees,
            skipped,
        })
    }

    /// Every employee in scope with their status on `date` and totals from
    /// the first of the month through `date`.
    pub async fn roster(&self, scope: &ScopeFilter, date: NaiveDate) -> Result<AttendanceRoster> {
        let window = Window::month_to_date(date);
        let resolved = self.resolve_scope(scope).await?;
        let buckets = self
            .load_buckets(&resolved.employees, &window, scope.device_id.as_deref())
            .await?;
        let names = self.name_book(&resolved.employees).await?;

        let ScopeClassification { classified, skipped } =
            self.classify_scope(resolved.employees, buckets, window).await?;
        let tz = self.business_offset();
        let employees = classified
            .iter()
            .map(|(employee, c)| EmployeeAttendanceSummary::build(employee, &names, &c.days, date, tz))
            .collect();

        Ok(AttendanceRoster {
            date,
            department_name: resolved.department_name,
            position_name: resolved.position_name,
            employees,
            skipped,
        })
    }

    async fn require_employee(&self, employee_id: &str) -> Result<EmployeeProfile> {
        self.store
            .find_employee(employee_id)
            .await
            .map_err(|e| store_failure(e, "Failed to fetch employee"))?
            .ok_or_else(|| AttendanceError::scope_not_found(ScopeKind::Employee, employee_id))
    }

    /// Check every referenced scope entity exists, then fetch the employees.
    async fn resolve_scope(&self, scope: &ScopeFilter) -> Result<ResolvedScope> {
        let department_name = match scope.department_id {
            Some(id) => self
                .store
                .department_name(id)
                .await
                .map_err(|e| store_failure(e, "Failed to resolve department"))?
                .ok_or_else(|| AttendanceError::scope_not_found(ScopeKind::Department, id))?,
            None => ALL_DEPARTMENTS.to_string(),
        };

        let position_name = match scope.position_id {
            Some(id) => self
                .store
                .position_name(id)
                .await
                .map_err(|e| store_failure(e, "Failed to resolve position"))?
                .ok_or_else(|| AttendanceError::scope_not_found(ScopeKind::Position, id))?,
            None => ALL_POSITIONS.to_string(),
        };

        if let Some(device_id) = scope.device_id.as_deref() {
            let exists = self
                .store
                .device_exists(device_id)
                .await
                .map_err(|e| store_failure(e, "Failed to resolve device"))?;
            if !exists {
                return Err(AttendanceError::scope_not_found(ScopeKind::Device, device_id));
            }
        }

        if let Some(employee_id) = scope.employee_id.as_deref() {
            self.require_employee(employee_id).await?;
        }

        let employees = self
            .store
            .fetch_employees(scope)
            .await
            .map_err(|e| store_failure(e, "Failed to fetch employees"))?;

        Ok(ResolvedScope {
            department_name,
            position_name,
            employees,
        })
    }

    async fn load_buckets(
        &self,
        employees: &[EmployeeProfile],
        window: &Window,
        device_id: Option<&str>,
    ) -> Result<DayBuckets> {
        if employees.is_empty() {
            return Ok(DayBuckets::default());
        }
        let (start, end) = window.instants(self.business_offset())?;
        let employee_ids: Vec<String> = employees.iter().map(|e| e.employee_id.clone()).collect();
        let events = self
            .store
            .fetch_events(&employee_ids, start, end, device_id)
            .await
            .map_err(|e| store_failure(e, "Failed to fetch check-ins"))?;

        let buckets = DayBuckets::build(events, self.business_offset());
        if buckets.is_empty() {
            debug!(employees = employees.len(), "No check-ins in window");
            return Ok(buckets);
        }
        debug!(
            employees = employees.len(),
            events = buckets.event_count(),
            buckets = buckets.len(),
            first_day = %window.first_day,
            last_day = %window.last_day,
            "Bucketed check-ins"
        );
        Ok(buckets)
    }

    async fn name_book(&self, employees: &[EmployeeProfile]) -> Result<NameBook> {
        let department_ids: BTreeSet<u64> = employees.iter().filter_map(|e| e.department_id).collect();
        let position_ids: BTreeSet<u64> = employees.iter().filter_map(|e| e.position_id).collect();

        let departments = join_all(
            department_ids
                .into_iter()
                .map(|id| async move { (id, self.store.department_name(id).await) }),
        )
        .await;
        let positions = join_all(
            position_ids
                .into_iter()
                .map(|id| async move { (id, self.store.position_name(id).await) }),
        )
        .await;

        let mut book = NameBook::default();
        for (id, name) in departments {
            if let Some(name) = name.map_err(|e| store_failure(e, "Failed to resolve department"))? {
                book.departments.insert(id, name);
            }
        }
        for (id, name) in positions {
            if let Some(name) = name.map_err(|e| store_failure(e, "Failed to resolve position"))? {
                book.positions.insert(id, name);
            }
        }
        Ok(book)
    }

    /// Classify every employee in the window, splitting failures into a skip report.
    ///
    /// Runs on the blocking pool. Large scopes fan out further over scoped
    /// threads; chunks are rejoined in input order so the output does not
    /// depend on scheduling.
    async fn classify_scope(
        &self,
        employees: Vec<EmployeeProfile>,
        buckets: DayBuckets,
        window: Window,
    ) -> Result<ScopeClassification> {
        let tz = *self.business_offset();
        let threshold = self.settings.parallel_threshold.max(1);

        web::block(move || {
            let outcomes = classify_all(&employees, &buckets, &window, &tz, threshold);
            ScopeClassification::split(employees, outcomes)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Classification worker failed");
            AttendanceError::internal(format!("classification worker failed: {e}"))
        })
    }
}

/// Employees that classified cleanly, and the ones that did not.
struct ScopeClassification {
    classified: Vec<(EmployeeProfile, ClassifiedEmployee)>,
    skipped: Vec<SkippedEmployee>,
}

impl ScopeClassification {
    fn split(employees: Vec<EmployeeProfile>, outcomes: Vec<Result<ClassifiedEmployee>>) -> Self {
        let mut classified = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (employee, outcome) in employees.into_iter().zip(outcomes) {
            match outcome {
                Ok(c) => classified.push((employee, c)),
                Err(e) => {
                    warn!(employee_id = %employee.employee_id, reason = %e, "Skipping employee");
                    skipped.push(SkippedEmployee {
                        employee_id: employee.employee_id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Self { classified, skipped }
    }
}

/// One outcome per employee, in input order.
fn classify_all(
    employees: &[EmployeeProfile],
    buckets: &DayBuckets,
    window: &Window,
    tz: &FixedOffset,
    parallel_threshold: usize,
) -> Vec<Result<ClassifiedEmployee>> {
    if employees.len() < parallel_threshold {
        return classify_chunk(employees, buckets, window, tz);
    }

    let workers = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let chunk_size = employees.len().div_ceil(workers).max(1);
    debug!(employees = employees.len(), workers, chunk_size, "Fanning out classification");
    thread::scope(|scope| {
        let handles: Vec<_> = employees
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || classify_chunk(chunk, buckets, window, tz)))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}

fn classify_chunk(
    employees: &[EmployeeProfile],
    buckets: &DayBuckets,
    window: &Window,
    tz: &FixedOffset,
) -> Vec<Result<ClassifiedEmployee>> {
    employees
        .iter()
        .map(|employee| {
            ShiftPolicy::for_employee(employee).and_then(|policy| {
                classify_days(employee, &policy, buckets, window, tz)
                    .map(|days| ClassifiedEmployee { policy, days })
            })
        })
        .collect()
}

/// Classify each day of the window, including days without punches.
fn classify_days(
    employee: &EmployeeProfile,
    policy: &ShiftPolicy,
    buckets: &DayBuckets,
    window: &Window,
    tz: &FixedOffset,
) -> Result<Vec<DayAttendanceRecord>> {
    if let Some((date, _)) = buckets
        .days_of(&employee.employee_id)
        .find(|(date, _)| !window.contains(*date))
    {
        return Err(AttendanceError::internal(format!(
            "check-ins of {} on {date} fall outside {}..={}",
            employee.employee_id, window.first_day, window.last_day
        )));
    }

    window
        .days()
        .map(|date| {
            classify(
                &employee.employee_id,
                date,
                buckets.events(&employee.employee_id, date),
                policy,
                tz,
            )
        })
        .collect()
}

fn store_failure(e: anyhow::Error, context: &'static str) -> AttendanceError {
    error!(error = %e, "{}", context);
    AttendanceError::Store(e)
}

//! Grouping of raw punches into per-employee business days.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use crate::attendance::window::business_date;
use crate::model::checkin::Checkin;

/// Composite key of a day bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub employee_id: String,
    pub date: NaiveDate,
}

impl DayKey {
    pub fn new(employee_id: &str, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            date,
        }
    }
}

/// Punches grouped by (employee, business day), each bucket in ascending
/// instant order.
#[derive(Debug, Default, Clone)]
pub struct DayBuckets {
    buckets: BTreeMap<DayKey, Vec<Checkin>>,
}

impl DayBuckets {
    /// Bucket events by business-local calendar day.
    ///
    /// Nothing is dropped or deduplicated. Events sharing an instant keep
    /// their ingestion order.
    pub fn build(events: impl IntoIterator<Item = Checkin>, tz: &FixedOffset) -> Self {
        let mut buckets: BTreeMap<DayKey, Vec<Checkin>> = BTreeMap::new();
        for event in events {
            let key = DayKey {
                employee_id: event.employee_id.clone(),
                date: business_date(event.timestamp, tz),
            };
            buckets.entry(key).or_default().push(event);
        }
        for events in buckets.values_mut() {
            // stable
            events.sort_by_key(|event| event.timestamp);
        }
        Self { buckets }
    }

    /// Events for one employee on one day, empty when there are none.
    pub fn events(&self, employee_id: &str, date: NaiveDate) -> &[Checkin] {
        self.buckets
            .get(&DayKey::new(employee_id, date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All non-empty days of one employee, ascending by date.
    pub fn days_of<'a>(
        &'a self,
        employee_id: &str,
    ) -> impl Iterator<Item = (NaiveDate, &'a [Checkin])> + use<'a> {
        let from = DayKey::new(employee_id, NaiveDate::MIN);
        let to = DayKey::new(employee_id, NaiveDate::MAX);
        self.buckets
            .range(from..=to)
            .map(|(key, events)| (key.date, events.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

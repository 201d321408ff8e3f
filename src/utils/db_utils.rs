use chrono::{DateTime, Utc};
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::QueryAs;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    DateTime(DateTime<Utc>),
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::String(v.clone())
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::DateTime(v)
    }
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
///
/// Conditions are joined with `AND`; every value goes through a `?`
/// placeholder, never into the SQL text.
#[derive(Debug, Default, Clone)]
pub struct WhereClause {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition with a single `?` placeholder.
    pub fn push(&mut self, condition: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.conditions.push(condition.to_string());
        self.values.push(value.into());
        self
    }

    /// `column IN (?, ?, ...)`. An empty list matches nothing.
    pub fn push_in<V: Into<SqlValue>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        let before = self.values.len();
        self.values.extend(values.into_iter().map(Into::into));
        let count = self.values.len() - before;

        if count == 0 {
            self.conditions.push("1 = 0".to_string());
        } else {
            let placeholders = vec!["?"; count].join(", ");
            self.conditions.push(format!("{column} IN ({placeholders})"));
        }
        self
    }

    /// `WHERE a AND b`, or an empty string when there are no conditions.
    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// ===============================
/// Bind values in placeholder order
/// ===============================
pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::String(v) => query.bind(v.clone()),
            SqlValue::U64(v) => query.bind(*v),
            SqlValue::DateTime(v) => query.bind(*v),
        };
    }
    query
}

use serde::{Deserialize, Serialize};

/// Name row shared by the `departments` and `positions` tables.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct NamedRecord {
    pub id: u64,
    pub name: String,
}

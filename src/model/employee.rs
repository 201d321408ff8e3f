use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The attendance-relevant view of an employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "NV001",
        "full_name": "Nguyen Van A",
        "shift": "FullDay",
        "department_id": 10,
        "position_id": 3,
        "device_id": "GATE-01"
    })
)]
pub struct EmployeeProfile {
    #[schema(example = "NV001")]
    pub employee_id: String,

    #[schema(example = "Nguyen Van A")]
    pub full_name: String,

    /// Raw shift label as stored upstream; resolved by the shift policy resolver.
    #[schema(example = "FullDay", nullable = true)]
    pub shift: Option<String>,

    #[schema(example = 10, nullable = true)]
    pub department_id: Option<u64>,

    #[schema(example = 3, nullable = true)]
    pub position_id: Option<u64>,

    #[schema(example = "GATE-01", nullable = true)]
    pub device_id: Option<String>,
}

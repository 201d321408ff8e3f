use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;
use utoipa::ToSchema;

/// Status label reported by the device alongside a punch.
///
/// Devices send `checkin`/`checkout` for most punches but some firmware sends
/// free-form labels, which are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckinStatus {
    #[strum(serialize = "checkin")]
    Checkin,
    #[strum(serialize = "checkout")]
    Checkout,
    #[strum(default)]
    Other(String),
}

impl CheckinStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CheckinStatus::Checkin => "checkin",
            CheckinStatus::Checkout => "checkout",
            CheckinStatus::Other(label) => label,
        }
    }
}

impl From<String> for CheckinStatus {
    fn from(label: String) -> Self {
        label
            .parse()
            .unwrap_or_else(|_| CheckinStatus::Other(label))
    }
}

impl From<CheckinStatus> for String {
    fn from(status: CheckinStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A single punch recorded by an attendance device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "NV001",
        "device_id": "GATE-01",
        "timestamp": "2026-03-02T00:55:00Z",
        "status": "checkin"
    })
)]
pub struct Checkin {
    #[schema(example = "NV001")]
    pub employee_id: String,

    #[schema(example = "GATE-01")]
    pub device_id: String,

    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,

    #[schema(value_type = String, example = "checkin")]
    pub status: CheckinStatus,
}

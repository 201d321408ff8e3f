//! Error taxonomy for the attendance engine.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use strum_macros::Display;
use thiserror::Error;

/// Which part of a scope filter failed to resolve upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScopeKind {
    Department,
    Position,
    Device,
    Employee,
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    /// The employee's shift label is unset or not one of the known variants.
    #[error(
        "employee {employee_id} has unknown shift variant '{}'",
        .label.as_deref().unwrap_or("<unset>")
    )]
    UnknownShiftVariant {
        employee_id: String,
        label: Option<String>,
    },

    /// A department, position, device or employee referenced by the caller does not exist.
    #[error("{kind} '{id}' not found")]
    ScopeNotFound { kind: ScopeKind, id: String },

    /// Month/year out of range or a window whose end precedes its start.
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// The employee or event store failed.
    #[error("attendance store failure: {0}")]
    Store(#[from] anyhow::Error),

    /// Malformed input reached the classifier (a bug upstream of it).
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

impl AttendanceError {
    pub fn scope_not_found(kind: ScopeKind, id: impl ToString) -> Self {
        Self::ScopeNotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_window(message: impl Into<String>) -> Self {
        Self::InvalidWindow(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::ScopeNotFound { .. } => StatusCode::NOT_FOUND,
            AttendanceError::UnknownShiftVariant { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AttendanceError::InvalidWindow(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Store(_) | AttendanceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::Store(_) | AttendanceError::Internal(_) => {
                tracing::error!(error = %self, "Attendance request failed");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_shift_display_names_the_label() {
        let err = AttendanceError::UnknownShiftVariant {
            employee_id: "NV001".to_string(),
            label: Some("Night".to_string()),
        };
        assert_eq!(err.to_string(), "employee NV001 has unknown shift variant 'Night'");
    }

    #[test]
    fn unset_shift_display() {
        let err = AttendanceError::UnknownShiftVariant {
            employee_id: "NV002".to_string(),
            label: None,
        };
        assert!(err.to_string().contains("<unset>"));
    }

    #[test]
    fn scope_not_found_maps_to_404() {
        let err = AttendanceError::scope_not_found(ScopeKind::Department, 42);
        assert_eq!(err.to_string(), "department '42' not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AttendanceError::invalid_window("month 13").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::internal("unsorted bucket").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let store: AttendanceError = anyhow::anyhow!("connection reset").into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

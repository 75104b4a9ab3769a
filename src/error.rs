//! Typed store errors
//!
//! Every store operation reports one of three failure kinds. The `Display`
//! output is the plain human-readable message that ends up in HTTP error
//! payloads and in the `message` column of failed ingest runs.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or the operation failed for a reason
    /// unrelated to the data itself
    #[error("{message}")]
    Connectivity { message: String },

    /// The data violated a constraint (unique key, foreign key, lifecycle rule)
    #[error("{message}")]
    Constraint {
        constraint: Option<String>,
        message: String,
    },

    /// A record addressed by identity does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

impl StoreError {
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            constraint: None,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Short machine-readable tag, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connectivity { .. } => "connectivity",
            Self::Constraint { .. } => "constraint",
            Self::NotFound { .. } => "not_found",
        }
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation => Self::Constraint {
                    constraint: info.constraint_name().map(str::to_string),
                    message: info.message().to_string(),
                },
                _ => Self::connectivity(info.message()),
            },
            DieselError::NotFound => Self::not_found("record", "(query)"),
            other => Self::connectivity(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        Self::connectivity(format!("database connection unavailable: {err}"))
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::connectivity(format!("database task aborted: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_plain_message() {
        let err = StoreError::connectivity("connection refused");
        assert_eq!(err.to_string(), "connection refused");

        let err = StoreError::constraint("duplicate key value violates unique constraint");
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("ingest run", "abc");
        assert_eq!(err.to_string(), "ingest run abc not found");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_diesel_not_found_maps_to_not_found() {
        let err = StoreError::from(DieselError::NotFound);
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_other_diesel_errors_map_to_connectivity() {
        let err = StoreError::from(DieselError::BrokenTransactionManager);
        assert_eq!(err.kind(), "connectivity");
    }
}

use ledger_primitives::ValidationError;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// A referenced row (parent block, masterchain block, transaction or
    /// message) is not committed yet. The write may succeed later.
    #[error("referenced row is missing (constraint `{constraint}`)")]
    MissingReference { constraint: String },
    #[error("constraint violation: {0}")]
    Constraint(String),
    /// Deadlock or serialization failure, the transaction was rolled back
    #[error("transaction aborted by a concurrent writer: {0}")]
    Conflict(String),
    #[error("timed out waiting for a database connection")]
    PoolTimedOut,
    #[error("invalid database configuration: {0}")]
    Config(String),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl DbError {
    pub fn missing_reference(constraint: impl Into<String>) -> Self {
        Self::MissingReference {
            constraint: constraint.into(),
        }
    }

    /// Errors worth another attempt: the referenced row may be committed by a
    /// concurrent writer, a rolled back transaction may go through on replay,
    /// or a pool connection may free up.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MissingReference { .. } | Self::Conflict(_) | Self::PoolTimedOut
        )
    }
}

/// SQLSTATE `invalid_text_representation`, raised for unknown enum labels
const INVALID_TEXT_REPRESENTATION: &str = "22P02";
/// SQLSTATE `serialization_failure`
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";

fn is_transaction_conflict(code: Option<&str>) -> bool {
    matches!(code, Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED))
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return Self::missing_reference(db_err.constraint().unwrap_or_default());
                }
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::CheckViolation
                | sqlx::error::ErrorKind::NotNullViolation => {
                    return Self::Constraint(db_err.message().to_string());
                }
                _ => {}
            }
            let code = db_err.code();
            if code.as_deref() == Some(INVALID_TEXT_REPRESENTATION) {
                return Self::Constraint(db_err.message().to_string());
            }
            if is_transaction_conflict(code.as_deref()) {
                return Self::Conflict(db_err.message().to_string());
            }
        }
        match err {
            sqlx::Error::PoolTimedOut => Self::PoolTimedOut,
            err => Self::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_references_conflicts_and_pool_timeouts_are_retried() {
        assert!(DbError::missing_reference("transactions_block_fkey").is_retryable());
        assert!(DbError::Conflict("deadlock detected".to_string()).is_retryable());
        assert!(DbError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!DbError::Constraint("duplicate".to_string()).is_retryable());
        assert!(!DbError::Validation(ValidationError::EmptyField { field: "hash" }).is_retryable());
        assert!(!DbError::from(sqlx::Error::RowNotFound).is_retryable());
    }

    #[test]
    fn missing_reference_names_the_constraint() {
        let err = DbError::missing_reference("blocks_masterchain_block_fkey");
        assert_eq!(
            err.to_string(),
            "referenced row is missing (constraint `blocks_masterchain_block_fkey`)"
        );
    }

    #[test]
    fn deadlocks_and_serialization_failures_are_conflicts() {
        assert!(is_transaction_conflict(Some("40P01")));
        assert!(is_transaction_conflict(Some("40001")));
        assert!(!is_transaction_conflict(Some("23505")));
        assert!(!is_transaction_conflict(Some(INVALID_TEXT_REPRESENTATION)));
        assert!(!is_transaction_conflict(None));
    }
}

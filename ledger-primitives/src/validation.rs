use bigdecimal::BigDecimal;

use crate::BlockId;

/// Length of a base64 encoded 32-byte hash
pub const HASH_MAX_LEN: usize = 44;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown {kind} `{value}`")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("`{field}` is not a valid hash: {reason}")]
    InvalidHash {
        field: &'static str,
        reason: &'static str,
    },
    #[error("block {block}: {reason}")]
    InvalidBlock {
        block: BlockId,
        reason: &'static str,
    },
    #[error("transaction {hash}: {reason}")]
    InvalidTransaction { hash: String, reason: &'static str },
    #[error("`{field}` must not be negative")]
    NegativeAmount { field: &'static str },
    #[error("`{field}` must not be empty")]
    EmptyField { field: &'static str },
}

/// Row-level checks that run before anything reaches the storage
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn validate_hash(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::InvalidHash {
            field,
            reason: "empty",
        });
    }
    if value.len() > HASH_MAX_LEN {
        return Err(ValidationError::InvalidHash {
            field,
            reason: "longer than 44 characters",
        });
    }
    // Both the standard and the url-safe base64 alphabets are accepted
    let is_base64 = value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_' | b'='));
    if !is_base64 {
        return Err(ValidationError::InvalidHash {
            field,
            reason: "not base64",
        });
    }
    Ok(())
}

pub fn validate_optional_hash(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => validate_hash(field, value),
        None => Ok(()),
    }
}

pub fn validate_not_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

pub fn validate_non_negative(
    field: &'static str,
    value: &BigDecimal,
) -> Result<(), ValidationError> {
    if *value < BigDecimal::from(0) {
        return Err(ValidationError::NegativeAmount { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_base64_hashes() {
        assert!(validate_hash("hash", "q5jQ8xz0yM9F2bq1oQwQ3m5P+Hk0lJ2Jc4fJb1m2n3o=").is_ok());
        assert!(validate_hash("hash", "q5jQ8xz0yM9F2bq1oQwQ3m5P-Hk0lJ2Jc4fJb1m2n3o=").is_ok());
    }

    #[test]
    fn rejects_malformed_hashes() {
        assert!(matches!(
            validate_hash("hash", ""),
            Err(ValidationError::InvalidHash { reason: "empty", .. })
        ));
        assert!(validate_hash("hash", &"A".repeat(45)).is_err());
        assert!(validate_hash("hash", "not a hash!").is_err());
        assert!(validate_optional_hash("hash", None).is_ok());
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(validate_non_negative("amount", &BigDecimal::from(0)).is_ok());
        assert_eq!(
            validate_non_negative("amount", &BigDecimal::from(-1)),
            Err(ValidationError::NegativeAmount { field: "amount" })
        );
    }
}

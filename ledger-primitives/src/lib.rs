use serde::{Deserialize, Serialize};

pub use crate::contracts::*;
pub use crate::entities::*;
pub use crate::enums::*;
pub use crate::validation::{Validate, ValidationError, HASH_MAX_LEN};

mod contracts;
mod entities;
mod enums;
pub mod validation;

/// Workchain id of the masterchain
pub const MASTERCHAIN_INDEX: i32 = -1;
/// The only shard of the masterchain (`0x8000000000000000` as a signed value)
pub const MASTERCHAIN_SHARD: i64 = i64::MIN;

/// Chain position of a block. Orders by workchain, then shard, then seqno,
/// so a range of one shard is contiguous.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockId {
    pub workchain: i32,
    pub shard: i64,
    pub seqno: i32,
}

impl BlockId {
    pub const fn new(workchain: i32, shard: i64, seqno: i32) -> Self {
        Self {
            workchain,
            shard,
            seqno,
        }
    }

    pub const fn masterchain(seqno: i32) -> Self {
        Self::new(MASTERCHAIN_INDEX, MASTERCHAIN_SHARD, seqno)
    }

    pub const fn is_masterchain(&self) -> bool {
        self.workchain == MASTERCHAIN_INDEX
    }

    /// A masterchain coordinate must use the fixed masterchain shard
    pub fn check_shard(&self) -> Result<(), ValidationError> {
        if self.is_masterchain() && self.shard != MASTERCHAIN_SHARD {
            return Err(ValidationError::InvalidBlock {
                block: *self,
                reason: "masterchain block must use the masterchain shard",
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{:016x},{})", self.workchain, self.shard, self.seqno)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masterchain_shard_is_displayed_as_unsigned_prefix() {
        assert_eq!(
            BlockId::masterchain(100).to_string(),
            "(-1,8000000000000000,100)"
        );
    }

    #[test]
    fn block_ids_of_one_shard_are_contiguous() {
        let mut ids = vec![
            BlockId::new(0, MASTERCHAIN_SHARD, 7),
            BlockId::masterchain(3),
            BlockId::new(0, MASTERCHAIN_SHARD, 2),
            BlockId::new(0, 0x6000000000000000, 1),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                BlockId::masterchain(3),
                BlockId::new(0, MASTERCHAIN_SHARD, 2),
                BlockId::new(0, MASTERCHAIN_SHARD, 7),
                BlockId::new(0, 0x6000000000000000, 1),
            ]
        );
    }

    #[test]
    fn masterchain_requires_masterchain_shard() {
        assert!(BlockId::masterchain(1).check_shard().is_ok());
        assert!(BlockId::new(0, 42, 1).check_shard().is_ok());
        assert!(BlockId::new(MASTERCHAIN_INDEX, 42, 1).check_shard().is_err());
    }
}

use std::collections::HashMap;

use ledger_primitives::{
    sort_masterchain_first, AccountState, Block, BlockBatch, BlockId, Message, MessageContent,
    Transaction, TransactionMessage, ValidationError,
};

use crate::DbResult;

/// Keeps one row per key, preferring a copy that carries the masterchain
/// reference. A multi-row `ON CONFLICT DO UPDATE` fails when one statement
/// touches the same row twice.
pub(crate) fn unique_blocks(blocks: &[Block]) -> Vec<Block> {
    let mut positions: HashMap<BlockId, usize> = HashMap::new();
    let mut unique: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match positions.get(&block.id) {
            Some(&position) => {
                if unique[position].masterchain_block.is_none()
                    && block.masterchain_block.is_some()
                {
                    unique[position] = block.clone();
                }
            }
            None => {
                positions.insert(block.id, unique.len());
                unique.push(block.clone());
            }
        }
    }
    sort_masterchain_first(&mut unique);
    unique
}

pub(crate) fn check_masterchain_link(block: BlockId, masterchain_block: BlockId) -> DbResult<()> {
    if block.is_masterchain() {
        return Err(ValidationError::InvalidBlock {
            block,
            reason: "masterchain blocks have no masterchain reference",
        }
        .into());
    }
    if !masterchain_block.is_masterchain() {
        return Err(ValidationError::InvalidBlock {
            block: masterchain_block,
            reason: "referenced block is not a masterchain block",
        }
        .into());
    }
    Ok(masterchain_block.check_shard()?)
}

/// Writes of the chain crawler and decoder.
///
/// Rows are immutable once stored: writing a row whose key already exists is
/// a no-op. Writes referencing a row that is not committed yet (the parent or
/// masterchain block, the transaction or message of a link) are retried with
/// backoff and fail with [`crate::DbError::MissingReference`] once the retry
/// budget is used up.
#[async_trait::async_trait]
pub trait ChainIndexerDbManager {
    /// Stores blocks masterchain-first in one commit. A stored block whose
    /// masterchain reference is still null gets it back-filled.
    async fn save_blocks(&self, blocks: &[Block]) -> DbResult<()>;

    /// Back-fills the masterchain reference of a stored shard block.
    /// Returns `false` when the block is unknown or already linked.
    async fn set_masterchain_block(
        &self,
        block: BlockId,
        masterchain_block: BlockId,
    ) -> DbResult<bool>;

    async fn save_account_states(&self, account_states: &[AccountState]) -> DbResult<()>;

    async fn save_transactions(&self, transactions: &[Transaction]) -> DbResult<()>;

    async fn save_messages(&self, messages: &[Message]) -> DbResult<()>;

    async fn save_message_contents(&self, message_contents: &[MessageContent]) -> DbResult<()>;

    async fn save_transaction_messages(
        &self,
        transaction_messages: &[TransactionMessage],
    ) -> DbResult<()>;

    /// Stores everything decoded from a set of blocks in a single commit
    async fn save_block_batch(&self, batch: BlockBatch) -> DbResult<()>;
}

#[cfg(test)]
mod tests {
    use ledger_primitives::MASTERCHAIN_SHARD;

    use super::*;

    #[test]
    fn masterchain_links_are_checked() {
        let shard_block = BlockId::new(0, MASTERCHAIN_SHARD, 50);
        assert!(check_masterchain_link(shard_block, BlockId::masterchain(100)).is_ok());
        assert!(check_masterchain_link(BlockId::masterchain(1), BlockId::masterchain(100)).is_err());
        assert!(check_masterchain_link(shard_block, BlockId::new(0, MASTERCHAIN_SHARD, 100)).is_err());
    }

    #[test]
    fn masterchain_target_must_use_the_masterchain_shard() {
        let shard_block = BlockId::new(0, MASTERCHAIN_SHARD, 50);
        let off_shard = BlockId::new(-1, 0x4000_0000_0000_0000, 100);
        assert!(matches!(
            check_masterchain_link(shard_block, off_shard),
            Err(crate::DbError::Validation(_))
        ));
    }
}

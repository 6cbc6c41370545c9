use ledger_primitives::{
    validate_all, AccountState, Block, BlockBatch, BlockId, Message, MessageContent, Transaction,
    TransactionMessage, Validate,
};

use crate::base::{check_masterchain_link, unique_blocks};
use crate::{DbResult, MockDBManager};

#[async_trait::async_trait]
impl crate::ChainIndexerDbManager for MockDBManager {
    async fn save_blocks(&self, blocks: &[Block]) -> DbResult<()> {
        validate_all(blocks)?;
        let batch = BlockBatch {
            blocks: unique_blocks(blocks),
            ..Default::default()
        };
        self.commit("save_blocks", batch).await
    }

    async fn set_masterchain_block(
        &self,
        block: BlockId,
        masterchain_block: BlockId,
    ) -> DbResult<bool> {
        check_masterchain_link(block, masterchain_block)?;
        self.retry
            .run("set_masterchain_block", move || async move {
                self.state
                    .write()
                    .await
                    .link_masterchain_block(block, masterchain_block)
            })
            .await
    }

    async fn save_account_states(&self, account_states: &[AccountState]) -> DbResult<()> {
        validate_all(account_states)?;
        let batch = BlockBatch {
            account_states: account_states.to_vec(),
            ..Default::default()
        };
        self.commit("save_account_states", batch).await
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> DbResult<()> {
        validate_all(transactions)?;
        let batch = BlockBatch {
            transactions: transactions.to_vec(),
            ..Default::default()
        };
        self.commit("save_transactions", batch).await
    }

    async fn save_messages(&self, messages: &[Message]) -> DbResult<()> {
        validate_all(messages)?;
        let batch = BlockBatch {
            messages: messages.to_vec(),
            ..Default::default()
        };
        self.commit("save_messages", batch).await
    }

    async fn save_message_contents(&self, message_contents: &[MessageContent]) -> DbResult<()> {
        validate_all(message_contents)?;
        let batch = BlockBatch {
            message_contents: message_contents.to_vec(),
            ..Default::default()
        };
        self.commit("save_message_contents", batch).await
    }

    async fn save_transaction_messages(
        &self,
        transaction_messages: &[TransactionMessage],
    ) -> DbResult<()> {
        validate_all(transaction_messages)?;
        let batch = BlockBatch {
            transaction_messages: transaction_messages.to_vec(),
            ..Default::default()
        };
        self.commit("save_transaction_messages", batch).await
    }

    async fn save_block_batch(&self, mut batch: BlockBatch) -> DbResult<()> {
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }
        batch.blocks = unique_blocks(&batch.blocks);
        self.commit("save_block_batch", batch).await
    }
}

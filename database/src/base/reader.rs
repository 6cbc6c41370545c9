use ledger_primitives::{
    AccountState, Block, BlockId, CodeHashInterfaces, JettonBurn, JettonMaster, JettonTransfer,
    JettonWallet, Message, MessageContent, NftCollection, NftItem, NftTransfer, Transaction,
};

use crate::{DbResult, Pagination};

/// Lookups of the query service. `method_name` labels the read metrics.
#[async_trait::async_trait]
pub trait ReaderDbManager {
    async fn get_block(&self, block_id: BlockId, method_name: &str) -> DbResult<Option<Block>>;

    /// Blocks of one shard with `from_seqno <= seqno <= to_seqno`, by seqno
    async fn get_blocks_by_seqno_range(
        &self,
        workchain: i32,
        shard: i64,
        from_seqno: i32,
        to_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Block>>;

    /// Shard blocks committed with the given masterchain block
    async fn get_shard_blocks(
        &self,
        masterchain_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Block>>;

    async fn get_blocks_by_unix_time(
        &self,
        start_utime: Option<i64>,
        end_utime: Option<i64>,
        workchain: Option<i32>,
        shard: Option<i64>,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<Block>>;

    async fn get_transaction_by_hash(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Transaction>>;

    async fn get_transactions_by_account(
        &self,
        account: &str,
        start_utime: Option<i32>,
        end_utime: Option<i32>,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>>;

    async fn get_transactions_in_block(
        &self,
        block_id: BlockId,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>>;

    /// Transactions of a masterchain block and of all its shard blocks, by lt
    async fn get_transactions_by_masterchain_seqno(
        &self,
        masterchain_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>>;

    async fn get_message_by_hash(
        &self,
        message_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Message>>;

    async fn get_in_message_by_transaction(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Message>>;

    async fn get_out_messages_by_transaction(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Vec<Message>>;

    /// Messages sent or received by `address`, by `created_lt`
    async fn get_messages_by_account(
        &self,
        address: &str,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<Message>>;

    async fn get_message_content(
        &self,
        content_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<MessageContent>>;

    async fn get_account_state(
        &self,
        state_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<AccountState>>;

    async fn get_interfaces(
        &self,
        code_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<CodeHashInterfaces>>;

    async fn get_jetton_wallet(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonWallet>>;

    async fn get_jetton_wallets_by_owner(
        &self,
        owner: &str,
        method_name: &str,
    ) -> DbResult<Vec<JettonWallet>>;

    async fn get_jetton_master(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonMaster>>;

    async fn get_nft_collection(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<NftCollection>>;

    async fn get_nft_item(&self, address: &str, method_name: &str) -> DbResult<Option<NftItem>>;

    /// Items of a collection, by index
    async fn get_nft_items_by_collection(
        &self,
        collection_address: &str,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<NftItem>>;

    async fn get_jetton_transfer(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonTransfer>>;

    async fn get_jetton_burn(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonBurn>>;

    async fn get_nft_transfer(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<NftTransfer>>;
}

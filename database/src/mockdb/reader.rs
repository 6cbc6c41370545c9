use ledger_primitives::{
    AccountState, Block, BlockId, CodeHashInterfaces, JettonBurn, JettonMaster, JettonTransfer,
    JettonWallet, Message, MessageContent, MessageDirection, NftCollection, NftItem, NftTransfer,
    Transaction,
};

use crate::metrics::count_read;
use crate::schema;
use crate::{DbResult, MockDBManager, Pagination, SortOrder};

fn by_lt(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| (a.lt, &a.hash).cmp(&(b.lt, &b.hash)));
}

#[async_trait::async_trait]
impl crate::ReaderDbManager for MockDBManager {
    async fn get_block(&self, block_id: BlockId, method_name: &str) -> DbResult<Option<Block>> {
        count_read(method_name, &schema::BLOCKS);
        Ok(self.state.read().await.blocks.get(&block_id).cloned())
    }

    async fn get_blocks_by_seqno_range(
        &self,
        workchain: i32,
        shard: i64,
        from_seqno: i32,
        to_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Block>> {
        count_read(method_name, &schema::BLOCKS);
        if from_seqno > to_seqno {
            return Ok(vec![]);
        }
        let from = BlockId::new(workchain, shard, from_seqno);
        let to = BlockId::new(workchain, shard, to_seqno);
        Ok(self
            .state
            .read()
            .await
            .blocks
            .range(from..=to)
            .map(|(_, block)| block.clone())
            .collect())
    }

    async fn get_shard_blocks(
        &self,
        masterchain_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Block>> {
        count_read(method_name, &schema::BLOCKS);
        let masterchain_block = BlockId::masterchain(masterchain_seqno);
        Ok(self
            .state
            .read()
            .await
            .blocks
            .values()
            .filter(|block| block.masterchain_block == Some(masterchain_block))
            .cloned()
            .collect())
    }

    async fn get_blocks_by_unix_time(
        &self,
        start_utime: Option<i64>,
        end_utime: Option<i64>,
        workchain: Option<i32>,
        shard: Option<i64>,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<Block>> {
        count_read(method_name, &schema::BLOCKS);
        let mut blocks: Vec<Block> = self
            .state
            .read()
            .await
            .blocks
            .values()
            .filter(|block| start_utime.map_or(true, |start| block.gen_utime >= start))
            .filter(|block| end_utime.map_or(true, |end| block.gen_utime <= end))
            .filter(|block| workchain.map_or(true, |workchain| block.id.workchain == workchain))
            .filter(|block| shard.map_or(true, |shard| block.id.shard == shard))
            .cloned()
            .collect();
        blocks.sort_by_key(|block| (block.gen_utime, block.id));
        Ok(pagination.apply(blocks))
    }

    async fn get_transaction_by_hash(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Transaction>> {
        count_read(method_name, &schema::TRANSACTIONS);
        Ok(self
            .state
            .read()
            .await
            .transactions
            .get(transaction_hash)
            .cloned())
    }

    async fn get_transactions_by_account(
        &self,
        account: &str,
        start_utime: Option<i32>,
        end_utime: Option<i32>,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>> {
        count_read(method_name, &schema::TRANSACTIONS);
        let mut transactions: Vec<Transaction> = self
            .state
            .read()
            .await
            .transactions
            .values()
            .filter(|transaction| transaction.account == account)
            .filter(|transaction| start_utime.map_or(true, |start| transaction.utime >= start))
            .filter(|transaction| end_utime.map_or(true, |end| transaction.utime <= end))
            .cloned()
            .collect();
        by_lt(&mut transactions);
        Ok(pagination.apply(transactions))
    }

    async fn get_transactions_in_block(
        &self,
        block_id: BlockId,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>> {
        count_read(method_name, &schema::TRANSACTIONS);
        let mut transactions: Vec<Transaction> = self
            .state
            .read()
            .await
            .transactions
            .values()
            .filter(|transaction| transaction.block == block_id)
            .cloned()
            .collect();
        by_lt(&mut transactions);
        Ok(transactions)
    }

    async fn get_transactions_by_masterchain_seqno(
        &self,
        masterchain_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>> {
        count_read(method_name, &schema::TRANSACTIONS);
        let masterchain_block = BlockId::masterchain(masterchain_seqno);
        let state = self.state.read().await;
        let in_masterchain_block = |block_id: &BlockId| {
            *block_id == masterchain_block
                || state.blocks.get(block_id).map_or(false, |block| {
                    block.masterchain_block == Some(masterchain_block)
                })
        };
        let mut transactions: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|transaction| in_masterchain_block(&transaction.block))
            .cloned()
            .collect();
        by_lt(&mut transactions);
        Ok(transactions)
    }

    async fn get_message_by_hash(
        &self,
        message_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Message>> {
        count_read(method_name, &schema::MESSAGES);
        Ok(self.state.read().await.messages.get(message_hash).cloned())
    }

    async fn get_in_message_by_transaction(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Message>> {
        count_read(method_name, &schema::TRANSACTION_MESSAGES);
        let state = self.state.read().await;
        Ok(state
            .inbound_messages
            .get(transaction_hash)
            .and_then(|message_hash| state.messages.get(message_hash))
            .cloned())
    }

    async fn get_out_messages_by_transaction(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Vec<Message>> {
        count_read(method_name, &schema::TRANSACTION_MESSAGES);
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .transaction_messages
            .iter()
            .filter(|link| {
                link.transaction_hash == transaction_hash && link.direction == MessageDirection::Out
            })
            .filter_map(|link| state.messages.get(&link.message_hash))
            .cloned()
            .collect();
        // `None` sorts first; PostgreSQL puts NULL last in ascending order
        messages.sort_by(|a, b| {
            (a.created_lt.is_none(), a.created_lt, &a.hash)
                .cmp(&(b.created_lt.is_none(), b.created_lt, &b.hash))
        });
        Ok(messages)
    }

    async fn get_messages_by_account(
        &self,
        address: &str,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<Message>> {
        count_read(method_name, &schema::MESSAGES);
        let (mut dated, mut undated): (Vec<Message>, Vec<Message>) = self
            .state
            .read()
            .await
            .messages
            .values()
            .filter(|message| {
                message.source.as_deref() == Some(address)
                    || message.destination.as_deref() == Some(address)
            })
            .cloned()
            .partition(|message| message.created_lt.is_some());
        dated.sort_by(|a, b| (a.created_lt, &a.hash).cmp(&(b.created_lt, &b.hash)));
        undated.sort_by(|a, b| a.hash.cmp(&b.hash));
        // Messages without `created_lt` go last in both directions
        if pagination.sort == SortOrder::Desc {
            dated.reverse();
            undated.reverse();
        }
        Ok(pagination.window(dated.into_iter().chain(undated)))
    }

    async fn get_message_content(
        &self,
        content_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<MessageContent>> {
        count_read(method_name, &schema::MESSAGE_CONTENTS);
        Ok(self
            .state
            .read()
            .await
            .message_contents
            .get(content_hash)
            .cloned())
    }

    async fn get_account_state(
        &self,
        state_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<AccountState>> {
        count_read(method_name, &schema::ACCOUNT_STATES);
        Ok(self
            .state
            .read()
            .await
            .account_states
            .get(state_hash)
            .cloned())
    }

    async fn get_interfaces(
        &self,
        code_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<CodeHashInterfaces>> {
        count_read(method_name, &schema::CODE_HASH);
        Ok(self.state.read().await.code_hashes.get(code_hash).cloned())
    }

    async fn get_jetton_wallet(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonWallet>> {
        count_read(method_name, &schema::JETTON_WALLETS);
        Ok(self.state.read().await.jetton_wallets.get(address).cloned())
    }

    async fn get_jetton_wallets_by_owner(
        &self,
        owner: &str,
        method_name: &str,
    ) -> DbResult<Vec<JettonWallet>> {
        count_read(method_name, &schema::JETTON_WALLETS);
        let mut wallets: Vec<JettonWallet> = self
            .state
            .read()
            .await
            .jetton_wallets
            .values()
            .filter(|wallet| wallet.owner == owner)
            .cloned()
            .collect();
        wallets.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(wallets)
    }

    async fn get_jetton_master(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonMaster>> {
        count_read(method_name, &schema::JETTON_MASTERS);
        Ok(self.state.read().await.jetton_masters.get(address).cloned())
    }

    async fn get_nft_collection(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<NftCollection>> {
        count_read(method_name, &schema::NFT_COLLECTIONS);
        Ok(self.state.read().await.nft_collections.get(address).cloned())
    }

    async fn get_nft_item(&self, address: &str, method_name: &str) -> DbResult<Option<NftItem>> {
        count_read(method_name, &schema::NFT_ITEMS);
        Ok(self.state.read().await.nft_items.get(address).cloned())
    }

    async fn get_nft_items_by_collection(
        &self,
        collection_address: &str,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<NftItem>> {
        count_read(method_name, &schema::NFT_ITEMS);
        let mut items: Vec<NftItem> = self
            .state
            .read()
            .await
            .nft_items
            .values()
            .filter(|item| item.collection_address.as_deref() == Some(collection_address))
            .cloned()
            .collect();
        items.sort_by(|a, b| (&a.index, &a.address).cmp(&(&b.index, &b.address)));
        Ok(pagination.apply(items))
    }

    async fn get_jetton_transfer(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonTransfer>> {
        count_read(method_name, &schema::JETTON_TRANSFERS);
        Ok(self
            .state
            .read()
            .await
            .jetton_transfers
            .get(transaction_hash)
            .cloned())
    }

    async fn get_jetton_burn(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonBurn>> {
        count_read(method_name, &schema::JETTON_BURNS);
        Ok(self
            .state
            .read()
            .await
            .jetton_burns
            .get(transaction_hash)
            .cloned())
    }

    async fn get_nft_transfer(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<NftTransfer>> {
        count_read(method_name, &schema::NFT_TRANSFERS);
        Ok(self
            .state
            .read()
            .await
            .nft_transfers
            .get(transaction_hash)
            .cloned())
    }
}

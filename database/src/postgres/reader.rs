use futures::TryStreamExt;
use ledger_primitives::{
    AccountState, Block, BlockId, CodeHashInterfaces, JettonBurn, JettonMaster, JettonTransfer,
    JettonWallet, Message, MessageContent, NftCollection, NftItem, NftTransfer, Transaction,
    MASTERCHAIN_INDEX, MASTERCHAIN_SHARD,
};

use crate::postgres::models;
use crate::metrics::count_read;
use crate::schema;
use crate::{DbError, DbResult, Pagination, PostgresDBManager};

impl PostgresDBManager {
    async fn fetch_transactions(
        &self,
        query: sqlx::query::QueryAs<'_, sqlx::Postgres, models::TransactionRow, sqlx::postgres::PgArguments>,
    ) -> DbResult<Vec<Transaction>> {
        query
            .fetch(&self.pool)
            .map_err(DbError::from)
            .and_then(|row| futures::future::ready(Transaction::try_from(row)))
            .try_collect()
            .await
    }
}

#[async_trait::async_trait]
impl crate::ReaderDbManager for PostgresDBManager {
    async fn get_block(&self, block_id: BlockId, method_name: &str) -> DbResult<Option<Block>> {
        count_read(method_name, &schema::BLOCKS);
        let row: Option<models::BlockRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM blocks
            WHERE workchain = $1 AND shard = $2 AND seqno = $3;
            ",
            schema::BLOCKS.select_list()
        ))
        .bind(block_id.workchain)
        .bind(block_id.shard)
        .bind(block_id.seqno)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Block::from))
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
        let rows: Vec<models::BlockRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM blocks
            WHERE workchain = $1 AND shard = $2 AND seqno BETWEEN $3 AND $4
            ORDER BY seqno;
            ",
            schema::BLOCKS.select_list()
        ))
        .bind(workchain)
        .bind(shard)
        .bind(from_seqno)
        .bind(to_seqno)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Block::from).collect())
    }

    async fn get_shard_blocks(
        &self,
        masterchain_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Block>> {
        count_read(method_name, &schema::BLOCKS);
        let rows: Vec<models::BlockRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM blocks
            WHERE mc_block_workchain = $1 AND mc_block_shard = $2 AND mc_block_seqno = $3
            ORDER BY workchain, shard, seqno;
            ",
            schema::BLOCKS.select_list()
        ))
        .bind(MASTERCHAIN_INDEX)
        .bind(MASTERCHAIN_SHARD)
        .bind(masterchain_seqno)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Block::from).collect())
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
        let rows: Vec<models::BlockRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM blocks
            WHERE ($1::BIGINT IS NULL OR gen_utime >= $1)
                AND ($2::BIGINT IS NULL OR gen_utime <= $2)
                AND ($3::INTEGER IS NULL OR workchain = $3)
                AND ($4::BIGINT IS NULL OR shard = $4)
            ORDER BY gen_utime {sort}, workchain {sort}, shard {sort}, seqno {sort}
            LIMIT $5 OFFSET $6;
            ",
            schema::BLOCKS.select_list(),
            sort = pagination.sort.as_sql(),
        ))
        .bind(start_utime)
        .bind(end_utime)
        .bind(workchain)
        .bind(shard)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Block::from).collect())
    }

    async fn get_transaction_by_hash(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Transaction>> {
        count_read(method_name, &schema::TRANSACTIONS);
        let row: Option<models::TransactionRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM transactions
            WHERE hash = $1;
            ",
            schema::TRANSACTIONS.select_list()
        ))
        .bind(transaction_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Transaction::try_from).transpose()
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
        let sql = format!(
            "
            SELECT {}
            FROM transactions
            WHERE account = $1
                AND ($2::INTEGER IS NULL OR utime >= $2)
                AND ($3::INTEGER IS NULL OR utime <= $3)
            ORDER BY lt {sort}
            LIMIT $4 OFFSET $5;
            ",
            schema::TRANSACTIONS.select_list(),
            sort = pagination.sort.as_sql(),
        );
        let query = sqlx::query_as(&sql)
            .bind(account)
            .bind(start_utime)
            .bind(end_utime)
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.offset));
        self.fetch_transactions(query).await
    }

    async fn get_transactions_in_block(
        &self,
        block_id: BlockId,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>> {
        count_read(method_name, &schema::TRANSACTIONS);
        let sql = format!(
            "
            SELECT {}
            FROM transactions
            WHERE block_workchain = $1 AND block_shard = $2 AND block_seqno = $3
            ORDER BY lt, hash;
            ",
            schema::TRANSACTIONS.select_list()
        );
        let query = sqlx::query_as(&sql)
            .bind(block_id.workchain)
            .bind(block_id.shard)
            .bind(block_id.seqno);
        self.fetch_transactions(query).await
    }

    async fn get_transactions_by_masterchain_seqno(
        &self,
        masterchain_seqno: i32,
        method_name: &str,
    ) -> DbResult<Vec<Transaction>> {
        count_read(method_name, &schema::TRANSACTIONS);
        let sql = format!(
            "
            SELECT {}
            FROM transactions
            WHERE (block_workchain, block_shard, block_seqno) IN (
                SELECT workchain, shard, seqno
                FROM blocks
                WHERE (workchain = $1 AND shard = $2 AND seqno = $3)
                    OR (mc_block_workchain = $1 AND mc_block_shard = $2 AND mc_block_seqno = $3)
            )
            ORDER BY lt, hash;
            ",
            schema::TRANSACTIONS.select_list()
        );
        let query = sqlx::query_as(&sql)
            .bind(MASTERCHAIN_INDEX)
            .bind(MASTERCHAIN_SHARD)
            .bind(masterchain_seqno);
        self.fetch_transactions(query).await
    }

    async fn get_message_by_hash(
        &self,
        message_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Message>> {
        count_read(method_name, &schema::MESSAGES);
        let row: Option<models::MessageRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM messages
            WHERE hash = $1;
            ",
            schema::MESSAGES.select_list()
        ))
        .bind(message_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Message::from))
    }

    async fn get_in_message_by_transaction(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<Message>> {
        count_read(method_name, &schema::TRANSACTION_MESSAGES);
        let row: Option<models::MessageRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM messages
            WHERE hash IN (
                SELECT message_hash
                FROM transaction_messages
                WHERE transaction_hash = $1 AND direction = 'in'
            );
            ",
            schema::MESSAGES.select_list()
        ))
        .bind(transaction_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Message::from))
    }

    async fn get_out_messages_by_transaction(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Vec<Message>> {
        count_read(method_name, &schema::TRANSACTION_MESSAGES);
        let rows: Vec<models::MessageRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM messages
            WHERE hash IN (
                SELECT message_hash
                FROM transaction_messages
                WHERE transaction_hash = $1 AND direction = 'out'
            )
            ORDER BY created_lt, hash;
            ",
            schema::MESSAGES.select_list()
        ))
        .bind(transaction_hash)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn get_messages_by_account(
        &self,
        address: &str,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<Message>> {
        count_read(method_name, &schema::MESSAGES);
        let rows: Vec<models::MessageRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM messages
            WHERE source = $1 OR destination = $1
            ORDER BY created_lt {sort} NULLS LAST, hash {sort}
            LIMIT $2 OFFSET $3;
            ",
            schema::MESSAGES.select_list(),
            sort = pagination.sort.as_sql(),
        ))
        .bind(address)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn get_message_content(
        &self,
        content_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<MessageContent>> {
        count_read(method_name, &schema::MESSAGE_CONTENTS);
        let row: Option<models::MessageContentRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM message_contents
            WHERE hash = $1;
            ",
            schema::MESSAGE_CONTENTS.select_list()
        ))
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(MessageContent::from))
    }

    async fn get_account_state(
        &self,
        state_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<AccountState>> {
        count_read(method_name, &schema::ACCOUNT_STATES);
        let row: Option<models::AccountStateRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM account_states
            WHERE hash = $1;
            ",
            schema::ACCOUNT_STATES.select_list()
        ))
        .bind(state_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AccountState::try_from).transpose()
    }

    async fn get_interfaces(
        &self,
        code_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<CodeHashInterfaces>> {
        count_read(method_name, &schema::CODE_HASH);
        let row: Option<models::CodeHashRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM code_hash
            WHERE code_hash = $1;
            ",
            schema::CODE_HASH.select_list()
        ))
        .bind(code_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CodeHashInterfaces::try_from).transpose()
    }

    async fn get_jetton_wallet(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonWallet>> {
        count_read(method_name, &schema::JETTON_WALLETS);
        let row: Option<models::JettonWalletRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM jetton_wallets
            WHERE address = $1;
            ",
            schema::JETTON_WALLETS.select_list()
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JettonWallet::from))
    }

    async fn get_jetton_wallets_by_owner(
        &self,
        owner: &str,
        method_name: &str,
    ) -> DbResult<Vec<JettonWallet>> {
        count_read(method_name, &schema::JETTON_WALLETS);
        let rows: Vec<models::JettonWalletRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM jetton_wallets
            WHERE owner = $1
            ORDER BY address;
            ",
            schema::JETTON_WALLETS.select_list()
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(JettonWallet::from).collect())
    }

    async fn get_jetton_master(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonMaster>> {
        count_read(method_name, &schema::JETTON_MASTERS);
        let row: Option<models::JettonMasterRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM jetton_masters
            WHERE address = $1;
            ",
            schema::JETTON_MASTERS.select_list()
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JettonMaster::from))
    }

    async fn get_nft_collection(
        &self,
        address: &str,
        method_name: &str,
    ) -> DbResult<Option<NftCollection>> {
        count_read(method_name, &schema::NFT_COLLECTIONS);
        let row: Option<models::NftCollectionRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM nft_collections
            WHERE address = $1;
            ",
            schema::NFT_COLLECTIONS.select_list()
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(NftCollection::from))
    }

    async fn get_nft_item(&self, address: &str, method_name: &str) -> DbResult<Option<NftItem>> {
        count_read(method_name, &schema::NFT_ITEMS);
        let row: Option<models::NftItemRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM nft_items
            WHERE address = $1;
            ",
            schema::NFT_ITEMS.select_list()
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(NftItem::from))
    }

    async fn get_nft_items_by_collection(
        &self,
        collection_address: &str,
        pagination: Pagination,
        method_name: &str,
    ) -> DbResult<Vec<NftItem>> {
        count_read(method_name, &schema::NFT_ITEMS);
        let rows: Vec<models::NftItemRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM nft_items
            WHERE collection_address = $1
            ORDER BY \"index\" {sort}, address {sort}
            LIMIT $2 OFFSET $3;
            ",
            schema::NFT_ITEMS.select_list(),
            sort = pagination.sort.as_sql(),
        ))
        .bind(collection_address)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(NftItem::from).collect())
    }

    async fn get_jetton_transfer(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonTransfer>> {
        count_read(method_name, &schema::JETTON_TRANSFERS);
        let row: Option<models::JettonTransferRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM jetton_transfers
            WHERE transaction_hash = $1;
            ",
            schema::JETTON_TRANSFERS.select_list()
        ))
        .bind(transaction_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JettonTransfer::from))
    }

    async fn get_jetton_burn(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<JettonBurn>> {
        count_read(method_name, &schema::JETTON_BURNS);
        let row: Option<models::JettonBurnRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM jetton_burns
            WHERE transaction_hash = $1;
            ",
            schema::JETTON_BURNS.select_list()
        ))
        .bind(transaction_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JettonBurn::from))
    }

    async fn get_nft_transfer(
        &self,
        transaction_hash: &str,
        method_name: &str,
    ) -> DbResult<Option<NftTransfer>> {
        count_read(method_name, &schema::NFT_TRANSFERS);
        let row: Option<models::NftTransferRow> = sqlx::query_as(&format!(
            "
            SELECT {}
            FROM nft_transfers
            WHERE transaction_hash = $1;
            ",
            schema::NFT_TRANSFERS.select_list()
        ))
        .bind(transaction_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(NftTransfer::from))
    }
}

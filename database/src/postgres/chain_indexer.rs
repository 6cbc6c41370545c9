use ledger_primitives::{
    validate_all, AccountState, Block, BlockBatch, BlockId, ComputePhase, Message,
    MessageContent, Transaction, TransactionMessage, Validate,
};

use crate::base::{check_masterchain_link, unique_blocks};
use crate::schema::{self, types};
use crate::{DbResult, PostgresDBManager};

impl PostgresDBManager {
    async fn insert_blocks(conn: &mut sqlx::PgConnection, blocks: &[Block]) -> DbResult<u64> {
        let mut affected = 0;
        for chunk in blocks.chunks(super::INSERT_CHUNK_SIZE) {
            crate::metrics::DATABASE_WRITE_QUERIES
                .with_label_values(&["save_blocks", schema::BLOCKS.name])
                .inc();
            let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
                sqlx::QueryBuilder::new(schema::BLOCKS.insert_statement());
            query_builder.push_values(chunk, |mut values, block| {
                let mc_block = block.masterchain_block;
                values
                    .push_bind(block.id.workchain)
                    .push_bind(block.id.shard)
                    .push_bind(block.id.seqno)
                    .push_bind(&block.root_hash)
                    .push_bind(&block.file_hash)
                    .push_bind(mc_block.map(|id| id.workchain))
                    .push_bind(mc_block.map(|id| id.shard))
                    .push_bind(mc_block.map(|id| id.seqno))
                    .push_bind(block.global_id)
                    .push_bind(block.version)
                    .push_bind(block.after_merge)
                    .push_bind(block.before_split)
                    .push_bind(block.after_split)
                    .push_bind(block.want_split)
                    .push_bind(block.key_block)
                    .push_bind(block.vert_seqno_incr)
                    .push_bind(block.flags)
                    .push_bind(block.gen_utime)
                    .push_bind(block.start_lt)
                    .push_bind(block.end_lt)
                    .push_bind(block.validator_list_hash_short)
                    .push_bind(block.gen_catchain_seqno)
                    .push_bind(block.min_ref_mc_seqno)
                    .push_bind(block.prev_key_block_seqno)
                    .push_bind(block.vert_seqno)
                    .push_bind(block.master_ref_seqno)
                    .push_bind(&block.rand_seed)
                    .push_bind(&block.created_by);
            });
            // Stored blocks are immutable apart from a missing masterchain reference
            query_builder.push(
                "
                ON CONFLICT (workchain, shard, seqno) DO UPDATE SET
                    mc_block_workchain = EXCLUDED.mc_block_workchain,
                    mc_block_shard = EXCLUDED.mc_block_shard,
                    mc_block_seqno = EXCLUDED.mc_block_seqno
                WHERE blocks.mc_block_seqno IS NULL AND EXCLUDED.mc_block_seqno IS NOT NULL;
                ",
            );
            affected += query_builder.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn insert_account_states(
        conn: &mut sqlx::PgConnection,
        account_states: &[AccountState],
    ) -> DbResult<u64> {
        let mut affected = 0;
        for chunk in account_states.chunks(super::INSERT_CHUNK_SIZE) {
            crate::metrics::DATABASE_WRITE_QUERIES
                .with_label_values(&["save_account_states", schema::ACCOUNT_STATES.name])
                .inc();
            let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
                sqlx::QueryBuilder::new(schema::ACCOUNT_STATES.insert_statement());
            query_builder.push_values(chunk, |mut values, state| {
                values
                    .push_bind(&state.hash)
                    .push_bind(&state.account)
                    .push_bind(state.balance)
                    .push_bind(state.account_status.as_str())
                    .push_unseparated(format!("::{}", types::ACCOUNT_STATUS))
                    .push_bind(&state.frozen_hash)
                    .push_bind(&state.code_hash)
                    .push_bind(&state.data_hash);
            });
            query_builder.push(" ON CONFLICT (hash) DO NOTHING;");
            affected += query_builder.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn insert_transactions(
        conn: &mut sqlx::PgConnection,
        transactions: &[Transaction],
    ) -> DbResult<u64> {
        let mut affected = 0;
        for chunk in transactions.chunks(super::INSERT_CHUNK_SIZE) {
            crate::metrics::DATABASE_WRITE_QUERIES
                .with_label_values(&["save_transactions", schema::TRANSACTIONS.name])
                .inc();
            let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
                sqlx::QueryBuilder::new(schema::TRANSACTIONS.insert_statement());
            query_builder.push_values(chunk, |mut values, transaction| {
                let (skip_reason, executed) = match &transaction.compute {
                    Some(ComputePhase::Skipped { reason }) => (Some(reason.as_str()), None),
                    Some(ComputePhase::Executed {
                        exit_code,
                        gas_used,
                        gas_limit,
                        gas_credit,
                        gas_fees,
                        vm_steps,
                    }) => (
                        None,
                        Some((*exit_code, *gas_used, *gas_limit, *gas_credit, *gas_fees, *vm_steps)),
                    ),
                    None => (None, None),
                };
                let action = transaction.action.as_ref();
                values
                    .push_bind(&transaction.hash)
                    .push_bind(transaction.block.workchain)
                    .push_bind(transaction.block.shard)
                    .push_bind(transaction.block.seqno)
                    .push_bind(&transaction.account)
                    .push_bind(transaction.lt)
                    .push_bind(transaction.utime)
                    .push_bind(transaction.transaction_type.as_str())
                    .push_unseparated(format!("::{}", types::TRANSACTION_TYPE))
                    .push_bind(&transaction.account_state_hash_before)
                    .push_bind(&transaction.account_state_hash_after)
                    .push_bind(transaction.fees.total)
                    .push_bind(transaction.fees.storage)
                    .push_bind(transaction.fees.in_fwd)
                    .push_bind(transaction.fees.computation)
                    .push_bind(transaction.fees.action)
                    .push_bind(skip_reason)
                    .push_unseparated(format!("::{}", types::COMPUTE_SKIP_REASON))
                    .push_bind(executed.map(|phase| phase.0))
                    .push_bind(executed.map(|phase| phase.1))
                    .push_bind(executed.map(|phase| phase.2))
                    .push_bind(executed.and_then(|phase| phase.3))
                    .push_bind(executed.map(|phase| phase.4))
                    .push_bind(executed.map(|phase| phase.5))
                    .push_bind(action.map(|phase| phase.result_code))
                    .push_bind(action.and_then(|phase| phase.total_fwd_fees))
                    .push_bind(action.and_then(|phase| phase.total_action_fees));
            });
            // A clash on (account, lt) under another hash is still an error
            query_builder.push(" ON CONFLICT (hash) DO NOTHING;");
            affected += query_builder.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn insert_messages(conn: &mut sqlx::PgConnection, messages: &[Message]) -> DbResult<u64> {
        let mut affected = 0;
        for chunk in messages.chunks(super::INSERT_CHUNK_SIZE) {
            crate::metrics::DATABASE_WRITE_QUERIES
                .with_label_values(&["save_messages", schema::MESSAGES.name])
                .inc();
            let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
                sqlx::QueryBuilder::new(schema::MESSAGES.insert_statement());
            query_builder.push_values(chunk, |mut values, message| {
                values
                    .push_bind(&message.hash)
                    .push_bind(&message.source)
                    .push_bind(&message.destination)
                    .push_bind(message.value)
                    .push_bind(message.fwd_fee)
                    .push_bind(message.ihr_fee)
                    .push_bind(message.import_fee)
                    .push_bind(message.created_lt)
                    .push_bind(message.created_at)
                    .push_bind(message.opcode)
                    .push_bind(message.ihr_disabled)
                    .push_bind(message.bounce)
                    .push_bind(message.bounced)
                    .push_bind(&message.body_hash)
                    .push_bind(&message.init_state_hash);
            });
            query_builder.push(" ON CONFLICT (hash) DO NOTHING;");
            affected += query_builder.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn insert_message_contents(
        conn: &mut sqlx::PgConnection,
        message_contents: &[MessageContent],
    ) -> DbResult<u64> {
        let mut affected = 0;
        for chunk in message_contents.chunks(super::INSERT_CHUNK_SIZE) {
            crate::metrics::DATABASE_WRITE_QUERIES
                .with_label_values(&["save_message_contents", schema::MESSAGE_CONTENTS.name])
                .inc();
            let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
                sqlx::QueryBuilder::new(schema::MESSAGE_CONTENTS.insert_statement());
            query_builder.push_values(chunk, |mut values, content| {
                values.push_bind(&content.hash).push_bind(&content.body);
            });
            query_builder.push(" ON CONFLICT (hash) DO NOTHING;");
            affected += query_builder.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn insert_transaction_messages(
        conn: &mut sqlx::PgConnection,
        transaction_messages: &[TransactionMessage],
    ) -> DbResult<u64> {
        let mut affected = 0;
        for chunk in transaction_messages.chunks(super::INSERT_CHUNK_SIZE) {
            crate::metrics::DATABASE_WRITE_QUERIES
                .with_label_values(&[
                    "save_transaction_messages",
                    schema::TRANSACTION_MESSAGES.name,
                ])
                .inc();
            let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
                sqlx::QueryBuilder::new(schema::TRANSACTION_MESSAGES.insert_statement());
            query_builder.push_values(chunk, |mut values, link| {
                values
                    .push_bind(&link.transaction_hash)
                    .push_bind(&link.message_hash)
                    .push_bind(link.direction.as_str())
                    .push_unseparated(format!("::{}", types::DIRECTION));
            });
            // A second inbound message still violates the partial unique index
            query_builder.push(format!(
                " ON CONFLICT ({}) DO NOTHING;",
                schema::TRANSACTION_MESSAGES.conflict_target()
            ));
            affected += query_builder.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn save_blocks_once(&self, blocks: &[Block]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let affected = Self::insert_blocks(&mut *tx, blocks).await?;
        // Deferred foreign keys are checked here
        tx.commit().await?;
        tracing::debug!(
            target: crate::DATABASE,
            "Saved {} of {} blocks",
            affected,
            blocks.len()
        );
        Ok(())
    }

    async fn set_masterchain_block_once(
        &self,
        block: BlockId,
        masterchain_block: BlockId,
    ) -> DbResult<bool> {
        crate::metrics::DATABASE_WRITE_QUERIES
            .with_label_values(&["set_masterchain_block", schema::BLOCKS.name])
            .inc();
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "
            UPDATE blocks
            SET mc_block_workchain = $4, mc_block_shard = $5, mc_block_seqno = $6
            WHERE workchain = $1 AND shard = $2 AND seqno = $3 AND mc_block_seqno IS NULL;
            ",
        )
        .bind(block.workchain)
        .bind(block.shard)
        .bind(block.seqno)
        .bind(masterchain_block.workchain)
        .bind(masterchain_block.shard)
        .bind(masterchain_block.seqno)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;
        Ok(updated > 0)
    }

    async fn save_account_states_once(&self, account_states: &[AccountState]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_account_states(&mut *tx, account_states).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_transactions_once(&self, transactions: &[Transaction]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_transactions(&mut *tx, transactions).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_messages_once(&self, messages: &[Message]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_messages(&mut *tx, messages).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_message_contents_once(&self, message_contents: &[MessageContent]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_message_contents(&mut *tx, message_contents).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_transaction_messages_once(
        &self,
        transaction_messages: &[TransactionMessage],
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_transaction_messages(&mut *tx, transaction_messages).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_block_batch_once(&self, batch: &BlockBatch) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_blocks(&mut *tx, &batch.blocks).await?;
        Self::insert_account_states(&mut *tx, &batch.account_states).await?;
        Self::insert_messages(&mut *tx, &batch.messages).await?;
        Self::insert_message_contents(&mut *tx, &batch.message_contents).await?;
        Self::insert_transactions(&mut *tx, &batch.transactions).await?;
        Self::insert_transaction_messages(&mut *tx, &batch.transaction_messages).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::ChainIndexerDbManager for PostgresDBManager {
    async fn save_blocks(&self, blocks: &[Block]) -> DbResult<()> {
        validate_all(blocks)?;
        let blocks = unique_blocks(blocks);
        let blocks = blocks.as_slice();
        self.retry
            .run("save_blocks", move || self.save_blocks_once(blocks))
            .await
    }

    async fn set_masterchain_block(
        &self,
        block: BlockId,
        masterchain_block: BlockId,
    ) -> DbResult<bool> {
        check_masterchain_link(block, masterchain_block)?;
        self.retry
            .run("set_masterchain_block", move || {
                self.set_masterchain_block_once(block, masterchain_block)
            })
            .await
    }

    async fn save_account_states(&self, account_states: &[AccountState]) -> DbResult<()> {
        validate_all(account_states)?;
        self.retry
            .run("save_account_states", move || {
                self.save_account_states_once(account_states)
            })
            .await
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> DbResult<()> {
        validate_all(transactions)?;
        self.retry
            .run("save_transactions", move || {
                self.save_transactions_once(transactions)
            })
            .await
    }

    async fn save_messages(&self, messages: &[Message]) -> DbResult<()> {
        validate_all(messages)?;
        self.retry
            .run("save_messages", move || self.save_messages_once(messages))
            .await
    }

    async fn save_message_contents(&self, message_contents: &[MessageContent]) -> DbResult<()> {
        validate_all(message_contents)?;
        self.retry
            .run("save_message_contents", move || {
                self.save_message_contents_once(message_contents)
            })
            .await
    }

    async fn save_transaction_messages(
        &self,
        transaction_messages: &[TransactionMessage],
    ) -> DbResult<()> {
        validate_all(transaction_messages)?;
        self.retry
            .run("save_transaction_messages", move || {
                self.save_transaction_messages_once(transaction_messages)
            })
            .await
    }

    async fn save_block_batch(&self, mut batch: BlockBatch) -> DbResult<()> {
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }
        batch.blocks = unique_blocks(&batch.blocks);
        let batch = &batch;
        self.retry
            .run("save_block_batch", move || self.save_block_batch_once(batch))
            .await?;
        tracing::debug!(
            target: crate::DATABASE,
            "Saved batch of {} blocks, {} transactions, {} messages",
            batch.blocks.len(),
            batch.transactions.len(),
            batch.messages.len(),
        );
        Ok(())
    }
}

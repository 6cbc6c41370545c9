//! In-memory backend with the same write contracts as PostgreSQL: every
//! write is checked as a whole against the stored rows plus the rows of the
//! same commit, then applied, or rejected without side effects.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use ledger_primitives::{
    AccountState, Block, BlockBatch, BlockId, CodeHashInterfaces, JettonBurn, JettonMaster,
    JettonTransfer, JettonWallet, Message, MessageContent, MessageDirection, NftCollection,
    NftItem, NftTransfer, Projection, Transaction, TransactionMessage,
};

use crate::schema::constraints;
use crate::{DbError, DbResult, RetryPolicy};

mod chain_indexer;
mod contract_indexer;
mod reader;

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    blocks: BTreeMap<BlockId, Block>,
    transactions: HashMap<String, Transaction>,
    account_lts: HashMap<(String, i64), String>,
    account_states: HashMap<String, AccountState>,
    messages: HashMap<String, Message>,
    message_contents: HashMap<String, MessageContent>,
    transaction_messages: BTreeSet<TransactionMessage>,
    inbound_messages: HashMap<String, String>,
    code_hashes: HashMap<String, CodeHashInterfaces>,
    jetton_wallets: HashMap<String, JettonWallet>,
    jetton_masters: HashMap<String, JettonMaster>,
    nft_collections: HashMap<String, NftCollection>,
    nft_items: HashMap<String, NftItem>,
    jetton_transfers: HashMap<String, JettonTransfer>,
    jetton_burns: HashMap<String, JettonBurn>,
    nft_transfers: HashMap<String, NftTransfer>,
}

impl LedgerState {
    /// Checks a commit against the stored rows, then applies it
    fn commit(&mut self, batch: &BlockBatch) -> DbResult<()> {
        self.check(batch)?;
        self.apply(batch);
        Ok(())
    }

    fn check(&self, batch: &BlockBatch) -> DbResult<()> {
        let batch_blocks: HashSet<BlockId> = batch.blocks.iter().map(|block| block.id).collect();
        let block_exists =
            |id: &BlockId| self.blocks.contains_key(id) || batch_blocks.contains(id);

        for block in &batch.blocks {
            let Some(masterchain_block) = block.masterchain_block else {
                continue;
            };
            let writes_reference = self
                .blocks
                .get(&block.id)
                .map_or(true, |stored| stored.masterchain_block.is_none());
            if writes_reference && !block_exists(&masterchain_block) {
                return Err(DbError::missing_reference(
                    constraints::BLOCKS_MASTERCHAIN_BLOCK_FKEY,
                ));
            }
        }

        let mut new_transactions: HashSet<&str> = HashSet::new();
        let mut new_account_lts: HashSet<(&str, i64)> = HashSet::new();
        for transaction in &batch.transactions {
            if self.transactions.contains_key(&transaction.hash)
                || !new_transactions.insert(transaction.hash.as_str())
            {
                continue;
            }
            if !block_exists(&transaction.block) {
                return Err(DbError::missing_reference(constraints::TRANSACTIONS_BLOCK_FKEY));
            }
            let account_lt_taken = self
                .account_lts
                .contains_key(&(transaction.account.clone(), transaction.lt))
                || !new_account_lts.insert((transaction.account.as_str(), transaction.lt));
            if account_lt_taken {
                return Err(DbError::Constraint(format!(
                    "duplicate key value violates unique constraint \"{}\"",
                    constraints::TRANSACTIONS_ACCOUNT_LT_KEY
                )));
            }
        }

        let batch_messages: HashSet<&str> = batch
            .messages
            .iter()
            .map(|message| message.hash.as_str())
            .collect();
        let mut new_links: HashSet<&TransactionMessage> = HashSet::new();
        let mut new_inbound: HashSet<&str> = HashSet::new();
        for link in &batch.transaction_messages {
            if self.transaction_messages.contains(link) || !new_links.insert(link) {
                continue;
            }
            if !self.transactions.contains_key(&link.transaction_hash)
                && !new_transactions.contains(link.transaction_hash.as_str())
            {
                return Err(DbError::missing_reference(
                    constraints::TRANSACTION_MESSAGES_TRANSACTION_FKEY,
                ));
            }
            if !self.messages.contains_key(&link.message_hash)
                && !batch_messages.contains(link.message_hash.as_str())
            {
                return Err(DbError::missing_reference(
                    constraints::TRANSACTION_MESSAGES_MESSAGE_FKEY,
                ));
            }
            if link.direction == MessageDirection::In {
                let inbound_taken = self.inbound_messages.contains_key(&link.transaction_hash)
                    || !new_inbound.insert(link.transaction_hash.as_str());
                if inbound_taken {
                    return Err(DbError::Constraint(format!(
                        "duplicate key value violates unique constraint \"{}\"",
                        constraints::TRANSACTION_MESSAGES_SINGLE_INBOUND
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, batch: &BlockBatch) {
        for block in &batch.blocks {
            let stored = self.blocks.entry(block.id).or_insert_with(|| block.clone());
            if stored.masterchain_block.is_none() {
                stored.masterchain_block = block.masterchain_block;
            }
        }
        for state in &batch.account_states {
            self.account_states
                .entry(state.hash.clone())
                .or_insert_with(|| state.clone());
        }
        for message in &batch.messages {
            self.messages
                .entry(message.hash.clone())
                .or_insert_with(|| message.clone());
        }
        for content in &batch.message_contents {
            self.message_contents
                .entry(content.hash.clone())
                .or_insert_with(|| content.clone());
        }
        for transaction in &batch.transactions {
            if self.transactions.contains_key(&transaction.hash) {
                continue;
            }
            self.account_lts.insert(
                (transaction.account.clone(), transaction.lt),
                transaction.hash.clone(),
            );
            self.transactions
                .insert(transaction.hash.clone(), transaction.clone());
        }
        for link in &batch.transaction_messages {
            if self.transaction_messages.insert(link.clone())
                && link.direction == MessageDirection::In
            {
                self.inbound_messages
                    .insert(link.transaction_hash.clone(), link.message_hash.clone());
            }
        }
    }

    /// Back-fills a null masterchain reference, `false` when nothing changed
    fn link_masterchain_block(
        &mut self,
        block: BlockId,
        masterchain_block: BlockId,
    ) -> DbResult<bool> {
        let masterchain_exists = self.blocks.contains_key(&masterchain_block);
        match self.blocks.get_mut(&block) {
            Some(stored) if stored.masterchain_block.is_none() => {
                if !masterchain_exists {
                    return Err(DbError::missing_reference(
                        constraints::BLOCKS_MASTERCHAIN_BLOCK_FKEY,
                    ));
                }
                stored.masterchain_block = Some(masterchain_block);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Replaces the stored projection when the incoming one is newer
fn upsert_projection<P>(rows: &mut HashMap<String, P>, row: &P, table_name: &str) -> bool
where
    P: Projection + Clone,
{
    let stored_lt = rows.get(row.address()).map(Projection::last_transaction_lt);
    if !row.supersedes(stored_lt) {
        crate::metrics::STALE_PROJECTION_UPDATES
            .with_label_values(&[table_name])
            .inc();
        tracing::debug!(
            target: crate::DATABASE,
            "Skipped stale {} update for {}",
            table_name,
            row.address()
        );
        return false;
    }
    rows.insert(row.address().to_string(), row.clone());
    true
}

fn insert_event<E: Clone>(rows: &mut HashMap<String, E>, transaction_hash: &str, row: &E) -> bool {
    if rows.contains_key(transaction_hash) {
        return false;
    }
    rows.insert(transaction_hash.to_string(), row.clone());
    true
}

pub struct MockDBManager {
    state: tokio::sync::RwLock<LedgerState>,
    retry: RetryPolicy,
}

impl MockDBManager {
    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self {
            state: tokio::sync::RwLock::new(LedgerState::default()),
            retry,
        }
    }

    /// Commits `batch` atomically, retrying while referenced rows are missing
    async fn commit(&self, method_name: &str, batch: BlockBatch) -> DbResult<()> {
        let batch = &batch;
        self.retry
            .run(method_name, move || async move {
                self.state.write().await.commit(batch)
            })
            .await
    }
}

impl Default for MockDBManager {
    fn default() -> Self {
        Self::with_retry(RetryPolicy::default())
    }
}

#[async_trait::async_trait]
impl crate::BaseDbManager for MockDBManager {
    async fn new(config: &configuration::DatabaseConfig) -> DbResult<Box<Self>> {
        Ok(Box::new(Self::with_retry(RetryPolicy::from(&config.write))))
    }
}

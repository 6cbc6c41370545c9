use serde::{Deserialize, Serialize};

use crate::validation::{validate_hash, validate_not_empty, validate_optional_hash};
use crate::{
    AccountStatus, BlockId, ComputeSkipReason, MessageDirection, TransactionType, Validate,
    ValidationError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub root_hash: String,
    pub file_hash: String,
    /// Masterchain block this shard block was committed in.
    /// Always `None` for masterchain blocks.
    pub masterchain_block: Option<BlockId>,

    pub global_id: i32,
    pub version: i32,
    pub after_merge: bool,
    pub before_split: bool,
    pub after_split: bool,
    pub want_split: bool,
    pub key_block: bool,
    pub vert_seqno_incr: bool,
    pub flags: i32,
    pub gen_utime: i64,
    pub start_lt: i64,
    pub end_lt: i64,
    pub validator_list_hash_short: i32,
    pub gen_catchain_seqno: i32,
    pub min_ref_mc_seqno: i32,
    pub prev_key_block_seqno: i32,
    pub vert_seqno: i32,
    pub master_ref_seqno: Option<i32>,
    pub rand_seed: String,
    pub created_by: String,
}

impl Validate for Block {
    fn validate(&self) -> Result<(), ValidationError> {
        self.id.check_shard()?;
        validate_hash("root_hash", &self.root_hash)?;
        validate_hash("file_hash", &self.file_hash)?;
        validate_hash("rand_seed", &self.rand_seed)?;
        if self.start_lt > self.end_lt {
            return Err(ValidationError::InvalidBlock {
                block: self.id,
                reason: "start_lt is greater than end_lt",
            });
        }
        match (self.id.is_masterchain(), self.masterchain_block) {
            (true, Some(_)) => Err(ValidationError::InvalidBlock {
                block: self.id,
                reason: "masterchain block cannot reference another masterchain block",
            }),
            (false, Some(mc_block)) if !mc_block.is_masterchain() => {
                Err(ValidationError::InvalidBlock {
                    block: self.id,
                    reason: "referenced block is not a masterchain block",
                })
            }
            (false, Some(mc_block)) => mc_block.check_shard(),
            _ => Ok(()),
        }
    }
}

/// Outcome of the compute phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputePhase {
    Skipped {
        reason: ComputeSkipReason,
    },
    Executed {
        exit_code: i32,
        gas_used: i64,
        gas_limit: i64,
        gas_credit: Option<i64>,
        gas_fees: i64,
        vm_steps: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPhase {
    pub result_code: i32,
    pub total_fwd_fees: Option<i64>,
    pub total_action_fees: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFees {
    pub total: i64,
    pub storage: i64,
    pub in_fwd: i64,
    pub computation: i64,
    pub action: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub block: BlockId,
    pub account: String,
    pub lt: i64,
    pub utime: i32,
    pub transaction_type: TransactionType,
    /// Lookup keys into the account states, not owned by the transaction
    pub account_state_hash_before: Option<String>,
    pub account_state_hash_after: Option<String>,
    pub fees: TransactionFees,
    pub compute: Option<ComputePhase>,
    pub action: Option<ActionPhase>,
}

impl Validate for Transaction {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("hash", &self.hash)?;
        validate_not_empty("account", &self.account)?;
        self.block.check_shard()?;
        validate_optional_hash(
            "account_state_hash_before",
            self.account_state_hash_before.as_deref(),
        )?;
        validate_optional_hash(
            "account_state_hash_after",
            self.account_state_hash_after.as_deref(),
        )?;
        if self.lt < 0 {
            return Err(ValidationError::InvalidTransaction {
                hash: self.hash.clone(),
                reason: "negative lt",
            });
        }
        if self.compute.is_some() && !self.transaction_type.has_compute_phase() {
            return Err(ValidationError::InvalidTransaction {
                hash: self.hash.clone(),
                reason: "compute phase on a transaction type without one",
            });
        }
        if self.action.is_some() && !self.transaction_type.has_action_phase() {
            return Err(ValidationError::InvalidTransaction {
                hash: self.hash.clone(),
                reason: "action phase on a transaction type without one",
            });
        }
        Ok(())
    }
}

/// Content-addressed snapshot of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub hash: String,
    pub account: String,
    pub balance: i64,
    pub account_status: AccountStatus,
    pub frozen_hash: Option<String>,
    pub code_hash: Option<String>,
    pub data_hash: Option<String>,
}

impl Validate for AccountState {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("hash", &self.hash)?;
        validate_not_empty("account", &self.account)?;
        validate_optional_hash("frozen_hash", self.frozen_hash.as_deref())?;
        validate_optional_hash("code_hash", self.code_hash.as_deref())?;
        validate_optional_hash("data_hash", self.data_hash.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub hash: String,
    pub source: Option<String>,
    /// Absent for external outbound messages
    pub destination: Option<String>,
    pub value: Option<i64>,
    pub fwd_fee: Option<i64>,
    pub ihr_fee: Option<i64>,
    pub import_fee: Option<i64>,
    pub created_lt: Option<i64>,
    pub created_at: Option<i64>,
    pub opcode: Option<i32>,
    pub ihr_disabled: Option<bool>,
    pub bounce: Option<bool>,
    pub bounced: Option<bool>,
    pub body_hash: Option<String>,
    pub init_state_hash: Option<String>,
}

impl Validate for Message {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("hash", &self.hash)?;
        validate_optional_hash("body_hash", self.body_hash.as_deref())?;
        validate_optional_hash("init_state_hash", self.init_state_hash.as_deref())
    }
}

/// Link between a transaction and one of its messages
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionMessage {
    pub transaction_hash: String,
    pub message_hash: String,
    pub direction: MessageDirection,
}

impl TransactionMessage {
    pub fn inbound(transaction_hash: impl Into<String>, message_hash: impl Into<String>) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            message_hash: message_hash.into(),
            direction: MessageDirection::In,
        }
    }

    pub fn outbound(transaction_hash: impl Into<String>, message_hash: impl Into<String>) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            message_hash: message_hash.into(),
            direction: MessageDirection::Out,
        }
    }
}

impl Validate for TransactionMessage {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("transaction_hash", &self.transaction_hash)?;
        validate_hash("message_hash", &self.message_hash)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub hash: String,
    pub body: String,
}

impl Validate for MessageContent {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("hash", &self.hash)
    }
}

/// Rows produced by decoding a set of blocks, written in a single commit
#[derive(Debug, Clone, Default)]
pub struct BlockBatch {
    pub blocks: Vec<Block>,
    pub account_states: Vec<AccountState>,
    pub transactions: Vec<Transaction>,
    pub messages: Vec<Message>,
    pub message_contents: Vec<MessageContent>,
    pub transaction_messages: Vec<TransactionMessage>,
}

impl BlockBatch {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.account_states.is_empty()
            && self.transactions.is_empty()
            && self.messages.is_empty()
            && self.message_contents.is_empty()
            && self.transaction_messages.is_empty()
    }

    /// Masterchain blocks go first so the batch never references forward
    pub fn sort_blocks(&mut self) {
        sort_masterchain_first(&mut self.blocks);
    }
}

impl Validate for BlockBatch {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_all(&self.blocks)?;
        validate_all(&self.account_states)?;
        validate_all(&self.transactions)?;
        validate_all(&self.messages)?;
        validate_all(&self.message_contents)?;
        validate_all(&self.transaction_messages)
    }
}

pub fn validate_all<T: Validate>(rows: &[T]) -> Result<(), ValidationError> {
    rows.iter().try_for_each(Validate::validate)
}

/// Stable sort putting masterchain blocks before shard blocks
pub fn sort_masterchain_first(blocks: &mut [Block]) {
    blocks.sort_by_key(|block| !block.id.is_masterchain());
}

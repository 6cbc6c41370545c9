//! Row shapes returned by the reader queries and their conversion into
//! `ledger_primitives` values. Enum columns are selected as text and parsed
//! back through the closed enumerations.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use ledger_primitives::{
    AccountState, AccountStatus, ActionPhase, Block, BlockId, CodeHashInterfaces,
    ComputePhase, ComputeSkipReason, InterfaceName, JettonBurn, JettonMaster, JettonTransfer,
    JettonWallet, Message, MessageContent, NftCollection, NftItem, NftTransfer, Transaction,
    TransactionFees, TransactionType,
};

use crate::DbError;

#[derive(Debug, sqlx::FromRow)]
pub struct BlockRow {
    pub workchain: i32,
    pub shard: i64,
    pub seqno: i32,
    pub root_hash: String,
    pub file_hash: String,
    pub mc_block_workchain: Option<i32>,
    pub mc_block_shard: Option<i64>,
    pub mc_block_seqno: Option<i32>,
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

impl From<BlockRow> for Block {
    fn from(row: BlockRow) -> Self {
        let masterchain_block = match (row.mc_block_workchain, row.mc_block_shard, row.mc_block_seqno)
        {
            (Some(workchain), Some(shard), Some(seqno)) => Some(BlockId::new(workchain, shard, seqno)),
            _ => None,
        };
        Self {
            id: BlockId::new(row.workchain, row.shard, row.seqno),
            root_hash: row.root_hash,
            file_hash: row.file_hash,
            masterchain_block,
            global_id: row.global_id,
            version: row.version,
            after_merge: row.after_merge,
            before_split: row.before_split,
            after_split: row.after_split,
            want_split: row.want_split,
            key_block: row.key_block,
            vert_seqno_incr: row.vert_seqno_incr,
            flags: row.flags,
            gen_utime: row.gen_utime,
            start_lt: row.start_lt,
            end_lt: row.end_lt,
            validator_list_hash_short: row.validator_list_hash_short,
            gen_catchain_seqno: row.gen_catchain_seqno,
            min_ref_mc_seqno: row.min_ref_mc_seqno,
            prev_key_block_seqno: row.prev_key_block_seqno,
            vert_seqno: row.vert_seqno,
            master_ref_seqno: row.master_ref_seqno,
            rand_seed: row.rand_seed,
            created_by: row.created_by,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct TransactionRow {
    pub hash: String,
    pub block_workchain: i32,
    pub block_shard: i64,
    pub block_seqno: i32,
    pub account: String,
    pub lt: i64,
    pub utime: i32,
    pub transaction_type: String,
    pub account_state_hash_before: Option<String>,
    pub account_state_hash_after: Option<String>,
    pub fees: i64,
    pub storage_fees: i64,
    pub in_fwd_fees: i64,
    pub computation_fees: i64,
    pub action_fees: i64,
    pub compute_skip_reason: Option<String>,
    pub compute_exit_code: Option<i32>,
    pub compute_gas_used: Option<i64>,
    pub compute_gas_limit: Option<i64>,
    pub compute_gas_credit: Option<i64>,
    pub compute_gas_fees: Option<i64>,
    pub compute_vm_steps: Option<i64>,
    pub action_result_code: Option<i32>,
    pub action_total_fwd_fees: Option<i64>,
    pub action_total_action_fees: Option<i64>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let compute = match (row.compute_skip_reason, row.compute_exit_code) {
            (Some(reason), _) => Some(ComputePhase::Skipped {
                reason: ComputeSkipReason::from_str(&reason)?,
            }),
            (None, Some(exit_code)) => Some(ComputePhase::Executed {
                exit_code,
                gas_used: row.compute_gas_used.unwrap_or_default(),
                gas_limit: row.compute_gas_limit.unwrap_or_default(),
                gas_credit: row.compute_gas_credit,
                gas_fees: row.compute_gas_fees.unwrap_or_default(),
                vm_steps: row.compute_vm_steps.unwrap_or_default(),
            }),
            (None, None) => None,
        };
        let action = row.action_result_code.map(|result_code| ActionPhase {
            result_code,
            total_fwd_fees: row.action_total_fwd_fees,
            total_action_fees: row.action_total_action_fees,
        });
        Ok(Self {
            hash: row.hash,
            block: BlockId::new(row.block_workchain, row.block_shard, row.block_seqno),
            account: row.account,
            lt: row.lt,
            utime: row.utime,
            transaction_type: TransactionType::from_str(&row.transaction_type)?,
            account_state_hash_before: row.account_state_hash_before,
            account_state_hash_after: row.account_state_hash_after,
            fees: TransactionFees {
                total: row.fees,
                storage: row.storage_fees,
                in_fwd: row.in_fwd_fees,
                computation: row.computation_fees,
                action: row.action_fees,
            },
            compute,
            action,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AccountStateRow {
    pub hash: String,
    pub account: String,
    pub balance: i64,
    pub account_status: String,
    pub frozen_hash: Option<String>,
    pub code_hash: Option<String>,
    pub data_hash: Option<String>,
}

impl TryFrom<AccountStateRow> for AccountState {
    type Error = DbError;

    fn try_from(row: AccountStateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            hash: row.hash,
            account: row.account,
            balance: row.balance,
            account_status: AccountStatus::from_str(&row.account_status)?,
            frozen_hash: row.frozen_hash,
            code_hash: row.code_hash,
            data_hash: row.data_hash,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRow {
    pub hash: String,
    pub source: Option<String>,
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

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            hash: row.hash,
            source: row.source,
            destination: row.destination,
            value: row.value,
            fwd_fee: row.fwd_fee,
            ihr_fee: row.ihr_fee,
            import_fee: row.import_fee,
            created_lt: row.created_lt,
            created_at: row.created_at,
            opcode: row.opcode,
            ihr_disabled: row.ihr_disabled,
            bounce: row.bounce,
            bounced: row.bounced,
            body_hash: row.body_hash,
            init_state_hash: row.init_state_hash,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MessageContentRow {
    pub hash: String,
    pub body: String,
}

impl From<MessageContentRow> for MessageContent {
    fn from(row: MessageContentRow) -> Self {
        Self {
            hash: row.hash,
            body: row.body,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct CodeHashRow {
    pub code_hash: String,
    pub interfaces: Vec<String>,
}

impl TryFrom<CodeHashRow> for CodeHashInterfaces {
    type Error = DbError;

    fn try_from(row: CodeHashRow) -> Result<Self, Self::Error> {
        let interfaces = row
            .interfaces
            .iter()
            .map(|interface| InterfaceName::from_str(interface))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(row.code_hash, interfaces))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JettonWalletRow {
    pub address: String,
    pub balance: BigDecimal,
    pub owner: String,
    pub jetton: String,
    pub last_transaction_lt: i64,
    pub code_hash: Option<String>,
    pub data_hash: Option<String>,
}

impl From<JettonWalletRow> for JettonWallet {
    fn from(row: JettonWalletRow) -> Self {
        Self {
            address: row.address,
            balance: row.balance,
            owner: row.owner,
            jetton: row.jetton,
            last_transaction_lt: row.last_transaction_lt,
            code_hash: row.code_hash,
            data_hash: row.data_hash,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JettonMasterRow {
    pub address: String,
    pub total_supply: BigDecimal,
    pub mintable: bool,
    pub admin_address: Option<String>,
    pub jetton_content: Option<serde_json::Value>,
    pub jetton_wallet_code_hash: Option<String>,
    pub code_hash: Option<String>,
    pub data_hash: Option<String>,
    pub last_transaction_lt: i64,
    pub code_boc: Option<String>,
    pub data_boc: Option<String>,
}

impl From<JettonMasterRow> for JettonMaster {
    fn from(row: JettonMasterRow) -> Self {
        Self {
            address: row.address,
            total_supply: row.total_supply,
            mintable: row.mintable,
            admin_address: row.admin_address,
            jetton_content: row.jetton_content,
            jetton_wallet_code_hash: row.jetton_wallet_code_hash,
            code_hash: row.code_hash,
            data_hash: row.data_hash,
            last_transaction_lt: row.last_transaction_lt,
            code_boc: row.code_boc,
            data_boc: row.data_boc,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct NftCollectionRow {
    pub address: String,
    pub next_item_index: BigDecimal,
    pub owner_address: Option<String>,
    pub collection_content: Option<serde_json::Value>,
    pub data_hash: Option<String>,
    pub code_hash: Option<String>,
    pub last_transaction_lt: i64,
    pub code_boc: Option<String>,
    pub data_boc: Option<String>,
}

impl From<NftCollectionRow> for NftCollection {
    fn from(row: NftCollectionRow) -> Self {
        Self {
            address: row.address,
            next_item_index: row.next_item_index,
            owner_address: row.owner_address,
            collection_content: row.collection_content,
            data_hash: row.data_hash,
            code_hash: row.code_hash,
            last_transaction_lt: row.last_transaction_lt,
            code_boc: row.code_boc,
            data_boc: row.data_boc,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct NftItemRow {
    pub address: String,
    pub init: bool,
    pub index: BigDecimal,
    pub collection_address: Option<String>,
    pub owner_address: Option<String>,
    pub content: Option<serde_json::Value>,
    pub last_transaction_lt: i64,
    pub code_hash: Option<String>,
    pub data_hash: Option<String>,
}

impl From<NftItemRow> for NftItem {
    fn from(row: NftItemRow) -> Self {
        Self {
            address: row.address,
            init: row.init,
            index: row.index,
            collection_address: row.collection_address,
            owner_address: row.owner_address,
            content: row.content,
            last_transaction_lt: row.last_transaction_lt,
            code_hash: row.code_hash,
            data_hash: row.data_hash,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JettonTransferRow {
    pub transaction_hash: String,
    pub query_id: BigDecimal,
    pub amount: BigDecimal,
    pub destination: String,
    pub response_destination: Option<String>,
    pub custom_payload: Option<String>,
    pub forward_ton_amount: Option<BigDecimal>,
    pub forward_payload: Option<String>,
}

impl From<JettonTransferRow> for JettonTransfer {
    fn from(row: JettonTransferRow) -> Self {
        Self {
            transaction_hash: row.transaction_hash,
            query_id: row.query_id,
            amount: row.amount,
            destination: row.destination,
            response_destination: row.response_destination,
            custom_payload: row.custom_payload,
            forward_ton_amount: row.forward_ton_amount,
            forward_payload: row.forward_payload,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JettonBurnRow {
    pub transaction_hash: String,
    pub query_id: BigDecimal,
    pub amount: BigDecimal,
    pub response_destination: Option<String>,
    pub custom_payload: Option<String>,
}

impl From<JettonBurnRow> for JettonBurn {
    fn from(row: JettonBurnRow) -> Self {
        Self {
            transaction_hash: row.transaction_hash,
            query_id: row.query_id,
            amount: row.amount,
            response_destination: row.response_destination,
            custom_payload: row.custom_payload,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct NftTransferRow {
    pub transaction_hash: String,
    pub query_id: BigDecimal,
    pub nft_item: String,
    pub old_owner: String,
    pub new_owner: String,
    pub response_destination: Option<String>,
    pub custom_payload: Option<String>,
    pub forward_amount: Option<BigDecimal>,
    pub forward_payload: Option<String>,
}

impl From<NftTransferRow> for NftTransfer {
    fn from(row: NftTransferRow) -> Self {
        Self {
            transaction_hash: row.transaction_hash,
            query_id: row.query_id,
            nft_item: row.nft_item,
            old_owner: row.old_owner,
            new_owner: row.new_owner,
            response_destination: row.response_destination,
            custom_payload: row.custom_payload,
            forward_amount: row.forward_amount,
            forward_payload: row.forward_payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction_row() -> TransactionRow {
        TransactionRow {
            hash: format!("{:0>43}=", 7),
            block_workchain: 0,
            block_shard: i64::MIN / 2,
            block_seqno: 50,
            account: "0:abc".to_string(),
            lt: 1_001,
            utime: 1_668_000_000,
            transaction_type: "trans_ord".to_string(),
            account_state_hash_before: None,
            account_state_hash_after: None,
            fees: 10,
            storage_fees: 1,
            in_fwd_fees: 2,
            computation_fees: 3,
            action_fees: 4,
            compute_skip_reason: None,
            compute_exit_code: Some(0),
            compute_gas_used: Some(1_000),
            compute_gas_limit: Some(10_000),
            compute_gas_credit: None,
            compute_gas_fees: Some(3),
            compute_vm_steps: Some(42),
            action_result_code: Some(0),
            action_total_fwd_fees: None,
            action_total_action_fees: Some(4),
        }
    }

    #[test]
    fn executed_transaction_row_is_converted() {
        let transaction = Transaction::try_from(transaction_row()).unwrap();
        assert_eq!(transaction.transaction_type, TransactionType::Ordinary);
        assert_eq!(transaction.block, BlockId::new(0, i64::MIN / 2, 50));
        assert!(matches!(
            transaction.compute,
            Some(ComputePhase::Executed { vm_steps: 42, .. })
        ));
        assert_eq!(transaction.action.unwrap().total_action_fees, Some(4));
    }

    #[test]
    fn skipped_compute_phase_wins_over_exit_code() {
        let row = TransactionRow {
            compute_skip_reason: Some("cskip_no_gas".to_string()),
            compute_exit_code: None,
            ..transaction_row()
        };
        let transaction = Transaction::try_from(row).unwrap();
        assert_eq!(
            transaction.compute,
            Some(ComputePhase::Skipped {
                reason: ComputeSkipReason::NoGas
            })
        );
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let row = TransactionRow {
            transaction_type: "trans_unknown".to_string(),
            ..transaction_row()
        };
        assert!(matches!(
            Transaction::try_from(row),
            Err(DbError::Validation(_))
        ));

        let row = CodeHashRow {
            code_hash: format!("{:0>43}=", 1),
            interfaces: vec!["jetton_wallet".to_string(), "wallet_v4".to_string()],
        };
        assert!(CodeHashInterfaces::try_from(row).is_err());
    }
}

//! Table descriptors of the ledger schema.
//!
//! The migrations under `src/postgres/migrations` are the source of truth;
//! the descriptors mirror them so statements are built from one list of
//! column names instead of hand-written copies.

/// PostgreSQL enum types backing the closed enumerations
pub mod types {
    pub const TRANSACTION_TYPE: &str = "trans_type";
    pub const COMPUTE_SKIP_REASON: &str = "compute_skip_reason_type";
    pub const ACCOUNT_STATUS: &str = "account_status_type";
    pub const DIRECTION: &str = "direction";
    pub const INTERFACE_NAME: &str = "interface_name";
}

/// Constraint names reported back by PostgreSQL
pub mod constraints {
    pub const BLOCKS_MASTERCHAIN_BLOCK_FKEY: &str = "blocks_masterchain_block_fkey";
    pub const TRANSACTIONS_BLOCK_FKEY: &str = "transactions_block_fkey";
    pub const TRANSACTIONS_ACCOUNT_LT_KEY: &str = "transactions_account_lt_key";
    pub const TRANSACTION_MESSAGES_TRANSACTION_FKEY: &str = "transaction_messages_transaction_fkey";
    pub const TRANSACTION_MESSAGES_MESSAGE_FKEY: &str = "transaction_messages_message_fkey";
    pub const TRANSACTION_MESSAGES_SINGLE_INBOUND: &str = "transaction_messages_single_inbound";
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    /// Enum type the value has to be cast to, `None` for plain columns
    pub enum_type: Option<&'static str>,
    pub is_array: bool,
}

const fn col(name: &'static str) -> Column {
    Column {
        name,
        enum_type: None,
        is_array: false,
    }
}

const fn enum_col(name: &'static str, enum_type: &'static str) -> Column {
    Column {
        name,
        enum_type: Some(enum_type),
        is_array: false,
    }
}

const fn enum_array_col(name: &'static str, enum_type: &'static str) -> Column {
    Column {
        name,
        enum_type: Some(enum_type),
        is_array: true,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub primary_key: &'static [&'static str],
    pub columns: &'static [Column],
}

impl Table {
    fn quoted(name: &str) -> String {
        format!("\"{}\"", name)
    }

    /// `INSERT INTO table ("a", "b", ...) ` ready for `push_values`
    pub fn insert_statement(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| Self::quoted(column.name))
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT INTO {} ({}) ", self.name, columns)
    }

    /// Select list with enum columns read back as text
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|column| match (column.enum_type, column.is_array) {
                (Some(_), false) => format!("{0}::text AS {0}", Self::quoted(column.name)),
                (Some(_), true) => format!("{0}::text[] AS {0}", Self::quoted(column.name)),
                (None, _) => Self::quoted(column.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn conflict_target(&self) -> String {
        self.primary_key
            .iter()
            .map(|name| Self::quoted(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SET` list overwriting every non-key column with the incoming row
    pub fn update_from_excluded(&self) -> String {
        self.columns
            .iter()
            .filter(|column| !self.primary_key.contains(&column.name))
            .map(|column| format!("{0} = EXCLUDED.{0}", Self::quoted(column.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub const BLOCKS: Table = Table {
    name: "blocks",
    primary_key: &["workchain", "shard", "seqno"],
    columns: &[
        col("workchain"),
        col("shard"),
        col("seqno"),
        col("root_hash"),
        col("file_hash"),
        col("mc_block_workchain"),
        col("mc_block_shard"),
        col("mc_block_seqno"),
        col("global_id"),
        col("version"),
        col("after_merge"),
        col("before_split"),
        col("after_split"),
        col("want_split"),
        col("key_block"),
        col("vert_seqno_incr"),
        col("flags"),
        col("gen_utime"),
        col("start_lt"),
        col("end_lt"),
        col("validator_list_hash_short"),
        col("gen_catchain_seqno"),
        col("min_ref_mc_seqno"),
        col("prev_key_block_seqno"),
        col("vert_seqno"),
        col("master_ref_seqno"),
        col("rand_seed"),
        col("created_by"),
    ],
};

pub const TRANSACTIONS: Table = Table {
    name: "transactions",
    primary_key: &["hash"],
    columns: &[
        col("hash"),
        col("block_workchain"),
        col("block_shard"),
        col("block_seqno"),
        col("account"),
        col("lt"),
        col("utime"),
        enum_col("transaction_type", types::TRANSACTION_TYPE),
        col("account_state_hash_before"),
        col("account_state_hash_after"),
        col("fees"),
        col("storage_fees"),
        col("in_fwd_fees"),
        col("computation_fees"),
        col("action_fees"),
        enum_col("compute_skip_reason", types::COMPUTE_SKIP_REASON),
        col("compute_exit_code"),
        col("compute_gas_used"),
        col("compute_gas_limit"),
        col("compute_gas_credit"),
        col("compute_gas_fees"),
        col("compute_vm_steps"),
        col("action_result_code"),
        col("action_total_fwd_fees"),
        col("action_total_action_fees"),
    ],
};

pub const ACCOUNT_STATES: Table = Table {
    name: "account_states",
    primary_key: &["hash"],
    columns: &[
        col("hash"),
        col("account"),
        col("balance"),
        enum_col("account_status", types::ACCOUNT_STATUS),
        col("frozen_hash"),
        col("code_hash"),
        col("data_hash"),
    ],
};

pub const MESSAGES: Table = Table {
    name: "messages",
    primary_key: &["hash"],
    columns: &[
        col("hash"),
        col("source"),
        col("destination"),
        col("value"),
        col("fwd_fee"),
        col("ihr_fee"),
        col("import_fee"),
        col("created_lt"),
        col("created_at"),
        col("opcode"),
        col("ihr_disabled"),
        col("bounce"),
        col("bounced"),
        col("body_hash"),
        col("init_state_hash"),
    ],
};

pub const TRANSACTION_MESSAGES: Table = Table {
    name: "transaction_messages",
    primary_key: &["transaction_hash", "message_hash", "direction"],
    columns: &[
        col("transaction_hash"),
        col("message_hash"),
        enum_col("direction", types::DIRECTION),
    ],
};

pub const MESSAGE_CONTENTS: Table = Table {
    name: "message_contents",
    primary_key: &["hash"],
    columns: &[col("hash"), col("body")],
};

pub const CODE_HASH: Table = Table {
    name: "code_hash",
    primary_key: &["code_hash"],
    columns: &[
        col("code_hash"),
        enum_array_col("interfaces", types::INTERFACE_NAME),
    ],
};

pub const JETTON_WALLETS: Table = Table {
    name: "jetton_wallets",
    primary_key: &["address"],
    columns: &[
        col("address"),
        col("balance"),
        col("owner"),
        col("jetton"),
        col("last_transaction_lt"),
        col("code_hash"),
        col("data_hash"),
    ],
};

pub const JETTON_MASTERS: Table = Table {
    name: "jetton_masters",
    primary_key: &["address"],
    columns: &[
        col("address"),
        col("total_supply"),
        col("mintable"),
        col("admin_address"),
        col("jetton_content"),
        col("jetton_wallet_code_hash"),
        col("code_hash"),
        col("data_hash"),
        col("last_transaction_lt"),
        col("code_boc"),
        col("data_boc"),
    ],
};

pub const NFT_COLLECTIONS: Table = Table {
    name: "nft_collections",
    primary_key: &["address"],
    columns: &[
        col("address"),
        col("next_item_index"),
        col("owner_address"),
        col("collection_content"),
        col("data_hash"),
        col("code_hash"),
        col("last_transaction_lt"),
        col("code_boc"),
        col("data_boc"),
    ],
};

pub const NFT_ITEMS: Table = Table {
    name: "nft_items",
    primary_key: &["address"],
    columns: &[
        col("address"),
        col("init"),
        col("index"),
        col("collection_address"),
        col("owner_address"),
        col("content"),
        col("last_transaction_lt"),
        col("code_hash"),
        col("data_hash"),
    ],
};

pub const JETTON_TRANSFERS: Table = Table {
    name: "jetton_transfers",
    primary_key: &["transaction_hash"],
    columns: &[
        col("transaction_hash"),
        col("query_id"),
        col("amount"),
        col("destination"),
        col("response_destination"),
        col("custom_payload"),
        col("forward_ton_amount"),
        col("forward_payload"),
    ],
};

pub const JETTON_BURNS: Table = Table {
    name: "jetton_burns",
    primary_key: &["transaction_hash"],
    columns: &[
        col("transaction_hash"),
        col("query_id"),
        col("amount"),
        col("response_destination"),
        col("custom_payload"),
    ],
};

pub const NFT_TRANSFERS: Table = Table {
    name: "nft_transfers",
    primary_key: &["transaction_hash"],
    columns: &[
        col("transaction_hash"),
        col("query_id"),
        col("nft_item"),
        col("old_owner"),
        col("new_owner"),
        col("response_destination"),
        col("custom_payload"),
        col("forward_amount"),
        col("forward_payload"),
    ],
};

pub const TABLES: &[Table] = &[
    BLOCKS,
    TRANSACTIONS,
    ACCOUNT_STATES,
    MESSAGES,
    TRANSACTION_MESSAGES,
    MESSAGE_CONTENTS,
    CODE_HASH,
    JETTON_WALLETS,
    JETTON_MASTERS,
    JETTON_TRANSFERS,
    JETTON_BURNS,
    NFT_COLLECTIONS,
    NFT_ITEMS,
    NFT_TRANSFERS,
];

#[cfg(test)]
mod tests {
    use super::*;

    const MIGRATION: &str = include_str!("postgres/migrations/20221101000000_ledger_schema.sql");

    /// Body of `CREATE TABLE <name> ( ... );` in the migration
    fn table_definition(name: &str) -> &'static str {
        let header = format!("CREATE TABLE {} (", name);
        let start = MIGRATION
            .find(&header)
            .unwrap_or_else(|| panic!("table {} is not created by the migration", name));
        let body = &MIGRATION[start + header.len()..];
        &body[..body.find("\n);").unwrap()]
    }

    #[test]
    fn descriptors_match_the_migration() {
        for table in TABLES {
            let definition = table_definition(table.name);
            let declared: Vec<&str> = definition
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .filter(|line| {
                    !["CONSTRAINT", "PRIMARY KEY", "REFERENCES"]
                        .iter()
                        .any(|keyword| line.starts_with(keyword))
                })
                .filter_map(|line| line.split_whitespace().next())
                .map(|name| name.trim_matches('"'))
                .collect();
            let described: Vec<&str> = table.columns.iter().map(|column| column.name).collect();
            assert_eq!(declared, described, "columns of {}", table.name);

            let primary_key = format!("PRIMARY KEY ({})", table.primary_key.join(", "));
            assert!(definition.contains(&primary_key), "primary key of {}", table.name);
        }
    }

    #[test]
    fn enum_types_and_constraints_exist() {
        for enum_type in [
            types::TRANSACTION_TYPE,
            types::COMPUTE_SKIP_REASON,
            types::ACCOUNT_STATUS,
            types::DIRECTION,
            types::INTERFACE_NAME,
        ] {
            assert!(MIGRATION.contains(&format!("CREATE TYPE {} AS ENUM", enum_type)));
        }
        for constraint in [
            constraints::BLOCKS_MASTERCHAIN_BLOCK_FKEY,
            constraints::TRANSACTIONS_BLOCK_FKEY,
            constraints::TRANSACTIONS_ACCOUNT_LT_KEY,
            constraints::TRANSACTION_MESSAGES_TRANSACTION_FKEY,
            constraints::TRANSACTION_MESSAGES_MESSAGE_FKEY,
            constraints::TRANSACTION_MESSAGES_SINGLE_INBOUND,
        ] {
            assert!(MIGRATION.contains(constraint), "{} is not declared", constraint);
        }
    }

    #[test]
    fn enum_labels_match_the_rust_enums() {
        use ledger_primitives::{
            AccountStatus, ComputeSkipReason, InterfaceName, MessageDirection, TransactionType,
        };

        fn labels(all: impl IntoIterator<Item = &'static str>) -> String {
            all.into_iter()
                .map(|label| format!("'{}'", label))
                .collect::<Vec<_>>()
                .join(", ")
        }

        for (enum_type, expected) in [
            (types::TRANSACTION_TYPE, labels(TransactionType::ALL.iter().map(|v| v.as_str()))),
            (types::COMPUTE_SKIP_REASON, labels(ComputeSkipReason::ALL.iter().map(|v| v.as_str()))),
            (types::ACCOUNT_STATUS, labels(AccountStatus::ALL.iter().map(|v| v.as_str()))),
            (types::DIRECTION, labels(MessageDirection::ALL.iter().map(|v| v.as_str()))),
            (types::INTERFACE_NAME, labels(InterfaceName::ALL.iter().map(|v| v.as_str()))),
        ] {
            let declaration = format!("CREATE TYPE {} AS ENUM ({});", enum_type, expected);
            assert!(MIGRATION.contains(&declaration), "{}", declaration);
        }
    }

    #[test]
    fn statements_quote_reserved_names() {
        assert!(NFT_ITEMS.insert_statement().contains("\"index\""));
        assert_eq!(
            TRANSACTION_MESSAGES.select_list(),
            "\"transaction_hash\", \"message_hash\", \"direction\"::text AS \"direction\""
        );
        assert_eq!(CODE_HASH.conflict_target(), "\"code_hash\"");
        assert!(!JETTON_WALLETS.update_from_excluded().contains("\"address\" ="));
        assert!(JETTON_WALLETS
            .update_from_excluded()
            .contains("\"last_transaction_lt\" = EXCLUDED.\"last_transaction_lt\""));
    }
}

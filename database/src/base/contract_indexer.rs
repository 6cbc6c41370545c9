use ledger_primitives::{
    CodeHashInterfaces, JettonBurn, JettonMaster, JettonTransfer, JettonWallet, NftCollection,
    NftItem, NftTransfer,
};

use crate::DbResult;

/// Writes of the contract-state updaters.
///
/// Projections are replaced as a whole when the incoming
/// `last_transaction_lt` is strictly greater than the stored one (or nothing
/// is stored yet); the returned flag tells whether the row was written.
/// Events are append-only, `false` means the event was already stored.
#[async_trait::async_trait]
pub trait ContractIndexerDbManager {
    async fn upsert_jetton_wallet(&self, wallet: &JettonWallet) -> DbResult<bool>;

    async fn upsert_jetton_master(&self, master: &JettonMaster) -> DbResult<bool>;

    async fn upsert_nft_collection(&self, collection: &NftCollection) -> DbResult<bool>;

    async fn upsert_nft_item(&self, item: &NftItem) -> DbResult<bool>;

    async fn save_jetton_transfer(&self, transfer: &JettonTransfer) -> DbResult<bool>;

    async fn save_jetton_burn(&self, burn: &JettonBurn) -> DbResult<bool>;

    async fn save_nft_transfer(&self, transfer: &NftTransfer) -> DbResult<bool>;

    /// Replaces the interface set detected for a contract code
    async fn save_code_hash_interfaces(&self, code_hash: &CodeHashInterfaces) -> DbResult<()>;
}

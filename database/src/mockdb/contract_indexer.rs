use ledger_primitives::{
    CodeHashInterfaces, JettonBurn, JettonMaster, JettonTransfer, JettonWallet, NftCollection,
    NftItem, NftTransfer, Validate,
};

use super::{insert_event, upsert_projection};
use crate::schema;
use crate::{DbResult, MockDBManager};

#[async_trait::async_trait]
impl crate::ContractIndexerDbManager for MockDBManager {
    async fn upsert_jetton_wallet(&self, wallet: &JettonWallet) -> DbResult<bool> {
        wallet.validate()?;
        let mut state = self.state.write().await;
        Ok(upsert_projection(
            &mut state.jetton_wallets,
            wallet,
            schema::JETTON_WALLETS.name,
        ))
    }

    async fn upsert_jetton_master(&self, master: &JettonMaster) -> DbResult<bool> {
        master.validate()?;
        let mut state = self.state.write().await;
        Ok(upsert_projection(
            &mut state.jetton_masters,
            master,
            schema::JETTON_MASTERS.name,
        ))
    }

    async fn upsert_nft_collection(&self, collection: &NftCollection) -> DbResult<bool> {
        collection.validate()?;
        let mut state = self.state.write().await;
        Ok(upsert_projection(
            &mut state.nft_collections,
            collection,
            schema::NFT_COLLECTIONS.name,
        ))
    }

    async fn upsert_nft_item(&self, item: &NftItem) -> DbResult<bool> {
        item.validate()?;
        let mut state = self.state.write().await;
        Ok(upsert_projection(
            &mut state.nft_items,
            item,
            schema::NFT_ITEMS.name,
        ))
    }

    async fn save_jetton_transfer(&self, transfer: &JettonTransfer) -> DbResult<bool> {
        transfer.validate()?;
        let mut state = self.state.write().await;
        Ok(insert_event(
            &mut state.jetton_transfers,
            &transfer.transaction_hash,
            transfer,
        ))
    }

    async fn save_jetton_burn(&self, burn: &JettonBurn) -> DbResult<bool> {
        burn.validate()?;
        let mut state = self.state.write().await;
        Ok(insert_event(
            &mut state.jetton_burns,
            &burn.transaction_hash,
            burn,
        ))
    }

    async fn save_nft_transfer(&self, transfer: &NftTransfer) -> DbResult<bool> {
        transfer.validate()?;
        let mut state = self.state.write().await;
        Ok(insert_event(
            &mut state.nft_transfers,
            &transfer.transaction_hash,
            transfer,
        ))
    }

    async fn save_code_hash_interfaces(&self, code_hash: &CodeHashInterfaces) -> DbResult<()> {
        code_hash.validate()?;
        self.state
            .write()
            .await
            .code_hashes
            .insert(code_hash.code_hash.clone(), code_hash.clone());
        Ok(())
    }
}

use ledger_primitives::{
    CodeHashInterfaces, JettonBurn, JettonMaster, JettonTransfer, JettonWallet, NftCollection,
    NftItem, NftTransfer, Validate,
};

use crate::schema::{self, types};
use crate::{DbResult, PostgresDBManager};

impl PostgresDBManager {
    /// Finishes a single-row projection insert with the watermark guard:
    /// the stored row is replaced only by a strictly newer `last_transaction_lt`.
    async fn execute_projection_upsert(
        &self,
        mut query_builder: sqlx::QueryBuilder<'_, sqlx::Postgres>,
        table: &schema::Table,
        method_name: &str,
        address: &str,
    ) -> DbResult<bool> {
        crate::metrics::DATABASE_WRITE_QUERIES
            .with_label_values(&[method_name, table.name])
            .inc();
        query_builder.push(format!(
            "
            ON CONFLICT ({conflict_target}) DO UPDATE SET {update}
            WHERE {table}.last_transaction_lt < EXCLUDED.last_transaction_lt;
            ",
            conflict_target = table.conflict_target(),
            update = table.update_from_excluded(),
            table = table.name,
        ));
        let applied = query_builder.build().execute(&self.pool).await?.rows_affected() > 0;
        if !applied {
            crate::metrics::STALE_PROJECTION_UPDATES
                .with_label_values(&[table.name])
                .inc();
            tracing::debug!(
                target: crate::DATABASE,
                "Skipped stale {} update for {}",
                table.name,
                address
            );
        }
        Ok(applied)
    }

    async fn execute_event_insert(
        &self,
        mut query_builder: sqlx::QueryBuilder<'_, sqlx::Postgres>,
        table: &schema::Table,
        method_name: &str,
    ) -> DbResult<bool> {
        crate::metrics::DATABASE_WRITE_QUERIES
            .with_label_values(&[method_name, table.name])
            .inc();
        query_builder.push(format!(
            " ON CONFLICT ({}) DO NOTHING;",
            table.conflict_target()
        ));
        Ok(query_builder.build().execute(&self.pool).await?.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl crate::ContractIndexerDbManager for PostgresDBManager {
    async fn upsert_jetton_wallet(&self, wallet: &JettonWallet) -> DbResult<bool> {
        wallet.validate()?;
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(schema::JETTON_WALLETS.insert_statement());
        query_builder.push_values(std::iter::once(wallet), |mut values, wallet| {
            values
                .push_bind(&wallet.address)
                .push_bind(&wallet.balance)
                .push_bind(&wallet.owner)
                .push_bind(&wallet.jetton)
                .push_bind(wallet.last_transaction_lt)
                .push_bind(&wallet.code_hash)
                .push_bind(&wallet.data_hash);
        });
        self.execute_projection_upsert(
            query_builder,
            &schema::JETTON_WALLETS,
            "upsert_jetton_wallet",
            &wallet.address,
        )
        .await
    }

    async fn upsert_jetton_master(&self, master: &JettonMaster) -> DbResult<bool> {
        master.validate()?;
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(schema::JETTON_MASTERS.insert_statement());
        query_builder.push_values(std::iter::once(master), |mut values, master| {
            values
                .push_bind(&master.address)
                .push_bind(&master.total_supply)
                .push_bind(master.mintable)
                .push_bind(&master.admin_address)
                .push_bind(&master.jetton_content)
                .push_bind(&master.jetton_wallet_code_hash)
                .push_bind(&master.code_hash)
                .push_bind(&master.data_hash)
                .push_bind(master.last_transaction_lt)
                .push_bind(&master.code_boc)
                .push_bind(&master.data_boc);
        });
        self.execute_projection_upsert(
            query_builder,
            &schema::JETTON_MASTERS,
            "upsert_jetton_master",
            &master.address,
        )
        .await
    }

    async fn upsert_nft_collection(&self, collection: &NftCollection) -> DbResult<bool> {
        collection.validate()?;
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(schema::NFT_COLLECTIONS.insert_statement());
        query_builder.push_values(std::iter::once(collection), |mut values, collection| {
            values
                .push_bind(&collection.address)
                .push_bind(&collection.next_item_index)
                .push_bind(&collection.owner_address)
                .push_bind(&collection.collection_content)
                .push_bind(&collection.data_hash)
                .push_bind(&collection.code_hash)
                .push_bind(collection.last_transaction_lt)
                .push_bind(&collection.code_boc)
                .push_bind(&collection.data_boc);
        });
        self.execute_projection_upsert(
            query_builder,
            &schema::NFT_COLLECTIONS,
            "upsert_nft_collection",
            &collection.address,
        )
        .await
    }

    async fn upsert_nft_item(&self, item: &NftItem) -> DbResult<bool> {
        item.validate()?;
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(schema::NFT_ITEMS.insert_statement());
        query_builder.push_values(std::iter::once(item), |mut values, item| {
            values
                .push_bind(&item.address)
                .push_bind(item.init)
                .push_bind(&item.index)
                .push_bind(&item.collection_address)
                .push_bind(&item.owner_address)
                .push_bind(&item.content)
                .push_bind(item.last_transaction_lt)
                .push_bind(&item.code_hash)
                .push_bind(&item.data_hash);
        });
        self.execute_projection_upsert(
            query_builder,
            &schema::NFT_ITEMS,
            "upsert_nft_item",
            &item.address,
        )
        .await
    }

    async fn save_jetton_transfer(&self, transfer: &JettonTransfer) -> DbResult<bool> {
        transfer.validate()?;
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(schema::JETTON_TRANSFERS.insert_statement());
        query_builder.push_values(std::iter::once(transfer), |mut values, transfer| {
            values
                .push_bind(&transfer.transaction_hash)
                .push_bind(&transfer.query_id)
                .push_bind(&transfer.amount)
                .push_bind(&transfer.destination)
                .push_bind(&transfer.response_destination)
                .push_bind(&transfer.custom_payload)
                .push_bind(&transfer.forward_ton_amount)
                .push_bind(&transfer.forward_payload);
        });
        self.execute_event_insert(
            query_builder,
            &schema::JETTON_TRANSFERS,
            "save_jetton_transfer",
        )
        .await
    }

    async fn save_jetton_burn(&self, burn: &JettonBurn) -> DbResult<bool> {
        burn.validate()?;
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(schema::JETTON_BURNS.insert_statement());
        query_builder.push_values(std::iter::once(burn), |mut values, burn| {
            values
                .push_bind(&burn.transaction_hash)
                .push_bind(&burn.query_id)
                .push_bind(&burn.amount)
                .push_bind(&burn.response_destination)
                .push_bind(&burn.custom_payload);
        });
        self.execute_event_insert(query_builder, &schema::JETTON_BURNS, "save_jetton_burn")
            .await
    }

    async fn save_nft_transfer(&self, transfer: &NftTransfer) -> DbResult<bool> {
        transfer.validate()?;
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(schema::NFT_TRANSFERS.insert_statement());
        query_builder.push_values(std::iter::once(transfer), |mut values, transfer| {
            values
                .push_bind(&transfer.transaction_hash)
                .push_bind(&transfer.query_id)
                .push_bind(&transfer.nft_item)
                .push_bind(&transfer.old_owner)
                .push_bind(&transfer.new_owner)
                .push_bind(&transfer.response_destination)
                .push_bind(&transfer.custom_payload)
                .push_bind(&transfer.forward_amount)
                .push_bind(&transfer.forward_payload);
        });
        self.execute_event_insert(query_builder, &schema::NFT_TRANSFERS, "save_nft_transfer")
            .await
    }

    async fn save_code_hash_interfaces(&self, code_hash: &CodeHashInterfaces) -> DbResult<()> {
        code_hash.validate()?;
        crate::metrics::DATABASE_WRITE_QUERIES
            .with_label_values(&["save_code_hash_interfaces", schema::CODE_HASH.name])
            .inc();
        let interfaces: Vec<String> = code_hash
            .interfaces()
            .iter()
            .map(|interface| interface.as_str().to_string())
            .collect();
        sqlx::query(&format!(
            "
            INSERT INTO code_hash (code_hash, interfaces)
            VALUES ($1, $2::{}[])
            ON CONFLICT (code_hash) DO UPDATE SET interfaces = EXCLUDED.interfaces;
            ",
            types::INTERFACE_NAME
        ))
        .bind(&code_hash.code_hash)
        .bind(interfaces)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

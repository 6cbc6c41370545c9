use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::validation::{
    validate_hash, validate_non_negative, validate_not_empty, validate_optional_hash,
};
use crate::{InterfaceName, Validate, ValidationError};

/// Interfaces a contract code hash was classified with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCodeHashInterfaces")]
pub struct CodeHashInterfaces {
    pub code_hash: String,
    interfaces: Vec<InterfaceName>,
}

#[derive(Deserialize)]
struct RawCodeHashInterfaces {
    code_hash: String,
    interfaces: Vec<InterfaceName>,
}

impl From<RawCodeHashInterfaces> for CodeHashInterfaces {
    fn from(raw: RawCodeHashInterfaces) -> Self {
        Self::new(raw.code_hash, raw.interfaces)
    }
}

impl CodeHashInterfaces {
    pub fn new(
        code_hash: impl Into<String>,
        interfaces: impl IntoIterator<Item = InterfaceName>,
    ) -> Self {
        let mut interfaces: Vec<_> = interfaces.into_iter().collect();
        interfaces.sort();
        interfaces.dedup();
        Self {
            code_hash: code_hash.into(),
            interfaces,
        }
    }

    pub fn interfaces(&self) -> &[InterfaceName] {
        &self.interfaces
    }

    pub fn implements(&self, interface: InterfaceName) -> bool {
        self.interfaces.binary_search(&interface).is_ok()
    }
}

impl Validate for CodeHashInterfaces {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("code_hash", &self.code_hash)
    }
}

/// Mutable view of a contract, updated by address under the lt watermark
pub trait Projection {
    fn address(&self) -> &str;

    fn last_transaction_lt(&self) -> i64;

    /// An update is applied only over nothing or over an older watermark
    fn supersedes(&self, stored_lt: Option<i64>) -> bool {
        stored_lt.map_or(true, |stored_lt| self.last_transaction_lt() > stored_lt)
    }
}

macro_rules! impl_projection {
    ($($ty:ty),+) => {
        $(
            impl Projection for $ty {
                fn address(&self) -> &str {
                    &self.address
                }

                fn last_transaction_lt(&self) -> i64 {
                    self.last_transaction_lt
                }
            }
        )+
    };
}

impl_projection!(JettonWallet, JettonMaster, NftCollection, NftItem);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JettonWallet {
    pub address: String,
    pub balance: BigDecimal,
    pub owner: String,
    pub jetton: String,
    pub last_transaction_lt: i64,
    pub code_hash: Option<String>,
    pub data_hash: Option<String>,
}

impl Validate for JettonWallet {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("address", &self.address)?;
        validate_non_negative("balance", &self.balance)?;
        validate_optional_hash("code_hash", self.code_hash.as_deref())?;
        validate_optional_hash("data_hash", self.data_hash.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JettonMaster {
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

impl Validate for JettonMaster {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("address", &self.address)?;
        validate_non_negative("total_supply", &self.total_supply)?;
        validate_optional_hash(
            "jetton_wallet_code_hash",
            self.jetton_wallet_code_hash.as_deref(),
        )?;
        validate_optional_hash("code_hash", self.code_hash.as_deref())?;
        validate_optional_hash("data_hash", self.data_hash.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftCollection {
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

impl Validate for NftCollection {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("address", &self.address)?;
        validate_non_negative("next_item_index", &self.next_item_index)?;
        validate_optional_hash("code_hash", self.code_hash.as_deref())?;
        validate_optional_hash("data_hash", self.data_hash.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftItem {
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

impl Validate for NftItem {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("address", &self.address)?;
        validate_non_negative("index", &self.index)?;
        validate_optional_hash("code_hash", self.code_hash.as_deref())?;
        validate_optional_hash("data_hash", self.data_hash.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JettonTransfer {
    pub transaction_hash: String,
    pub query_id: BigDecimal,
    pub amount: BigDecimal,
    pub destination: String,
    pub response_destination: Option<String>,
    pub custom_payload: Option<String>,
    pub forward_ton_amount: Option<BigDecimal>,
    pub forward_payload: Option<String>,
}

impl Validate for JettonTransfer {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("transaction_hash", &self.transaction_hash)?;
        validate_non_negative("query_id", &self.query_id)?;
        validate_non_negative("amount", &self.amount)?;
        if let Some(forward_ton_amount) = &self.forward_ton_amount {
            validate_non_negative("forward_ton_amount", forward_ton_amount)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JettonBurn {
    pub transaction_hash: String,
    pub query_id: BigDecimal,
    pub amount: BigDecimal,
    pub response_destination: Option<String>,
    pub custom_payload: Option<String>,
}

impl Validate for JettonBurn {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("transaction_hash", &self.transaction_hash)?;
        validate_non_negative("query_id", &self.query_id)?;
        validate_non_negative("amount", &self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftTransfer {
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

impl Validate for NftTransfer {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_hash("transaction_hash", &self.transaction_hash)?;
        validate_not_empty("nft_item", &self.nft_item)?;
        validate_non_negative("query_id", &self.query_id)?;
        if let Some(forward_amount) = &self.forward_amount {
            validate_non_negative("forward_amount", forward_amount)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(lt: i64, balance: i64) -> JettonWallet {
        JettonWallet {
            address: "0:wallet".to_string(),
            balance: BigDecimal::from(balance),
            owner: "0:owner".to_string(),
            jetton: "0:master".to_string(),
            last_transaction_lt: lt,
            code_hash: None,
            data_hash: None,
        }
    }

    #[test]
    fn watermark_requires_strictly_newer_lt() {
        let update = wallet(500, 10);
        assert!(update.supersedes(None));
        assert!(update.supersedes(Some(499)));
        assert!(!update.supersedes(Some(500)));
        assert!(!update.supersedes(Some(600)));
    }

    #[test]
    fn interfaces_are_a_sorted_set() {
        let classified = CodeHashInterfaces::new(
            format!("{:0>43}=", 1),
            [
                InterfaceName::NftItem,
                InterfaceName::NftEditable,
                InterfaceName::NftItem,
            ],
        );
        assert_eq!(
            classified.interfaces(),
            &[InterfaceName::NftItem, InterfaceName::NftEditable]
        );
        assert!(classified.implements(InterfaceName::NftEditable));
        assert!(!classified.implements(InterfaceName::JettonWallet));
    }

    #[test]
    fn deserialized_interfaces_are_a_sorted_set() {
        let classified: CodeHashInterfaces = serde_json::from_str(
            r#"{"code_hash":"abc=","interfaces":["auction","jetton_wallet","nft_item","auction"]}"#,
        )
        .unwrap();
        assert!(classified.implements(InterfaceName::NftItem));
        assert!(classified.implements(InterfaceName::Auction));
        assert_eq!(
            classified,
            CodeHashInterfaces::new(
                "abc=",
                [
                    InterfaceName::Auction,
                    InterfaceName::JettonWallet,
                    InterfaceName::NftItem,
                ],
            )
        );
    }

    #[test]
    fn amounts_beyond_u64_are_kept_exact() {
        let huge: BigDecimal = "340282366920938463463374607431768211455".parse().unwrap();
        let mut w = wallet(1, 0);
        w.balance = huge.clone();
        assert!(w.validate().is_ok());
        assert_eq!(w.balance, huge);
        w.balance = BigDecimal::from(-5);
        assert!(w.validate().is_err());
    }
}

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Declares a closed set of labels. Parsing anything outside the set fails
/// with [`ValidationError::UnknownVariant`] instead of being coerced.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(ValidationError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    TransactionType, "transaction type" {
        Storage => "trans_storage",
        Ordinary => "trans_ord",
        TickTock => "trans_tick_tock",
        SplitPrepare => "trans_split_prepare",
        SplitInstall => "trans_split_install",
        MergePrepare => "trans_merge_prepare",
        MergeInstall => "trans_merge_install",
    }
}

impl TransactionType {
    pub const fn has_compute_phase(&self) -> bool {
        matches!(
            self,
            Self::Ordinary | Self::TickTock | Self::SplitPrepare | Self::MergeInstall
        )
    }

    pub const fn has_action_phase(&self) -> bool {
        // Same set of transaction kinds as the compute phase
        self.has_compute_phase()
    }
}

closed_enum! {
    ComputeSkipReason, "compute skip reason" {
        NoState => "cskip_no_state",
        BadState => "cskip_bad_state",
        NoGas => "cskip_no_gas",
    }
}

closed_enum! {
    AccountStatus, "account status" {
        Uninit => "uninit",
        Frozen => "frozen",
        Active => "active",
    }
}

closed_enum! {
    MessageDirection, "message direction" {
        In => "in",
        Out => "out",
    }
}

closed_enum! {
    /// Contract interfaces recognized by code analysis
    InterfaceName, "interface name" {
        NftItem => "nft_item",
        NftEditable => "nft_editable",
        NftCollection => "nft_collection",
        NftRoyalty => "nft_royalty",
        JettonWallet => "jetton_wallet",
        JettonMaster => "jetton_master",
        Domain => "domain",
        Subscription => "subscription",
        Auction => "auction",
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for ty in TransactionType::ALL {
            assert_eq!(TransactionType::from_str(ty.as_str()).unwrap(), *ty);
        }
        for name in InterfaceName::ALL {
            assert_eq!(name.to_string().parse::<InterfaceName>().unwrap(), *name);
        }
    }

    #[test]
    fn unknown_labels_are_rejected() {
        assert_eq!(
            "trans_unknown".parse::<TransactionType>(),
            Err(ValidationError::UnknownVariant {
                kind: "transaction type",
                value: "trans_unknown".to_string(),
            })
        );
        assert!("ACTIVE".parse::<AccountStatus>().is_err());
        assert!("inbound".parse::<MessageDirection>().is_err());
        assert!("cskip_other".parse::<ComputeSkipReason>().is_err());
        assert!("nft".parse::<InterfaceName>().is_err());
    }

    #[test]
    fn serde_uses_storage_labels() {
        assert_eq!(
            serde_json::to_string(&TransactionType::TickTock).unwrap(),
            "\"trans_tick_tock\""
        );
        assert!(serde_json::from_str::<AccountStatus>("\"deleted\"").is_err());
    }

    #[test]
    fn storage_transactions_have_no_phases() {
        assert!(!TransactionType::Storage.has_compute_phase());
        assert!(!TransactionType::SplitInstall.has_action_phase());
        assert!(TransactionType::Ordinary.has_compute_phase());
        assert!(TransactionType::MergeInstall.has_action_phase());
    }
}

use alloy_primitives::U64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub starting_block: U64,
    pub current_block: U64,
    pub highest_block: U64,
}

/// `eth_syncing` answers `false` once the node has caught up, or a progress object otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EthSyncing {
    Syncing(SyncProgress),
    NotSyncing(bool),
}

impl EthSyncing {
    pub fn is_syncing(&self) -> bool {
        match self {
            EthSyncing::Syncing(_) => true,
            EthSyncing::NotSyncing(syncing) => *syncing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eth_syncing_false() {
        let syncing: EthSyncing = serde_json::from_str("false").unwrap();
        assert!(!syncing.is_syncing());
    }

    #[test]
    fn test_eth_syncing_progress() {
        let syncing: EthSyncing = serde_json::from_str(
            r#"{"startingBlock":"0x0","currentBlock":"0x10","highestBlock":"0x20"}"#,
        )
        .unwrap();
        assert!(syncing.is_syncing());
    }
}

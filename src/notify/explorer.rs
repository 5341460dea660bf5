//! Block explorer links per chain

use crate::types::{ChainId, TxHash};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Default explorers for the networks the protocol is deployed on
static DEFAULT_EXPLORERS: Lazy<HashMap<ChainId, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (1, "https://etherscan.io"),
        (10, "https://optimistic.etherscan.io"),
        (56, "https://bscscan.com"),
        (100, "https://gnosisscan.io"),
        (137, "https://polygonscan.com"),
        (250, "https://ftmscan.com"),
        (8453, "https://basescan.org"),
        (42161, "https://arbiscan.io"),
        (43114, "https://snowtrace.io"),
    ])
});

/// Explorer base URLs, configured entries override the defaults
#[derive(Debug, Clone, Default)]
pub struct Explorers {
    overrides: HashMap<ChainId, String>,
}

impl Explorers {
    pub fn new(overrides: HashMap<ChainId, String>) -> Self {
        Self { overrides }
    }

    pub fn base_url(&self, chain_id: ChainId) -> Option<&str> {
        self.overrides
            .get(&chain_id)
            .map(|s| s.as_str())
            .or_else(|| DEFAULT_EXPLORERS.get(&chain_id).copied())
    }

    pub fn tx_url(&self, chain_id: ChainId, hash: &TxHash) -> Option<String> {
        self.base_url(chain_id)
            .map(|base| format!("{}/tx/{:?}", base.trim_end_matches('/'), hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    #[test]
    fn test_default_and_override() {
        let explorers = Explorers::new(HashMap::from([(10, "https://explorer.example/".to_string())]));
        let hash = B256::repeat_byte(0x01);

        let url = explorers.tx_url(137, &hash).unwrap();
        assert!(url.starts_with("https://polygonscan.com/tx/0x0101"));

        let url = explorers.tx_url(10, &hash).unwrap();
        assert!(url.starts_with("https://explorer.example/tx/0x0101"));

        assert_eq!(explorers.tx_url(31337, &hash), None);
    }
}

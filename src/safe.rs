//! Safe transaction service client
//!
//! When running as a Safe app the submitted hash is the Safe's internal
//! `safeTxHash`; the on-chain hash only exists once the multisig executes.

use crate::error::{TrackerError, TrackerResult};
use crate::services::SafeService;
use crate::types::{ChainId, TxHash};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultisigTransaction {
    transaction_hash: Option<String>,
}

/// Safe transaction service endpoints per chain
pub struct SafeTxService {
    endpoints: HashMap<ChainId, String>,
    client: reqwest::Client,
}

impl SafeTxService {
    pub fn new(endpoints: HashMap<ChainId, String>) -> Self {
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|(chain_id, url)| (chain_id, url.trim_end_matches('/').to_string()))
                .collect(),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    fn url(&self, safe_tx_hash: &TxHash, chain_id: ChainId) -> TrackerResult<String> {
        let base = self.endpoints.get(&chain_id).ok_or(TrackerError::UnknownChain(chain_id))?;
        Ok(format!("{}/api/v1/multisig-transactions/{:?}/", base, safe_tx_hash))
    }
}

#[async_trait]
impl SafeService for SafeTxService {
    async fn hash_from_safe_tx_hash(&self, safe_tx_hash: TxHash, chain_id: ChainId) -> TrackerResult<TxHash> {
        let response = self
            .client
            .get(self.url(&safe_tx_hash, chain_id)?)
            .send()
            .await
            .map_err(|e| TrackerError::transient(chain_id, e))?;
        if !response.status().is_success() {
            return Err(TrackerError::transient(
                chain_id,
                format!("safe service returned {}", response.status()),
            ));
        }
        let tx: MultisigTransaction = response
            .json()
            .await
            .map_err(|e| TrackerError::transient(chain_id, e))?;

        let real = tx
            .transaction_hash
            .ok_or_else(|| TrackerError::transient(chain_id, "safe transaction not executed yet"))?;
        debug!("safeTxHash {:#x} → {}", safe_tx_hash, real);
        real.parse::<TxHash>()
            .map_err(|e| TrackerError::transient(chain_id, format!("bad transaction hash {}: {}", real, e)))
    }
}

//! Node adapter
//!
//! `NodeProvider` over one alloy HTTP provider per configured chain.
//! Transport failures surface as `TrackerError::TransientFetch` so the engine
//! leaves the record untouched and retries on a later block.

use crate::error::{TrackerError, TrackerResult};
use crate::services::NodeProvider;
use crate::types::{ChainId, NodeTransaction, TxHash, TxReceipt};
use alloy::network::{Ethereum, TransactionResponse};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

pub type HttpProvider = RootProvider<Ethereum>;

#[derive(Clone, Default)]
pub struct AlloyNode {
    providers: HashMap<ChainId, HttpProvider>,
}

impl AlloyNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the RPC endpoint for `chain_id`
    pub fn add_chain(&mut self, chain_id: ChainId, rpc_url: &str) -> TrackerResult<()> {
        let url = Url::parse(rpc_url).map_err(|e| TrackerError::InvalidEndpoint {
            chain_id,
            message: format!("{}: {}", rpc_url, e),
        })?;
        self.providers.insert(chain_id, RootProvider::new_http(url));
        info!("Chain {} → {}", chain_id, rpc_url);
        Ok(())
    }

    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.providers.keys().copied().collect();
        chains.sort_unstable();
        chains
    }

    fn provider(&self, chain_id: ChainId) -> TrackerResult<&HttpProvider> {
        self.providers.get(&chain_id).ok_or(TrackerError::UnknownChain(chain_id))
    }
}

/// Keep what the tracker persists; gas values as decimal strings
fn to_tx_receipt(rcpt: TransactionReceipt) -> TxReceipt {
    TxReceipt {
        transaction_hash: rcpt.transaction_hash,
        block_number: rcpt.block_number.unwrap_or_default(),
        block_hash: rcpt.block_hash,
        status: u8::from(rcpt.status()),
        from: rcpt.from,
        to: rcpt.to,
        contract_address: rcpt.contract_address,
        transaction_index: rcpt.transaction_index,
        gas_used: rcpt.gas_used.to_string(),
        cumulative_gas_used: rcpt.inner.cumulative_gas_used().to_string(),
        effective_gas_price: rcpt.effective_gas_price.to_string(),
        logs: rcpt.inner.logs().iter().map(|l| l.inner.clone()).collect(),
    }
}

#[async_trait]
impl NodeProvider for AlloyNode {
    async fn get_transaction(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<Option<NodeTransaction>> {
        let tx = self
            .provider(chain_id)?
            .get_transaction_by_hash(hash)
            .await
            .map_err(|e| TrackerError::transient(chain_id, e))?;
        Ok(tx.map(|tx| NodeTransaction {
            hash: tx.tx_hash(),
            from: tx.from(),
            block_number: tx.block_number,
        }))
    }

    async fn get_transaction_receipt(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<Option<TxReceipt>> {
        let rcpt = self
            .provider(chain_id)?
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| TrackerError::transient(chain_id, e))?;
        if rcpt.is_some() {
            debug!("Receipt for {:#x} on chain {}", hash, chain_id);
        }
        Ok(rcpt.map(to_tx_receipt))
    }

    async fn get_block_number(&self, chain_id: ChainId) -> TrackerResult<u64> {
        self.provider(chain_id)?
            .get_block_number()
            .await
            .map_err(|e| TrackerError::transient(chain_id, e))
    }
}

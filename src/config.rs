//! TOML Configuration
//!
//! Tracker settings, wallet and per-chain endpoints. `.env` values override
//! the wallet account (WALLET_ACCOUNT); DISCORD_WEBHOOK is read by the sink.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use crate::types::ChainId;
use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Top-level TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(rename = "chain", default)]
    pub chains: Vec<ChainConfig>,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    #[serde(default = "default_block_poll_interval")]
    pub block_poll_interval_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            snapshot_file: default_snapshot_file(),
            block_poll_interval_ms: default_block_poll_interval(),
            log_level: default_log_level(),
        }
    }
}

fn default_snapshot_file() -> String { "data/transactions.json".to_string() }
fn default_block_poll_interval() -> u64 { 4000 }
fn default_log_level() -> String { "info".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Connected account; polling is suspended while unset
    pub account: Option<String>,
    /// Submission hashes are Safe tx hashes
    #[serde(default)]
    pub safe_app: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
    /// DCA hub contracts; Deposited events from other emitters are ignored
    #[serde(default)]
    pub hubs: Vec<String>,
    /// Safe transaction service base URL (safe_app only)
    pub safe_tx_service: Option<String>,
}

impl TrackerConfig {
    /// Load configuration from a TOML file, then apply `.env` overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenv::dotenv().ok();

        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config = Self::parse(&content)?;
        if let Ok(account) = std::env::var("WALLET_ACCOUNT") {
            if !account.is_empty() {
                config.wallet.account = Some(account);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    pub fn validate(&self) -> Result<()> {
        if self.chains.is_empty() {
            bail!("No [[chain]] entries configured");
        }
        if self.general.block_poll_interval_ms == 0 {
            bail!("block_poll_interval_ms must be greater than 0");
        }
        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.chain_id) {
                bail!("Duplicate [[chain]] entry for chain_id {}", chain.chain_id);
            }
        }
        self.account()?;
        self.hubs()?;
        Ok(())
    }

    pub fn account(&self) -> Result<Option<Address>> {
        self.wallet
            .account
            .as_deref()
            .map(|a| a.parse::<Address>().with_context(|| format!("Invalid wallet account: {}", a)))
            .transpose()
    }

    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.chains.iter().map(|c| c.chain_id).collect()
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    pub fn explorer_overrides(&self) -> HashMap<ChainId, String> {
        self.chains
            .iter()
            .filter_map(|c| c.explorer_url.clone().map(|url| (c.chain_id, url)))
            .collect()
    }

    pub fn hubs(&self) -> Result<HashMap<ChainId, Vec<Address>>> {
        let mut hubs = HashMap::new();
        for chain in self.chains.iter().filter(|c| !c.hubs.is_empty()) {
            let addresses = chain
                .hubs
                .iter()
                .map(|h| {
                    h.parse::<Address>()
                        .with_context(|| format!("Invalid hub address {} for chain {}", h, chain.chain_id))
                })
                .collect::<Result<Vec<_>>>()?;
            hubs.insert(chain.chain_id, addresses);
        }
        Ok(hubs)
    }

    pub fn safe_endpoints(&self) -> HashMap<ChainId, String> {
        self.chains
            .iter()
            .filter_map(|c| c.safe_tx_service.clone().map(|url| (c.chain_id, url)))
            .collect()
    }
}

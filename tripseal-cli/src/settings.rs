// Runtime settings: tripseal.toml merged with TRIPSEAL_* environment variables

use alloy::primitives::Address;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use tripseal_core::VaultSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub vault: VaultSettings,

    #[serde(default)]
    pub chain: ChainSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSettings {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_contract")]
    pub contract: Address,
    /// JSON-RPC endpoint for `tripseal trips`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            contract: default_contract(),
            rpc_url: None,
        }
    }
}

fn default_chain_id() -> u64 {
    tripseal_core::engine::backends::mock::MOCK_CHAIN_ID
}
fn default_contract() -> Address {
    Address::repeat_byte(0x7a)
}

impl Settings {
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("tripseal.toml"))
            .merge(Env::prefixed("TRIPSEAL_").split("__"))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let settings: Settings = figment.extract()?;
        Ok(settings)
    }
}

//! Chain configuration.

use crate::constants::{MAINNET_GRPC_URI, TESTNET_GRPC_URI};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection and fee parameters for one chain.
///
/// A plain value passed to every component that needs it at construction
/// time. Nothing here is process-global, so clients for several chains or
/// identities can coexist in one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// gRPC endpoint, `host:port`.
    pub endpoint: String,
    /// Whether to connect over TLS.
    pub tls: bool,
    /// Bech32 prefix for account addresses.
    pub address_prefix: String,
    /// Bech32 prefix for public keys.
    pub public_prefix: String,
    /// BIP-44 coin type used for key derivation.
    pub coin_type: u32,
    /// Chain identifier carried in signed transactions.
    pub chain_id: String,
    /// Gas price in the fee denomination, per unit of gas.
    pub gas_price: u64,
    /// Fee denomination.
    pub denom: String,
}

impl ChainConfig {
    /// Configuration for Provenance mainnet.
    pub fn mainnet() -> Self {
        Self {
            endpoint: MAINNET_GRPC_URI.to_string(),
            tls: true,
            address_prefix: "pb".to_string(),
            public_prefix: "pbpub".to_string(),
            coin_type: 505,
            chain_id: "pio-mainnet-1".to_string(),
            gas_price: 1,
            denom: "nhash".to_string(),
        }
    }

    /// Configuration for Provenance testnet.
    pub fn testnet() -> Self {
        Self {
            endpoint: TESTNET_GRPC_URI.to_string(),
            tls: true,
            address_prefix: "tp".to_string(),
            public_prefix: "tppub".to_string(),
            coin_type: 1,
            chain_id: "pio-testnet-1".to_string(),
            gas_price: 1,
            denom: "nhash".to_string(),
        }
    }

    /// Points the configuration at a different node.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Disables TLS, for local nodes.
    pub fn insecure(mut self) -> Self {
        self.tls = false;
        self
    }

    /// Loads a configuration from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("reading config {}", path.as_ref().display()))?;
        serde_json::from_str(&contents).wrap_err("parsing config")
    }

    /// Writes the configuration to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .wrap_err_with(|| format!("writing config {}", path.as_ref().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let config = ChainConfig::testnet().with_endpoint("localhost:9090").insecure();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ChainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert!(!parsed.tls);
        assert_eq!(parsed.endpoint, "localhost:9090");
    }

    #[test]
    fn networks_use_distinct_prefixes() {
        assert_eq!(ChainConfig::mainnet().address_prefix, "pb");
        assert_eq!(ChainConfig::testnet().address_prefix, "tp");
        assert_ne!(ChainConfig::mainnet().chain_id, ChainConfig::testnet().chain_id);
    }
}

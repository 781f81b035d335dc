/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{collections::HashMap, fmt, fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use fhedex::{
    eth::{types::parse_address_str, Address},
    Error, Result,
};

/// Default receipt polling interval in milliseconds
const DEFAULT_POLL_INTERVAL: u64 = 1000;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL
}

/// Parameters of the Iceberg hook pool on a network
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PoolConfig {
    /// Uniswap v4 pool ID, `0x`-prefixed 32 bytes
    pub pool_id: String,
    pub fee: u32,
    pub tick_spacing: i32,
}

/// Per-network settings, read from a `[network_config."<name>"]` table
#[derive(Clone, Deserialize)]
pub struct NetworkConfig {
    /// Chain JSON-RPC endpoint
    pub endpoint: Url,

    /// Whether the network is a local development chain
    #[serde(default)]
    pub local: bool,

    /// Faucet endpoint, only used on local networks
    #[serde(default)]
    pub faucet: Option<Url>,

    /// Where users can fund accounts on non-local networks
    #[serde(default)]
    pub funding_url: Option<String>,

    /// FHE encryption service endpoint
    pub fhe_endpoint: Url,

    /// Hex encoded signer keys, taking precedence over node accounts
    #[serde(default)]
    pub signer_keys: Vec<String>,

    /// Receipt polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Contract name to address table
    #[serde(default)]
    pub contracts: HashMap<String, String>,

    #[serde(default)]
    pub pool: Option<PoolConfig>,
}

impl NetworkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    /// Look up a contract address by its table name.
    pub fn contract_address(&self, name: &str) -> Result<Address> {
        let Some(addr) = self.contracts.get(name) else {
            return Err(Error::ConfigurationError(format!(
                "Contract \"{name}\" has no address configured for this network"
            )))
        };

        parse_address_str(addr).map_err(|_| {
            Error::ConfigurationError(format!("Contract \"{name}\" has an invalid address {addr}"))
        })
    }

    pub fn pool(&self) -> Result<&PoolConfig> {
        self.pool.as_ref().ok_or_else(|| {
            Error::ConfigurationError("No Iceberg pool configured for this network".to_string())
        })
    }
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the number of keys is printed
        f.debug_struct("NetworkConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("local", &self.local)
            .field("faucet", &self.faucet.as_ref().map(Url::as_str))
            .field("funding_url", &self.funding_url)
            .field("fhe_endpoint", &self.fhe_endpoint.as_str())
            .field("signer_keys", &format_args!("<{} redacted>", self.signer_keys.len()))
            .field("poll_interval", &self.poll_interval)
            .field("contracts", &self.contracts)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Auxiliary function to parse the configuration file contents and
/// extract the requested network config.
pub fn parse_network_config(contents: &str, network: &str) -> Result<NetworkConfig> {
    let contents: toml::Value = match toml::from_str(contents) {
        Ok(v) => v,
        Err(e) => {
            error!(target: "fdx::config", "Failed parsing TOML config: {e}");
            return Err(Error::ParseFailed("Failed parsing TOML config"))
        }
    };

    let Some(table) = contents.as_table() else { return Err(Error::ParseFailed("TOML not a map")) };

    let Some(network_configs) = table.get("network_config") else {
        return Err(Error::ParseFailed("TOML does not contain network configurations"))
    };

    let Some(network_configs) = network_configs.as_table() else {
        return Err(Error::ParseFailed("`network_config` not a map"))
    };

    let Some(network_config) = network_configs.get(network) else {
        return Err(Error::NetworkNotConfigured(network.to_string()))
    };

    let config: NetworkConfig = network_config.clone().try_into()?;
    debug!(target: "fdx::config", "Loaded configuration for network \"{network}\": {config:?}");

    Ok(config)
}

/// Read the configuration file at `path` and extract `network`.
pub fn load_network_config(path: &Path, network: &str) -> Result<NetworkConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::ConfigurationError(format!("Failed to read the configuration file {path:?}: {e}"))
    })?;

    parse_network_config(&contents, network)
}

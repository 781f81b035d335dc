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

use std::sync::Arc;

use fhedex::{
    eth::{ChainClient, EthRpcClient},
    faucet::{Faucet, HttpFaucet},
    fhe::{FheClient, FheRpcClient},
};

/// Network configuration
pub mod config;
use config::NetworkConfig;

/// Signer resolution
pub mod signer;

/// Funding guard
pub mod funding;

/// Parameter encryption
pub mod encrypt;

/// Contract handles and invocation
pub mod contract;

/// Result formatting and unsealing
pub mod report;

/// Task registry and dispatcher
pub mod registry;

/// Task implementations
pub mod tasks;

/// CLI-util structure
pub struct Fdx {
    /// Name of the active network
    pub network_name: String,
    /// Active network configuration
    pub network: NetworkConfig,
    /// Chain node client
    pub chain: Arc<dyn ChainClient>,
    /// FHE encryption service client
    pub fhe: Arc<dyn FheClient>,
    /// Faucet client, configured on local networks only
    pub faucet: Option<Arc<dyn Faucet>>,
}

impl Fdx {
    /// Build the clients described by `network`.
    pub fn new(network_name: &str, network: NetworkConfig) -> Self {
        let chain = Arc::new(EthRpcClient::new(network.endpoint.clone(), network.poll_interval()));
        let fhe = Arc::new(FheRpcClient::new(network.fhe_endpoint.clone()));

        let faucet: Option<Arc<dyn Faucet>> = match (&network.faucet, network.local) {
            (Some(url), true) => Some(Arc::new(HttpFaucet::new(url.clone()))),
            _ => None,
        };

        Self::with_clients(network_name, network, chain, fhe, faucet)
    }

    /// Assemble an instance over already constructed clients.
    pub fn with_clients(
        network_name: &str,
        network: NetworkConfig,
        chain: Arc<dyn ChainClient>,
        fhe: Arc<dyn FheClient>,
        faucet: Option<Arc<dyn Faucet>>,
    ) -> Self {
        Self { network_name: network_name.to_string(), network, chain, fhe, faucet }
    }
}

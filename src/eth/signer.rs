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

use std::{fmt, str::FromStr};

use ethers::{
    signers::{LocalWallet, Signer as _},
    types::Address,
};

use crate::{Error, Result};

/// Account credential used to sign the transactions of a single task
/// invocation.
#[derive(Clone)]
pub enum Signer {
    /// Locally held secp256k1 key; transactions are signed here and
    /// submitted raw.
    Local(LocalWallet),
    /// Account unlocked on the node; transactions are signed node-side
    /// through `eth_sendTransaction`.
    Node(Address),
}

impl Signer {
    /// Build a local signer from a hex encoded private key, bound to the
    /// given chain ID for EIP-155 replay protection.
    pub fn from_private_key(key: &str, chain_id: u64) -> Result<Self> {
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let wallet = LocalWallet::from_str(key)
            .map_err(|e| Error::ConfigurationError(format!("Invalid signer key: {e}")))?;
        Ok(Self::Local(wallet.with_chain_id(chain_id)))
    }

    pub fn address(&self) -> Address {
        match self {
            Self::Local(wallet) => wallet.address(),
            Self::Node(address) => *address,
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        match self {
            Self::Local(w) => write!(f, "Signer::Local({:#x})", w.address()),
            Self::Node(a) => write!(f, "Signer::Node({a:#x})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known first development account of hardhat/anvil
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn local_signer_derives_address() {
        let signer = Signer::from_private_key(DEV_KEY, 412346).unwrap();
        assert_eq!(
            format!("{:#x}", signer.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert!(!format!("{signer:?}").contains("ac0974"));
    }

    #[test]
    fn bad_key_is_a_configuration_error() {
        assert!(matches!(
            Signer::from_private_key("0x1234", 1),
            Err(Error::ConfigurationError(_))
        ));
    }
}

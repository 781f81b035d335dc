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

use tracing::debug;

use fhedex::{eth::Signer, Error, Result};

use crate::Fdx;

impl Fdx {
    /// Return the signer at `index`. Configured keys take precedence over
    /// the accounts the node has unlocked.
    pub async fn resolve_signer(&self, index: usize) -> Result<Signer> {
        let keys = &self.network.signer_keys;

        if !keys.is_empty() {
            let Some(key) = keys.get(index) else {
                return Err(Error::ConfigurationError(format!(
                    "No signer key at index {index}, {} configured",
                    keys.len()
                )))
            };

            let chain_id = self.chain.chain_id().await?;
            let signer = Signer::from_private_key(key, chain_id)?;
            debug!(target: "fdx::signer", "Using configured signer {signer:?}");
            return Ok(signer)
        }

        let accounts = self.chain.accounts().await?;
        let Some(address) = accounts.get(index) else {
            return Err(Error::ConfigurationError(format!(
                "No signer available at index {index}, node exposes {} account(s)",
                accounts.len()
            )))
        };

        debug!(target: "fdx::signer", "Using node account {address:#x}");
        Ok(Signer::Node(*address))
    }
}

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

use tracing::{info, warn};

use fhedex::{
    eth::{Signer, U256},
    Error, Result,
};

use crate::Fdx;

/// Outcome of a successful funding check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FundingStatus {
    /// The account already holds this native balance
    Funded(U256),
    /// The account was empty and the faucet accepted a request
    Requested,
}

impl Fdx {
    /// Make sure the signer can pay for transactions.
    ///
    /// An empty account on a local network gets a single faucet request,
    /// without polling the balance afterwards. An empty account on any
    /// other network aborts the task with a funding instruction.
    pub async fn ensure_funded(&self, signer: &Signer) -> Result<FundingStatus> {
        let address = signer.address();
        let balance = self.chain.balance(address).await?;

        if !balance.is_zero() {
            return Ok(FundingStatus::Funded(balance))
        }

        if !self.network.local {
            let msg = match &self.network.funding_url {
                Some(url) => format!(
                    "Please fund your account {address:#x} on {} from {url}",
                    self.network_name
                ),
                None => format!("Please fund your account {address:#x} on {}", self.network_name),
            };
            warn!(target: "fdx::funding", "Account {address:#x} has no funds");
            return Err(Error::FundingError(msg))
        }

        let Some(faucet) = &self.faucet else {
            return Err(Error::FundingError(format!(
                "Account {address:#x} is empty and no faucet is configured for {}",
                self.network_name
            )))
        };

        info!(target: "fdx::funding", "Account {address:#x} is empty, requesting faucet funds");
        faucet.request_funds(address).await?;
        Ok(FundingStatus::Requested)
    }
}

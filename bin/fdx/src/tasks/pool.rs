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

use async_trait::async_trait;

use fhedex::{
    eth::{Signer, U256},
    Error, Result,
};

use super::{pool_id_token, token_int, token_uint};
use crate::{
    contract::ContractKind,
    registry::{Task, TaskArgs},
    report::{exchange_rate_report, pool_state_report, TaskOutput},
    Fdx,
};

/// Decoded `getSlot0` reply
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub protocol_fee: u32,
    pub lp_fee: u32,
}

impl Fdx {
    /// Read slot0 of the configured pool through the StateView lens.
    pub async fn slot0(&self) -> Result<Slot0> {
        let state_view = self.contract("state_view", ContractKind::StateView)?;
        let pool_id = pool_id_token(&self.network)?;
        let rep = self.query(None, &state_view, "getSlot0", &[pool_id]).await?;

        let [sqrt, tick, protocol_fee, lp_fee] = rep.as_slice() else {
            return Err(Error::AbiError(format!("getSlot0 returned {} values", rep.len())))
        };

        Ok(Slot0 {
            sqrt_price_x96: token_uint(sqrt, "sqrtPriceX96")?,
            tick: token_int(tick, "tick")?,
            protocol_fee: token_uint(protocol_fee, "protocolFee")?.low_u32(),
            lp_fee: token_uint(lp_fee, "lpFee")?.low_u32(),
        })
    }
}

pub struct GetExchangeRate;

#[async_trait]
impl Task for GetExchangeRate {
    fn name(&self) -> &'static str {
        "get-exchange-rate"
    }

    fn description(&self) -> &'static str {
        "Print the pool's current exchange rate in both directions"
    }

    fn requires_funds(&self) -> bool {
        false
    }

    async fn run(&self, fdx: &Fdx, _signer: &Signer, _args: &TaskArgs) -> Result<TaskOutput> {
        let slot0 = fdx.slot0().await?;
        Ok(TaskOutput::Report(exchange_rate_report(slot0.sqrt_price_x96)?))
    }
}

pub struct GetPoolState;

#[async_trait]
impl Task for GetPoolState {
    fn name(&self) -> &'static str {
        "get-pool-state"
    }

    fn description(&self) -> &'static str {
        "Print slot0 of the configured pool"
    }

    fn requires_funds(&self) -> bool {
        false
    }

    async fn run(&self, fdx: &Fdx, _signer: &Signer, _args: &TaskArgs) -> Result<TaskOutput> {
        let s = fdx.slot0().await?;
        let report = pool_state_report(s.sqrt_price_x96, s.tick, s.protocol_fee, s.lp_fee);
        Ok(TaskOutput::Report(report))
    }
}

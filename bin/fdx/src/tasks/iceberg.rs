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
use ethers::abi::Token;
use tracing::debug;

use fhedex::{
    eth::{Signer, U256},
    fhe::{Encryptable, FheType, SealedOutput},
    Result,
};

use super::{first, int_token, pool_id_token, token_address, token_bools, token_uint};
use crate::{
    contract::{ContractHandle, ContractKind, ReadOutcome},
    registry::{ParamSpec, Task, TaskArgs},
    report::{hook_permissions_report, Report, ReturnValue, TaskOutput},
    Fdx,
};

pub struct GetIcebergPermissions;

#[async_trait]
impl Task for GetIcebergPermissions {
    fn name(&self) -> &'static str {
        "get-iceberg-permissions"
    }

    fn description(&self) -> &'static str {
        "Print the hook permission flags of the Iceberg hook"
    }

    fn requires_funds(&self) -> bool {
        false
    }

    async fn run(&self, fdx: &Fdx, _signer: &Signer, _args: &TaskArgs) -> Result<TaskOutput> {
        let iceberg = fdx.contract("iceberg", ContractKind::Iceberg)?;
        let rep = fdx.query(None, &iceberg, "getHookPermissions", &[]).await?;
        let flags = token_bools(&first(&rep, "getHookPermissions")?, "hook permissions")?;
        Ok(TaskOutput::Report(hook_permissions_report(&flags)?))
    }
}

pub struct PlaceIcebergOrder;

#[async_trait]
impl Task for PlaceIcebergOrder {
    fn name(&self) -> &'static str {
        "place-iceberg-order"
    }

    fn description(&self) -> &'static str {
        "Place an encrypted limit order through the Iceberg hook"
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::required("zero-for-one", "Sell token0 for token1"),
            ParamSpec::required("liquidity", "Order size (uint128)"),
            ParamSpec::required("tick-lower", "Lower tick of the order (int24)"),
        ];
        PARAMS
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput> {
        let zero_for_one = args.bool("zero-for-one")?;
        let liquidity = args.u128("liquidity")?;
        let tick_lower = args.int24("tick-lower")?;

        let iceberg = fdx.contract("iceberg", ContractKind::Iceberg)?;
        let token0 = fdx.network.contract_address("token0")?;
        let token1 = fdx.network.contract_address("token1")?;
        let pool = fdx.network.pool()?;

        let key = Token::Tuple(vec![
            Token::Address(token0),
            Token::Address(token1),
            Token::Uint(U256::from(pool.fee)),
            int_token(pool.tick_spacing),
            Token::Address(iceberg.address),
        ]);

        fdx.initialize_fhe(signer).await?;
        let inputs = fdx
            .encrypt(
                &iceberg,
                &[Encryptable::bool(zero_for_one), Encryptable::uint128(liquidity)],
            )
            .await?;

        let tx = fdx
            .transact(
                signer,
                &iceberg,
                "placeIcebergOrder",
                &[key, int_token(tick_lower), inputs[0].to_token(), inputs[1].to_token()],
            )
            .await?;

        let mut report = Report::new();
        report
            .line("Order placed successfully!")
            .line(format!("Transaction hash : {:#x}", tx.hash));
        Ok(TaskOutput::Report(report))
    }
}

/// Decryption queue state of the configured pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueState {
    pub queue: ContractHandle,
    pub length: U256,
    pub top: U256,
}

impl Fdx {
    /// Resolve the pool's decryption queue and read its head.
    pub async fn read_pool_queue(
        &self,
        iceberg: &ContractHandle,
    ) -> Result<ReadOutcome<QueueState>> {
        let pool_id = pool_id_token(&self.network)?;
        let rep = self.query(None, iceberg, "poolQueue", &[pool_id]).await?;
        let address = token_address(&first(&rep, "poolQueue")?, "queue address")?;

        if address.is_zero() {
            debug!(target: "fdx::tasks::iceberg", "Pool has no decryption queue");
            return Ok(ReadOutcome::Empty)
        }

        let queue = ContractHandle::new("queue", address, ContractKind::Queue);
        let rep = self.query(None, &queue, "length", &[]).await?;
        let length = token_uint(&first(&rep, "length")?, "queue length")?;

        if length.is_zero() {
            return Ok(ReadOutcome::Empty)
        }

        let rep = self.query(None, &queue, "peek", &[]).await?;
        let top = token_uint(&first(&rep, "peek")?, "queue head")?;

        Ok(ReadOutcome::Value(QueueState { queue, length, top }))
    }
}

pub struct GetPoolQueue;

#[async_trait]
impl Task for GetPoolQueue {
    fn name(&self) -> &'static str {
        "get-pool-queue"
    }

    fn description(&self) -> &'static str {
        "Print the head of the pool's decryption queue"
    }

    fn requires_funds(&self) -> bool {
        false
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, _args: &TaskArgs) -> Result<TaskOutput> {
        let iceberg = fdx.contract("iceberg", ContractKind::Iceberg)?;

        let state = match fdx.read_pool_queue(&iceberg).await? {
            ReadOutcome::Value(state) => state,
            ReadOutcome::Empty => return Ok(TaskOutput::Empty("Decryption queue".to_string())),
        };

        // Queued ciphertexts are owned by the hook
        fdx.initialize_fhe(signer).await?;
        let value = ReturnValue::Sealed {
            contract: iceberg.address,
            sealed: SealedOutput::Handle(state.top),
            ty: FheType::Uint128,
        };
        let decrypted = fdx.render(&value).await?;

        let mut report = Report::new();
        report
            .line(format!("Queue        : {:#x}", state.queue.address))
            .line(format!("Length       : {}", state.length))
            .line(format!("Top of Queue : {}", state.top))
            .line(format!("...Decrypted : {decrypted}"));
        Ok(TaskOutput::Report(report))
    }
}

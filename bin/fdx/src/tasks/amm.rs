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
use tracing::info;

use fhedex::{
    eth::Signer,
    fhe::{Encryptable, FheType, SealedOutput},
    Result,
};

use super::{first, token_string};
use crate::{
    contract::ContractKind,
    registry::{ParamSpec, Task, TaskArgs},
    report::{Report, ReturnValue, TaskOutput},
    Fdx,
};

pub struct AddLiquidity;

#[async_trait]
impl Task for AddLiquidity {
    fn name(&self) -> &'static str {
        "add-liquidity"
    }

    fn description(&self) -> &'static str {
        "Add an encrypted amount of both tokens to the AMM"
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] =
            &[ParamSpec::optional("amount", "Amount of each token to add (uint8)", "5")];
        PARAMS
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput> {
        let amount = args.u8("amount")?;
        let amm = fdx.contract("amm", ContractKind::Amm)?;

        let mut report = Report::new();
        report.line(format!(
            "Running addLiquidity({amount}), targeting contract at: {:#x}",
            amm.address
        ));

        fdx.initialize_fhe(signer).await?;
        let inputs =
            fdx.encrypt(&amm, &[Encryptable::uint8(amount), Encryptable::uint8(amount)]).await?;

        let tx = fdx
            .transact(signer, &amm, "addLiquidity", &[inputs[0].to_token(), inputs[1].to_token()])
            .await?;
        info!(target: "fdx::tasks::amm", "Added {amount} liquidity in {:#x}", tx.hash);

        report.line(format!("Transaction hash : {:#x}", tx.hash));
        Ok(TaskOutput::Report(report))
    }
}

pub struct Swap;

#[async_trait]
impl Task for Swap {
    fn name(&self) -> &'static str {
        "swap"
    }

    fn description(&self) -> &'static str {
        "Swap an encrypted amount through the AMM"
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::optional("amount", "Amount to swap in (uint8)", "5"),
            ParamSpec::optional("zero-for-one", "Swap token0 for token1", "true"),
        ];
        PARAMS
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput> {
        let amount = args.u8("amount")?;
        let zero_for_one = args.bool("zero-for-one")?;
        let amm = fdx.contract("amm", ContractKind::Amm)?;

        fdx.initialize_fhe(signer).await?;
        let inputs = fdx.encrypt(&amm, &[Encryptable::uint8(amount)]).await?;

        let tx = fdx
            .transact(signer, &amm, "swap", &[Token::Bool(zero_for_one), inputs[0].to_token()])
            .await?;

        let mut report = Report::new();
        report
            .line(format!("Running swap({amount}, {zero_for_one}) on {:#x}", amm.address))
            .line(format!("Transaction hash : {:#x}", tx.hash));
        Ok(TaskOutput::Report(report))
    }
}

pub struct BalanceOf;

#[async_trait]
impl Task for BalanceOf {
    fn name(&self) -> &'static str {
        "balance-of"
    }

    fn description(&self) -> &'static str {
        "Unseal the signer's encrypted balance of both AMM tokens"
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, _args: &TaskArgs) -> Result<TaskOutput> {
        fdx.initialize_fhe(signer).await?;

        let mut report = Report::new();
        for (i, name) in ["token0", "token1"].iter().enumerate() {
            let token = fdx.contract(name, ContractKind::FheToken)?;
            let permission = fdx.fhe.permission(token.address).await?;

            let rep = fdx
                .query(
                    Some(signer.address()),
                    &token,
                    "balanceOfEncrypted",
                    &[Token::Address(signer.address()), permission.to_token()],
                )
                .await?;
            let sealed = token_string(&first(&rep, "balanceOfEncrypted")?, "sealed balance")?;

            let value = ReturnValue::Sealed {
                contract: token.address,
                sealed: SealedOutput::Sealed(sealed),
                ty: FheType::Uint32,
            };
            let balance = fdx.render(&value).await?;
            report.line(format!("Signer Token {i} Encrypted Balance {balance}"));
        }

        Ok(TaskOutput::Report(report))
    }
}

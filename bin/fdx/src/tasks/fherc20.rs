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

use fhedex::{
    eth::{Signer, U256},
    fhe::Encryptable,
    Result,
};

use super::TOKEN_CHOICES;
use crate::{
    contract::ContractKind,
    registry::{ParamSpec, Task, TaskArgs},
    report::{Report, TaskOutput},
    Fdx,
};

pub struct Mint;

#[async_trait]
impl Task for Mint {
    fn name(&self) -> &'static str {
        "mint"
    }

    fn description(&self) -> &'static str {
        "Mint public FHERC20 tokens to the signer"
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::optional("token", "token0 or token1", "token0"),
            ParamSpec::optional("amount", "Amount to mint", "100"),
        ];
        PARAMS
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput> {
        let token = fdx.contract(args.choice("token", TOKEN_CHOICES)?, ContractKind::FheToken)?;
        let amount = args.u256("amount")?;

        let tx = fdx
            .transact(
                signer,
                &token,
                "mint",
                &[Token::Address(signer.address()), Token::Uint(amount)],
            )
            .await?;

        let mut report = Report::new();
        report
            .line(format!("Minted {amount} of {token} to {:#x}", signer.address()))
            .line(format!("Transaction hash : {:#x}", tx.hash));
        Ok(TaskOutput::Report(report))
    }
}

pub struct Wrap;

#[async_trait]
impl Task for Wrap {
    fn name(&self) -> &'static str {
        "wrap"
    }

    fn description(&self) -> &'static str {
        "Move public FHERC20 balance into the encrypted balance"
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::optional("token", "token0 or token1", "token0"),
            ParamSpec::optional("amount", "Amount to wrap (uint32)", "100"),
        ];
        PARAMS
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput> {
        let token = fdx.contract(args.choice("token", TOKEN_CHOICES)?, ContractKind::FheToken)?;
        let amount = args.u32("amount")?;

        let tx = fdx.transact(signer, &token, "wrap", &[Token::Uint(U256::from(amount))]).await?;

        let mut report = Report::new();
        report
            .line(format!("Wrapped {amount} of {token}"))
            .line(format!("Transaction hash : {:#x}", tx.hash));
        Ok(TaskOutput::Report(report))
    }
}

pub struct ApproveEncrypted;

#[async_trait]
impl Task for ApproveEncrypted {
    fn name(&self) -> &'static str {
        "approve-encrypted"
    }

    fn description(&self) -> &'static str {
        "Approve the AMM to spend an encrypted amount of a token"
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::optional("token", "token0 or token1", "token0"),
            ParamSpec::optional("amount", "Allowance (uint8)", "100"),
        ];
        PARAMS
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput> {
        let token = fdx.contract(args.choice("token", TOKEN_CHOICES)?, ContractKind::FheToken)?;
        let amm = fdx.contract("amm", ContractKind::Amm)?;
        let amount = args.u8("amount")?;

        fdx.initialize_fhe(signer).await?;
        let inputs = fdx.encrypt(&token, &[Encryptable::uint8(amount)]).await?;

        let tx = fdx
            .transact(
                signer,
                &token,
                "approveEncrypted",
                &[Token::Address(amm.address), inputs[0].to_token()],
            )
            .await?;

        let mut report = Report::new();
        report
            .line(format!("Approved {amm} for an encrypted {amount} of {token}"))
            .line(format!("Transaction hash : {:#x}", tx.hash));
        Ok(TaskOutput::Report(report))
    }
}

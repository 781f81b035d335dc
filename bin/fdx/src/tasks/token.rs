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

use super::{first, token_uint};
use crate::{
    contract::ContractKind,
    registry::{ParamSpec, Task, TaskArgs},
    report::{Report, ReturnValue, TaskOutput},
    Fdx,
};

pub struct GetTokenBalances;

#[async_trait]
impl Task for GetTokenBalances {
    fn name(&self) -> &'static str {
        "get-token-balances"
    }

    fn description(&self) -> &'static str {
        "Print public and encrypted balances of both hybrid tokens"
    }

    fn requires_funds(&self) -> bool {
        false
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, _args: &TaskArgs) -> Result<TaskOutput> {
        let user = Token::Address(signer.address());
        fdx.initialize_fhe(signer).await?;

        let mut report = Report::new();
        for name in ["token0", "token1"] {
            let token = fdx.contract(name, ContractKind::HybridToken)?;

            let rep = fdx.query(None, &token, "balanceOf", &[user.clone()]).await?;
            let public = ReturnValue::Plain(token_uint(&first(&rep, "balanceOf")?, "balance")?);

            let rep = fdx.query(None, &token, "encBalances", &[user.clone()]).await?;
            let encrypted = ReturnValue::Sealed {
                contract: token.address,
                sealed: SealedOutput::Handle(token_uint(&first(&rep, "encBalances")?, "handle")?),
                ty: FheType::Uint128,
            };

            report
                .line(format!("user {name} public balance : {}", fdx.render(&public).await?))
                .line(format!("user {name} encrypted balance : {}", fdx.render(&encrypted).await?));
        }

        Ok(TaskOutput::Report(report))
    }
}

pub struct MintEncrypted;

#[async_trait]
impl Task for MintEncrypted {
    fn name(&self) -> &'static str {
        "mint-encrypted"
    }

    fn description(&self) -> &'static str {
        "Mint an encrypted amount of both hybrid tokens to the signer"
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] =
            &[ParamSpec::optional("amount", "Amount of each token to mint (uint128)", "1000")];
        PARAMS
    }

    fn requires_funds(&self) -> bool {
        true
    }

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput> {
        let amount = args.u128("amount")?;
        fdx.initialize_fhe(signer).await?;

        let mut report = Report::new();
        for name in ["token0", "token1"] {
            let token = fdx.contract(name, ContractKind::HybridToken)?;
            let inputs = fdx.encrypt(&token, &[Encryptable::uint128(amount)]).await?;

            let tx = fdx
                .transact(
                    signer,
                    &token,
                    "mintEncrypted",
                    &[Token::Address(signer.address()), inputs[0].to_token()],
                )
                .await?;
            info!(target: "fdx::tasks::token", "Minted encrypted {name} in {:#x}", tx.hash);
            report.line(format!("{name} mintEncrypted : {:#x}", tx.hash));
        }

        report.line("Great Success");
        Ok(TaskOutput::Report(report))
    }
}

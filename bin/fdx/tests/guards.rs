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
    error::TxError,
    eth::U256,
    testing::{MockBackend, MockFaucet, MockReply},
    Error, Result,
};

use fdx::{funding::FundingStatus, registry::TaskRegistry, Fdx};

mod common;
use common::*;

#[test]
fn faucet_is_used_only_for_empty_local_accounts() -> Result<()> {
    smol::block_on(async {
        for (local, balance) in
            [(true, U256::zero()), (true, U256::one()), (false, U256::zero()), (false, U256::one())]
        {
            let env = common::env(local, balance, MockBackend::Packed);
            let signer = env.fdx.resolve_signer(0).await?;
            let res = env.fdx.ensure_funded(&signer).await;

            match (local, balance.is_zero()) {
                (true, true) => {
                    assert_eq!(res?, FundingStatus::Requested);
                    assert_eq!(env.faucet.requests(), vec![user()]);
                }
                (false, true) => {
                    assert!(matches!(res, Err(Error::FundingError(_))));
                    assert!(env.faucet.requests().is_empty());
                }
                _ => {
                    assert_eq!(res?, FundingStatus::Funded(balance));
                    assert!(env.faucet.requests().is_empty());
                }
            }
        }
        Ok(())
    })
}

#[test]
fn empty_non_local_account_aborts_before_any_work() -> Result<()> {
    smol::block_on(async {
        let env = common::env(false, U256::zero(), MockBackend::Verified);
        let registry = TaskRegistry::builtin()?;

        let res = env
            .fdx
            .dispatch(
                &registry,
                "place-iceberg-order",
                &params(&["zero-for-one=false", "liquidity=10", "tick-lower=120"]),
                0,
            )
            .await;

        let Err(err) = res else { panic!("expected a funding error") };
        let Error::FundingError(msg) = &err else { panic!("expected a funding error") };
        assert!(msg.contains(&format!("Please fund your account {:#x}", common::user())));
        assert!(msg.contains("https://faucet.example.org"));
        // The instruction reaches the user only through the returned error
        assert_eq!(err.to_string(), format!("Funding error: {msg}"));

        assert!(env.chain.sent().is_empty());
        assert_eq!(env.fhe.encrypt_calls(), 0);
        assert_eq!(env.fhe.initialized(), None);
        assert!(env.faucet.requests().is_empty());
        Ok(())
    })
}

#[test]
fn failed_faucet_request_aborts_the_task() -> Result<()> {
    smol::block_on(async {
        let env = common::env(true, U256::zero(), MockBackend::Packed);
        let registry = TaskRegistry::builtin()?;

        let faucet = Arc::new(MockFaucet::failing());
        let fdx = Fdx::with_clients(
            "test",
            env.fdx.network.clone(),
            env.chain.clone(),
            env.fhe.clone(),
            Some(faucet.clone()),
        );

        let res = fdx.dispatch(&registry, "swap", &[], 0).await;
        assert!(matches!(res, Err(Error::FundingError(_))));
        assert_eq!(faucet.requests(), vec![user()]);
        assert!(env.chain.sent().is_empty());
        Ok(())
    })
}

#[test]
fn read_only_tasks_skip_the_funding_guard() -> Result<()> {
    smol::block_on(async {
        let env = common::env(false, U256::zero(), MockBackend::Verified);
        let registry = TaskRegistry::builtin()?;

        env.chain.deploy(state_view(), |_| {
            ret(&[
                ethers::abi::Token::Uint(U256::one() << 96),
                ethers::abi::Token::Int(U256::zero()),
                ethers::abi::Token::Uint(U256::zero()),
                ethers::abi::Token::Uint(U256::from(500)),
            ])
        });

        let out = env.fdx.dispatch(&registry, "get-pool-state", &[], 0).await?;
        assert!(out.to_string().contains("lpFee        : 500"));
        assert!(env.faucet.requests().is_empty());
        Ok(())
    })
}

#[test]
fn reverted_transaction_is_reported_once() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Packed);
        let registry = TaskRegistry::builtin()?;
        env.chain.deploy(amm(), |_| MockReply::Revert("insufficient allowance".into()));

        // Rejected at submission
        let err = env.fdx.dispatch(&registry, "swap", &[], 0).await.unwrap_err();
        assert!(matches!(err, Error::TxError(TxError::Reverted(ref r)) if r == "insufficient allowance"));
        assert!(!err.is_retryable());
        assert_eq!(env.chain.invocations(amm()), 1);
        assert!(env.chain.sent().is_empty());

        // Mined with a failed status
        env.chain.set_mine_reverts(true);
        let err = env.fdx.dispatch(&registry, "swap", &[], 0).await.unwrap_err();
        assert!(matches!(err, Error::TxError(TxError::RevertedOnChain(_))));
        assert!(!err.is_retryable());
        assert_eq!(env.chain.invocations(amm()), 2);
        assert_eq!(env.chain.sent().len(), 1);
        Ok(())
    })
}

#[test]
fn missing_signer_or_contract_is_a_configuration_error() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Packed);
        let registry = TaskRegistry::builtin()?;

        assert!(matches!(
            env.fdx.dispatch(&registry, "get-pool-state", &[], 3).await,
            Err(Error::ConfigurationError(_))
        ));

        let mut network = env.fdx.network.clone();
        network.contracts.remove("amm");
        let fdx = Fdx::with_clients("test", network, env.chain.clone(), env.fhe.clone(), None);
        assert!(matches!(
            fdx.dispatch(&registry, "add-liquidity", &[], 0).await,
            Err(Error::ConfigurationError(_))
        ));
        assert!(env.chain.sent().is_empty());
        Ok(())
    })
}

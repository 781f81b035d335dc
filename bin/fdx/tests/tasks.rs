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

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use ethers::abi::Token;
use fhedex::{
    eth::{types::parse_bytes32_str, Address, I256, U256},
    fhe::{CiphertextHandle, Encryptable, FheType, SealedOutput},
    testing::{MockBackend, MockReply, Tamper},
    Error, Result,
};

use fdx::{
    contract::{ContractHandle, ContractKind},
    registry::TaskRegistry,
    report::{ReturnValue, TaskOutput},
};

mod common;
use common::*;

type Balances = Arc<Mutex<HashMap<(Address, Address), U256>>>;

/// Fhenix AMM over two FHERC20 tokens holding sealed balances. The AMM
/// consumes each ciphertext at most once and only if it was produced
/// for the AMM itself.
fn deploy_fhenix_amm(env: &TestEnv, balances: Balances) {
    for token in [token0(), token1()] {
        let fhe = env.fhe.clone();
        let balances = balances.clone();
        env.chain.deploy(token, move |call| {
            let (method, args) = decode_call(ContractKind::FheToken, call);
            match (method.as_str(), &args[0]) {
                ("balanceOfEncrypted", Token::Address(owner)) => {
                    let balance = balances.lock().unwrap().get(&(call.to, *owner)).copied();
                    ret(&[Token::String(fhe.seal(balance.unwrap_or_default()))])
                }
                (m, _) => MockReply::Revert(format!("{m} is not supported")),
            }
        });
    }

    let fhe = env.fhe.clone();
    let consumed = Mutex::new(HashSet::new());
    env.chain.deploy(amm(), move |call| {
        let (method, args) = decode_call(ContractKind::Amm, call);
        assert_eq!(method, "addLiquidity");
        let from = call.from.unwrap();

        for (token, arg) in [token0(), token1()].into_iter().zip(&args) {
            let handle = CiphertextHandle::from_token(arg).unwrap();
            let Some((ty, bound, amount)) = fhe.plaintext(&handle) else {
                return MockReply::Revert("unknown ciphertext".into())
            };
            if ty != FheType::Uint8 || bound != amm() {
                return MockReply::Revert("ciphertext is not valid here".into())
            }
            if !consumed.lock().unwrap().insert(handle) {
                return MockReply::Revert("ciphertext already used".into())
            }

            let mut balances = balances.lock().unwrap();
            let balance = balances.entry((token, from)).or_default();
            if *balance < amount {
                return MockReply::Revert("insufficient balance".into())
            }
            *balance -= amount;
        }

        ret(&[])
    });
}

#[test]
fn add_liquidity_debits_encrypted_balances() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Packed);
        let registry = TaskRegistry::builtin()?;

        let balances = Balances::default();
        balances.lock().unwrap().insert((token0(), user()), U256::from(100));
        balances.lock().unwrap().insert((token1(), user()), U256::from(100));
        deploy_fhenix_amm(&env, balances.clone());

        let out = env.fdx.dispatch(&registry, "add-liquidity", &params(&["amount=15"]), 0).await?;
        let out = out.to_string();
        assert!(out.contains(&format!("Running addLiquidity(15), targeting contract at: {:#x}", amm())));
        assert!(out.contains("Transaction hash : 0x"));

        assert_eq!(env.fhe.encrypt_calls(), 1);
        assert_eq!(env.chain.sent().len(), 1);
        assert_eq!(env.fhe.initialized(), Some((CHAIN_ID, user())));

        let out = env.fdx.dispatch(&registry, "balance-of", &[], 0).await?.to_string();
        assert!(out.contains("Signer Token 0 Encrypted Balance 85"));
        assert!(out.contains("Signer Token 1 Encrypted Balance 85"));

        // Read-only views submit nothing
        assert_eq!(env.chain.sent().len(), 1);
        Ok(())
    })
}

#[test]
fn encrypted_values_unseal_to_their_plaintext() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Verified);
        let signer = env.fdx.resolve_signer(0).await?;
        env.fdx.initialize_fhe(&signer).await?;

        let contract = ContractHandle::new("iceberg", iceberg(), ContractKind::Iceberg);
        let cases = [
            (Encryptable::bool(true), "true"),
            (Encryptable::bool(false), "false"),
            (Encryptable::uint8(u8::MAX), "255"),
            (Encryptable::uint128(u128::MAX), "340282366920938463463374607431768211455"),
        ];

        for (value, expected) in cases {
            let inputs = env.fdx.encrypt(&contract, &[value]).await?;
            let CiphertextHandle::Verified { ct_hash, .. } = inputs[0].handle else {
                panic!("expected a verified handle")
            };

            let sealed = ReturnValue::Sealed {
                contract: iceberg(),
                sealed: SealedOutput::Handle(ct_hash),
                ty: value.ty,
            };
            assert_eq!(env.fdx.render(&sealed).await?, expected);
        }

        // Ciphertexts are bound to the contract they were produced for
        let inputs = env.fdx.encrypt(&contract, &[Encryptable::uint8(7)]).await?;
        let CiphertextHandle::Verified { ct_hash, .. } = inputs[0].handle else { panic!() };
        let elsewhere = ReturnValue::Sealed {
            contract: amm(),
            sealed: SealedOutput::Handle(ct_hash),
            ty: FheType::Uint8,
        };
        assert!(matches!(env.fdx.render(&elsewhere).await, Err(Error::DecryptionError(_))));
        Ok(())
    })
}

#[test]
fn batch_encryption_keeps_order() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Packed);
        let signer = env.fdx.resolve_signer(0).await?;
        env.fdx.initialize_fhe(&signer).await?;

        let contract = ContractHandle::new("amm", amm(), ContractKind::Amm);
        let values = [
            Encryptable::bool(true),
            Encryptable::uint128(7),
            Encryptable::uint8(3),
            Encryptable::uint32(70000),
        ];
        let inputs = env.fdx.encrypt(&contract, &values).await?;

        assert_eq!(env.fhe.encrypt_calls(), 1);
        assert_eq!(inputs.len(), values.len());
        for (input, value) in inputs.iter().zip(&values) {
            assert_eq!(input.ty, value.ty);
            assert_eq!(input.contract, amm());
            assert_eq!(env.fhe.plaintext(&input.handle), Some((value.ty, amm(), value.value)));
        }
        Ok(())
    })
}

#[test]
fn malformed_encryption_replies_are_rejected() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Verified);
        let contract = ContractHandle::new("iceberg", iceberg(), ContractKind::Iceberg);
        let values = [Encryptable::bool(true), Encryptable::uint128(500)];

        // Not initialized yet
        assert!(matches!(
            env.fdx.encrypt(&contract, &values).await,
            Err(Error::EncryptionError(_))
        ));

        let signer = env.fdx.resolve_signer(0).await?;
        env.fdx.initialize_fhe(&signer).await?;

        for tamper in [Tamper::Reorder, Tamper::Truncate, Tamper::Rebind] {
            env.fhe.set_tamper(tamper);
            assert!(
                matches!(env.fdx.encrypt(&contract, &values).await, Err(Error::EncryptionError(_))),
                "{tamper:?} reply was accepted"
            );
        }

        env.fhe.set_tamper(Tamper::None);
        assert_eq!(env.fdx.encrypt(&contract, &values).await?.len(), 2);
        Ok(())
    })
}

#[test]
fn iceberg_order_is_encrypted_for_the_hook() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Verified);
        let registry = TaskRegistry::builtin()?;

        let seen = Arc::new(Mutex::new(vec![]));
        let recorded = seen.clone();
        env.chain.deploy(iceberg(), move |call| {
            let (method, args) = decode_call(ContractKind::Iceberg, call);
            assert_eq!(method, "placeIcebergOrder");
            *recorded.lock().unwrap() = args;
            ret(&[])
        });

        let out = env
            .fdx
            .dispatch(
                &registry,
                "place-iceberg-order",
                &params(&["zero-for-one=true", "liquidity=500", "tick-lower=-60"]),
                0,
            )
            .await?
            .to_string();
        assert!(out.contains("Order placed successfully!"));
        assert!(out.contains("Transaction hash : 0x"));
        assert_eq!(env.fhe.encrypt_calls(), 1);

        let args = seen.lock().unwrap().clone();
        assert_eq!(
            args[0],
            Token::Tuple(vec![
                Token::Address(token0()),
                Token::Address(token1()),
                Token::Uint(U256::from(3000)),
                Token::Int(I256::from(60).into_raw()),
                Token::Address(iceberg()),
            ])
        );
        assert_eq!(args[1], Token::Int(I256::from(-60).into_raw()));

        let zero_for_one = CiphertextHandle::from_token(&args[2])?;
        let liquidity = CiphertextHandle::from_token(&args[3])?;
        assert_eq!(env.fhe.plaintext(&zero_for_one), Some((FheType::Bool, iceberg(), U256::one())));
        assert_eq!(
            env.fhe.plaintext(&liquidity),
            Some((FheType::Uint128, iceberg(), U256::from(500)))
        );
        Ok(())
    })
}

fn deploy_queue(env: &TestEnv, queue: Address, entries: Vec<U256>) {
    env.chain.deploy(iceberg(), move |call| {
        let (method, args) = decode_call(ContractKind::Iceberg, call);
        assert_eq!(method, "poolQueue");
        assert_eq!(args[0], Token::FixedBytes(parse_bytes32_str(POOL_ID).unwrap().to_vec()));
        ret(&[Token::Address(queue)])
    });

    env.chain.deploy(queue, move |call| {
        let (method, _) = decode_call(ContractKind::Queue, call);
        match method.as_str() {
            "length" => ret(&[Token::Uint(U256::from(entries.len()))]),
            "peek" => match entries.first() {
                Some(top) => ret(&[Token::Uint(*top)]),
                None => MockReply::Revert("queue is empty".into()),
            },
            m => panic!("unexpected call to {m}"),
        }
    });
}

#[test]
fn empty_queue_is_reported_as_empty() -> Result<()> {
    smol::block_on(async {
        let registry = TaskRegistry::builtin()?;

        // No queue created for the pool yet
        let env = funded(MockBackend::Verified);
        deploy_queue(&env, Address::zero(), vec![]);
        let out = env.fdx.dispatch(&registry, "get-pool-queue", &[], 0).await?;
        assert!(matches!(out, TaskOutput::Empty(_)));

        // Queue exists but holds nothing
        let env = funded(MockBackend::Verified);
        let queue = Address::from_low_u64_be(0x9e);
        deploy_queue(&env, queue, vec![]);
        let out = env.fdx.dispatch(&registry, "get-pool-queue", &[], 0).await?;
        assert_eq!(out, TaskOutput::Empty("Decryption queue".to_string()));
        assert_eq!(out.to_string(), "Decryption queue is empty\n");
        assert_eq!(env.chain.invocations(queue), 1);
        Ok(())
    })
}

#[test]
fn queue_head_is_unsealed() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Verified);
        let registry = TaskRegistry::builtin()?;

        let top = env.fhe.store(iceberg(), FheType::Uint128, U256::from(42));
        let queue = Address::from_low_u64_be(0x9e);
        deploy_queue(&env, queue, vec![top, U256::from(99)]);

        let out = env.fdx.dispatch(&registry, "get-pool-queue", &[], 0).await?;
        let TaskOutput::Report(report) = out else { panic!("queue should not be empty") };
        assert!(report.contains("Length       : 2"));
        assert!(report.contains(&format!("Top of Queue : {top}")));
        assert!(report.contains("...Decrypted : 42"));
        Ok(())
    })
}

fn deploy_state_view(env: &TestEnv, sqrt_price_x96: U256, tick: i32) {
    env.chain.deploy(state_view(), move |call| {
        let (method, args) = decode_call(ContractKind::StateView, call);
        assert_eq!(method, "getSlot0");
        assert_eq!(args[0], Token::FixedBytes(parse_bytes32_str(POOL_ID).unwrap().to_vec()));
        ret(&[
            Token::Uint(sqrt_price_x96),
            Token::Int(I256::from(tick).into_raw()),
            Token::Uint(U256::zero()),
            Token::Uint(U256::from(3000)),
        ])
    });
}

#[test]
fn pool_state_and_exchange_rate() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Verified);
        let registry = TaskRegistry::builtin()?;
        deploy_state_view(&env, U256::one() << 96, -887220);

        let out = env.fdx.dispatch(&registry, "get-pool-state", &[], 0).await?;
        let TaskOutput::Report(report) = out else { panic!() };
        assert_eq!(report.lines()[0], "---- Current Pool State ----");
        assert_eq!(report.lines()[1], format!("sqrtPriceX96 : {}", U256::one() << 96));
        assert_eq!(report.lines()[2], "tick         : -887220");
        assert_eq!(report.lines()[3], "protocolFee  : 0");
        assert_eq!(report.lines()[4], "lpFee        : 3000");

        let out = env.fdx.dispatch(&registry, "get-exchange-rate", &[], 0).await?.to_string();
        assert!(out.contains("price of token0 in value of token1 : 1.000000000000000000"));
        assert!(out.contains("price of token1 in value of token0 in lowest decimal : 1000000000000000000"));

        // An uninitialized pool has no price
        let env = funded(MockBackend::Verified);
        deploy_state_view(&env, U256::zero(), 0);
        assert!(matches!(
            env.fdx.dispatch(&registry, "get-exchange-rate", &[], 0).await,
            Err(Error::NotFound(_))
        ));
        Ok(())
    })
}

#[test]
fn hook_permissions_are_listed() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Verified);
        let registry = TaskRegistry::builtin()?;

        env.chain.deploy(iceberg(), |call| {
            let (method, _) = decode_call(ContractKind::Iceberg, call);
            assert_eq!(method, "getHookPermissions");
            let flags = (0..14).map(|i| Token::Bool(i == 6 || i == 7)).collect();
            ret(&[Token::Tuple(flags)])
        });

        let out = env.fdx.dispatch(&registry, "get-iceberg-permissions", &[], 0).await?;
        let TaskOutput::Report(report) = out else { panic!() };
        assert_eq!(report.lines()[0], "-- Iceberg Hook Permissions --");
        assert_eq!(report.lines()[1], format!("{:<32}: false", "beforeInitialize"));
        assert_eq!(report.lines()[8], format!("{:<32}: true", "afterSwap"));
        Ok(())
    })
}

#[test]
fn hybrid_token_balances_and_encrypted_mint() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Verified);
        let registry = TaskRegistry::builtin()?;

        let minted = Arc::new(Mutex::new(vec![]));
        for (i, token) in [token0(), token1()].into_iter().enumerate() {
            let handle = env.fhe.store(token, FheType::Uint128, U256::from(1000 + i));
            let minted = minted.clone();
            env.chain.deploy(token, move |call| {
                let (method, args) = decode_call(ContractKind::HybridToken, call);
                match method.as_str() {
                    "balanceOf" => ret(&[Token::Uint(U256::from(500 + i))]),
                    "encBalances" => ret(&[Token::Uint(handle)]),
                    "mintEncrypted" => {
                        assert_eq!(args[0], Token::Address(user()));
                        minted.lock().unwrap().push((call.to, args[1].clone()));
                        ret(&[])
                    }
                    m => panic!("unexpected call to {m}"),
                }
            });
        }

        let out = env.fdx.dispatch(&registry, "get-token-balances", &[], 0).await?.to_string();
        assert!(out.contains("user token0 public balance : 500"));
        assert!(out.contains("user token0 encrypted balance : 1000"));
        assert!(out.contains("user token1 public balance : 501"));
        assert!(out.contains("user token1 encrypted balance : 1001"));

        let out = env.fdx.dispatch(&registry, "mint-encrypted", &params(&["amount=250"]), 0).await?;
        assert!(out.to_string().contains("Great Success"));

        // One fresh ciphertext per token, each bound to its token
        assert_eq!(env.chain.sent().len(), 2);
        assert_eq!(env.fhe.encrypt_calls(), 2);
        for (token, arg) in minted.lock().unwrap().iter() {
            let handle = CiphertextHandle::from_token(arg).unwrap();
            assert_eq!(env.fhe.plaintext(&handle), Some((FheType::Uint128, *token, U256::from(250))));
        }
        Ok(())
    })
}

#[test]
fn fherc20_public_operations() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Packed);
        let registry = TaskRegistry::builtin()?;

        let calls = Arc::new(Mutex::new(vec![]));
        let recorded = calls.clone();
        env.chain.deploy(token1(), move |call| {
            recorded.lock().unwrap().push(decode_call(ContractKind::FheToken, call));
            ret(&[])
        });

        env.fdx.dispatch(&registry, "mint", &params(&["token=token1", "amount=1000"]), 0).await?;
        env.fdx.dispatch(&registry, "wrap", &params(&["token=token1", "amount=400"]), 0).await?;
        env.fdx
            .dispatch(&registry, "approve-encrypted", &params(&["token=token1", "amount=50"]), 0)
            .await?;

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], ("mint".to_string(), vec![
            Token::Address(user()),
            Token::Uint(U256::from(1000))
        ]));
        assert_eq!(calls[1], ("wrap".to_string(), vec![Token::Uint(U256::from(400))]));
        assert_eq!(calls[2].0, "approveEncrypted");
        assert_eq!(calls[2].1[0], Token::Address(amm()));

        let allowance = CiphertextHandle::from_token(&calls[2].1[1])?;
        assert_eq!(env.fhe.plaintext(&allowance), Some((FheType::Uint8, token1(), U256::from(50))));

        assert!(matches!(
            env.fdx.dispatch(&registry, "mint", &params(&["token=token2"]), 0).await,
            Err(Error::InvalidTaskParam(..))
        ));
        Ok(())
    })
}

#[test]
fn invalid_parameters_submit_nothing() -> Result<()> {
    smol::block_on(async {
        let env = funded(MockBackend::Packed);
        let registry = TaskRegistry::builtin()?;

        for (task, args) in [
            ("add-liquidity", vec!["amount=256"]),
            ("swap", vec!["zero-for-one=False"]),
            ("swap", vec!["zero-for-one=yes"]),
            ("place-iceberg-order", vec!["zero-for-one=true", "liquidity=1", "tick-lower=8388608"]),
            ("place-iceberg-order", vec!["zero-for-one=true", "liquidity=1"]),
            ("get-pool-state", vec!["fee=1"]),
        ] {
            let res = env.fdx.dispatch(&registry, task, &params(&args), 0).await;
            assert!(matches!(res, Err(Error::InvalidTaskParam(..))), "{task} {args:?} accepted");
        }

        assert!(matches!(
            env.fdx.dispatch(&registry, "remove-liquidity", &[], 0).await,
            Err(Error::UnknownTask(_))
        ));

        assert!(env.chain.sent().is_empty());
        assert_eq!(env.fhe.encrypt_calls(), 0);
        Ok(())
    })
}

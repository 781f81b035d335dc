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

#![allow(dead_code)]

use std::sync::Arc;

use ethers::abi::Token;
use fhedex::{
    eth::{Address, Bytes, U256},
    testing::{MockBackend, MockCall, MockChain, MockFaucet, MockFheClient, MockReply},
};

use fdx::{config::parse_network_config, contract::ContractKind, Fdx};

pub const CHAIN_ID: u64 = 412346;
pub const POOL_ID: &str = "0x4a63d4af4e4aa3228f2705d8996c1cb15af1ca3273626d88202c0e2238ec071b";

pub fn user() -> Address {
    Address::from_low_u64_be(0xa11ce)
}

pub fn amm() -> Address {
    Address::from_low_u64_be(0xa0)
}

pub fn token0() -> Address {
    Address::from_low_u64_be(0x70)
}

pub fn token1() -> Address {
    Address::from_low_u64_be(0x71)
}

pub fn iceberg() -> Address {
    Address::from_low_u64_be(0x1ce)
}

pub fn state_view() -> Address {
    Address::from_low_u64_be(0x5e)
}

fn test_config(local: bool) -> String {
    format!(
        r#"
[network_config."test"]
endpoint = "http://127.0.0.1:1"
local = {local}
faucet = "http://127.0.0.1:2"
funding_url = "https://faucet.example.org"
fhe_endpoint = "http://127.0.0.1:3"

[network_config."test".contracts]
amm = "{:#x}"
token0 = "{:#x}"
token1 = "{:#x}"
iceberg = "{:#x}"
state_view = "{:#x}"

[network_config."test".pool]
pool_id = "{POOL_ID}"
fee = 3000
tick_spacing = 60
"#,
        amm(),
        token0(),
        token1(),
        iceberg(),
        state_view(),
    )
}

pub struct TestEnv {
    pub chain: Arc<MockChain>,
    pub fhe: Arc<MockFheClient>,
    pub faucet: Arc<MockFaucet>,
    pub fdx: Fdx,
}

/// A client over mocks, with `user()` as the only node account.
pub fn env(local: bool, balance: U256, backend: MockBackend) -> TestEnv {
    let chain = Arc::new(MockChain::new(CHAIN_ID));
    chain.add_account(user(), balance);

    let fhe = Arc::new(MockFheClient::new(backend));
    let faucet = Arc::new(MockFaucet::new(Some(chain.clone()), U256::exp10(18)));

    let network = parse_network_config(&test_config(local), "test").unwrap();
    let fdx = Fdx::with_clients("test", network, chain.clone(), fhe.clone(), Some(faucet.clone()));

    TestEnv { chain, fhe, faucet, fdx }
}

pub fn funded(backend: MockBackend) -> TestEnv {
    env(true, U256::exp10(18), backend)
}

pub fn params(pairs: &[&str]) -> Vec<String> {
    pairs.iter().map(|p| p.to_string()).collect()
}

/// Decode a call against the interface of `kind`, returning the method
/// name and its arguments.
pub fn decode_call(kind: ContractKind, call: &MockCall) -> (String, Vec<Token>) {
    let function = kind
        .abi()
        .iter()
        .find(|f| f.short_signature()[..] == call.data[..4])
        .unwrap_or_else(|| panic!("unknown selector {:?}", &call.data[..4]));
    let args = function.decode_input(&call.data[4..]).unwrap();
    (function.name.clone(), args)
}

pub fn ret(tokens: &[Token]) -> MockReply {
    MockReply::Return(Bytes::from(ethers::abi::encode(tokens)))
}

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

use std::fmt;

use lazy_static::lazy_static;
use tracing::{debug, info};

use ethers::abi::{
    Function, Param, ParamType,
    StateMutability::{self, NonPayable, View},
    Token,
};
use fhedex::{
    error::TxError,
    eth::{Address, CallRequest, Receipt, Signer, H256},
    fhe::{CiphertextHandle, Permission},
    Error, Result,
};

use crate::Fdx;

fn param(name: &str, kind: ParamType) -> Param {
    Param { name: name.to_string(), kind, internal_type: None }
}

#[allow(deprecated)]
fn function(
    name: &str,
    inputs: Vec<Param>,
    outputs: Vec<ParamType>,
    state_mutability: StateMutability,
) -> Function {
    Function {
        name: name.to_string(),
        inputs,
        outputs: outputs.into_iter().map(|k| param("", k)).collect(),
        constant: None,
        state_mutability,
    }
}

fn uint(bits: usize) -> ParamType {
    ParamType::Uint(bits)
}

lazy_static! {
    /// Fhenix AMM over two FHERC20 tokens
    static ref AMM_ABI: Vec<Function> = vec![
        function(
            "addLiquidity",
            vec![
                param("amount0", CiphertextHandle::packed_param()),
                param("amount1", CiphertextHandle::packed_param()),
            ],
            vec![],
            NonPayable,
        ),
        function(
            "swap",
            vec![
                param("zeroForOne", ParamType::Bool),
                param("amountIn", CiphertextHandle::packed_param()),
            ],
            vec![],
            NonPayable,
        ),
    ];

    /// Fhenix FHERC20 token
    static ref FHE_TOKEN_ABI: Vec<Function> = vec![
        function(
            "mint",
            vec![param("to", ParamType::Address), param("amount", uint(256))],
            vec![],
            NonPayable,
        ),
        function("wrap", vec![param("amount", uint(32))], vec![], NonPayable),
        function(
            "approveEncrypted",
            vec![
                param("spender", ParamType::Address),
                param("encryptedAmount", CiphertextHandle::packed_param()),
            ],
            vec![],
            NonPayable,
        ),
        function("balanceOf", vec![param("account", ParamType::Address)], vec![uint(256)], View),
        function(
            "balanceOfEncrypted",
            vec![param("account", ParamType::Address), param("auth", Permission::param())],
            vec![ParamType::String],
            View,
        ),
    ];

    /// CoFHE hybrid public/encrypted ERC20
    static ref HYBRID_TOKEN_ABI: Vec<Function> = vec![
        function("balanceOf", vec![param("account", ParamType::Address)], vec![uint(256)], View),
        function("encBalances", vec![param("account", ParamType::Address)], vec![uint(256)], View),
        function(
            "mintEncrypted",
            vec![
                param("user", ParamType::Address),
                param("amount", CiphertextHandle::verified_param()),
            ],
            vec![],
            NonPayable,
        ),
    ];

    /// Iceberg Uniswap v4 hook
    static ref ICEBERG_ABI: Vec<Function> = vec![
        function(
            "getHookPermissions",
            vec![],
            vec![ParamType::Tuple(vec![ParamType::Bool; 14])],
            View,
        ),
        function(
            "placeIcebergOrder",
            vec![
                param("key", pool_key_param()),
                param("tickLower", ParamType::Int(24)),
                param("zeroForOne", CiphertextHandle::verified_param()),
                param("liquidity", CiphertextHandle::verified_param()),
            ],
            vec![],
            NonPayable,
        ),
        function(
            "poolQueue",
            vec![param("poolId", ParamType::FixedBytes(32))],
            vec![ParamType::Address],
            View,
        ),
    ];

    /// Decryption queue of an Iceberg pool
    static ref QUEUE_ABI: Vec<Function> = vec![
        function("length", vec![], vec![uint(256)], View),
        function("peek", vec![], vec![uint(256)], View),
    ];

    /// Uniswap v4 StateView lens
    static ref STATE_VIEW_ABI: Vec<Function> = vec![
        function(
            "getSlot0",
            vec![param("poolId", ParamType::FixedBytes(32))],
            vec![uint(160), ParamType::Int(24), uint(24), uint(24)],
            View,
        ),
    ];
}

/// ABI type of a Uniswap v4 `PoolKey`
pub fn pool_key_param() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Address,
        uint(24),
        ParamType::Int(24),
        ParamType::Address,
    ])
}

/// Contract interfaces the tasks talk to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContractKind {
    Amm,
    FheToken,
    HybridToken,
    Iceberg,
    Queue,
    StateView,
}

impl ContractKind {
    pub fn abi(&self) -> &'static [Function] {
        match self {
            Self::Amm => AMM_ABI.as_slice(),
            Self::FheToken => FHE_TOKEN_ABI.as_slice(),
            Self::HybridToken => HYBRID_TOKEN_ABI.as_slice(),
            Self::Iceberg => ICEBERG_ABI.as_slice(),
            Self::Queue => QUEUE_ABI.as_slice(),
            Self::StateView => STATE_VIEW_ABI.as_slice(),
        }
    }
}

/// A resolved contract: name, address and interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractHandle {
    pub name: String,
    pub address: Address,
    pub kind: ContractKind,
}

impl ContractHandle {
    pub fn new(name: &str, address: Address, kind: ContractKind) -> Self {
        Self { name: name.to_string(), address, kind }
    }

    pub fn function(&self, method: &str) -> Result<&'static Function> {
        match self.kind.abi().iter().find(|f| f.name == method) {
            Some(f) => Ok(f),
            None => Err(Error::NotFound(format!("method {method} on {}", self.name))),
        }
    }
}

impl fmt::Display for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#x})", self.name, self.address)
    }
}

/// A mined, successful transaction
#[derive(Clone, Debug)]
pub struct TransactionResult {
    pub hash: H256,
    pub receipt: Receipt,
}

/// Result of a read that may legitimately find nothing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    Value(T),
    Empty,
}

impl Fdx {
    /// Resolve a contract from the network's address table.
    pub fn contract(&self, name: &str, kind: ContractKind) -> Result<ContractHandle> {
        let address = self.network.contract_address(name)?;
        Ok(ContractHandle::new(name, address, kind))
    }

    /// Submit a state-mutating call and wait for its receipt. Failures
    /// are returned as they are; nothing is retried.
    pub async fn transact(
        &self,
        signer: &Signer,
        contract: &ContractHandle,
        method: &str,
        args: &[Token],
    ) -> Result<TransactionResult> {
        let function = contract.function(method)?;
        let data = function.encode_input(args)?;

        info!(target: "fdx::contract", "Sending {method} to {contract}");
        let hash = self.chain.send_transaction(signer, contract.address, data.into()).await?;
        let receipt = self.chain.wait_for_receipt(hash).await?;

        if !receipt.status {
            return Err(TxError::RevertedOnChain(format!("{hash:#x}")).into())
        }

        debug!(target: "fdx::contract", "{method} mined: {receipt}");
        Ok(TransactionResult { hash, receipt })
    }

    /// Execute a read-only call and decode its outputs.
    pub async fn query(
        &self,
        from: Option<Address>,
        contract: &ContractHandle,
        method: &str,
        args: &[Token],
    ) -> Result<Vec<Token>> {
        let function = contract.function(method)?;
        let data = function.encode_input(args)?;

        debug!(target: "fdx::contract", "Calling {method} on {contract}");
        let rep = self.chain.call(CallRequest::new(from, contract.address, data.into())).await?;
        Ok(function.decode_output(&rep)?)
    }
}

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

//! Typed plaintexts, ciphertext handles and the FHE client seam.
//!
//! Contracts accept encrypted inputs in one of two wire shapes: the packed
//! `inEuintN` struct used by Fhenix contracts, `(bytes data, int32
//! securityZone)`, and the verified `InEuintN` struct used by CoFHE
//! contracts, `(uint256 ctHash, uint8 securityZone, uint8 utype, bytes
//! signature)`. Both are modeled by [`CiphertextHandle`].
use std::fmt;

use async_trait::async_trait;
use ethers::{
    abi::{ParamType, Token},
    types::{Address, H256, I256, U256},
};

use crate::{Error, Result};

/// JSON-RPC client for the external encryption service
pub mod rpc;
pub use rpc::FheRpcClient;

/// Plaintext types the encryption service accepts
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FheType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Uint256,
    Address,
}

impl FheType {
    /// Numeric type tag shared by the encryption service and the contracts
    pub fn utype(&self) -> u8 {
        match self {
            Self::Bool => 0,
            Self::Uint8 => 2,
            Self::Uint16 => 3,
            Self::Uint32 => 4,
            Self::Uint64 => 5,
            Self::Uint128 => 6,
            Self::Address => 7,
            Self::Uint256 => 8,
        }
    }

    pub fn from_utype(utype: u8) -> Result<Self> {
        match utype {
            0 => Ok(Self::Bool),
            2 => Ok(Self::Uint8),
            3 => Ok(Self::Uint16),
            4 => Ok(Self::Uint32),
            5 => Ok(Self::Uint64),
            6 => Ok(Self::Uint128),
            7 => Ok(Self::Address),
            8 => Ok(Self::Uint256),
            t => Err(Error::EncryptionError(format!("Unknown FHE type tag {t}"))),
        }
    }

    /// Width of the plaintext in bits
    pub fn bits(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Uint8 => 8,
            Self::Uint16 => 16,
            Self::Uint32 => 32,
            Self::Uint64 => 64,
            Self::Uint128 => 128,
            Self::Address => 160,
            Self::Uint256 => 256,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "ebool",
            Self::Uint8 => "euint8",
            Self::Uint16 => "euint16",
            Self::Uint32 => "euint32",
            Self::Uint64 => "euint64",
            Self::Uint128 => "euint128",
            Self::Uint256 => "euint256",
            Self::Address => "eaddress",
        }
    }

    /// Whether `value` fits the declared width
    pub fn fits(&self, value: U256) -> bool {
        value.bits() <= self.bits()
    }

    /// Render a decrypted value of this type
    pub fn format_plain(&self, value: U256) -> String {
        match self {
            Self::Bool => (!value.is_zero()).to_string(),
            Self::Address => {
                let mut buf = [0u8; 32];
                value.to_big_endian(&mut buf);
                format!("{:#x}", Address::from_slice(&buf[12..]))
            }
            _ => value.to_string(),
        }
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed plaintext waiting to be encrypted
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Encryptable {
    pub ty: FheType,
    pub value: U256,
}

impl Encryptable {
    /// Create a new plaintext, failing if `value` exceeds the width of `ty`.
    pub fn new(ty: FheType, value: U256) -> Result<Self> {
        if !ty.fits(value) {
            return Err(Error::EncryptionError(format!("{value} does not fit into {ty}")))
        }
        Ok(Self { ty, value })
    }

    pub fn bool(value: bool) -> Self {
        Self { ty: FheType::Bool, value: U256::from(value as u8) }
    }

    pub fn uint8(value: u8) -> Self {
        Self { ty: FheType::Uint8, value: U256::from(value) }
    }

    pub fn uint16(value: u16) -> Self {
        Self { ty: FheType::Uint16, value: U256::from(value) }
    }

    pub fn uint32(value: u32) -> Self {
        Self { ty: FheType::Uint32, value: U256::from(value) }
    }

    pub fn uint64(value: u64) -> Self {
        Self { ty: FheType::Uint64, value: U256::from(value) }
    }

    pub fn uint128(value: u128) -> Self {
        Self { ty: FheType::Uint128, value: U256::from(value) }
    }

    pub fn uint256(value: U256) -> Self {
        Self { ty: FheType::Uint256, value }
    }

    pub fn address(value: Address) -> Self {
        Self { ty: FheType::Address, value: U256::from_big_endian(value.as_bytes()) }
    }
}

/// Opaque ciphertext reference as passed in contract call data
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CiphertextHandle {
    /// Fhenix `inEuintN`
    Packed { data: Vec<u8>, security_zone: i32 },
    /// CoFHE `InEuintN`, verified by the coprocessor signature
    Verified { ct_hash: U256, security_zone: u8, utype: u8, signature: Vec<u8> },
}

impl CiphertextHandle {
    pub fn to_token(&self) -> Token {
        match self {
            Self::Packed { data, security_zone } => Token::Tuple(vec![
                Token::Bytes(data.clone()),
                Token::Int(I256::from(*security_zone).into_raw()),
            ]),
            Self::Verified { ct_hash, security_zone, utype, signature } => Token::Tuple(vec![
                Token::Uint(*ct_hash),
                Token::Uint(U256::from(*security_zone)),
                Token::Uint(U256::from(*utype)),
                Token::Bytes(signature.clone()),
            ]),
        }
    }

    /// Recover a handle from decoded call data.
    pub fn from_token(token: &Token) -> Result<Self> {
        let Token::Tuple(fields) = token else {
            return Err(Error::AbiError("Encrypted input is not a tuple".to_string()))
        };

        match fields.as_slice() {
            [Token::Bytes(data), Token::Int(zone)] => Ok(Self::Packed {
                data: data.clone(),
                security_zone: I256::from_raw(*zone).low_i32(),
            }),
            [Token::Uint(ct_hash), Token::Uint(zone), Token::Uint(utype), Token::Bytes(sig)] => {
                Ok(Self::Verified {
                    ct_hash: *ct_hash,
                    security_zone: zone.low_u32() as u8,
                    utype: utype.low_u32() as u8,
                    signature: sig.clone(),
                })
            }
            _ => Err(Error::AbiError("Unrecognized encrypted input layout".to_string())),
        }
    }

    /// ABI type of the packed Fhenix input struct
    pub fn packed_param() -> ParamType {
        ParamType::Tuple(vec![ParamType::Bytes, ParamType::Int(32)])
    }

    /// ABI type of the verified CoFHE input struct
    pub fn verified_param() -> ParamType {
        ParamType::Tuple(vec![
            ParamType::Uint(256),
            ParamType::Uint(8),
            ParamType::Uint(8),
            ParamType::Bytes,
        ])
    }
}

/// Ciphertext handle bound to a value type and to the contract it was
/// produced for. It is only valid as call data for that contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInput {
    pub ty: FheType,
    pub contract: Address,
    pub handle: CiphertextHandle,
}

impl EncryptedInput {
    pub fn to_token(&self) -> Token {
        self.handle.to_token()
    }
}

/// Sealing permission accepted by Fhenix `*Encrypted` views
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permission {
    pub contract: Address,
    pub public_key: H256,
    pub signature: Vec<u8>,
}

impl Permission {
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(self.public_key.as_bytes().to_vec()),
            Token::Bytes(self.signature.clone()),
        ])
    }

    pub fn param() -> ParamType {
        ParamType::Tuple(vec![ParamType::FixedBytes(32), ParamType::Bytes])
    }
}

/// Value returned by a contract that needs unsealing before display
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SealedOutput {
    /// Sealed ciphertext string, readable with a [`Permission`]
    Sealed(String),
    /// Ciphertext hash held by the coprocessor
    Handle(U256),
}

impl fmt::Display for SealedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sealed(s) => write!(f, "{s}"),
            Self::Handle(h) => write!(f, "{h:#x}"),
        }
    }
}

/// Operations the tasks need from the encryption service.
///
/// A client must be initialized for the network and account before it
/// will encrypt or unseal anything.
#[async_trait]
pub trait FheClient: Send + Sync {
    /// Bind the client to a chain and the account that will submit the
    /// resulting ciphertexts.
    async fn initialize(&self, chain_id: u64, account: Address) -> Result<()>;

    /// Encrypt `values` for `contract` in a single request. The reply is
    /// positionally aligned with `values`.
    async fn encrypt(&self, contract: Address, values: &[Encryptable])
        -> Result<Vec<EncryptedInput>>;

    /// Produce a sealing permission for reads against `contract`.
    async fn permission(&self, contract: Address) -> Result<Permission>;

    /// Decrypt a value previously returned by `contract`.
    async fn unseal(&self, contract: Address, sealed: &SealedOutput, ty: FheType)
        -> Result<U256>;
}

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

//! Hex quantity and data encodings used on the Ethereum JSON-RPC wire.
use std::{fmt, str::FromStr};

use ethers::types::{Address, Bytes, H256, U256};
use tinyjson::JsonValue;

use crate::{
    rpc::util::{json_field, json_map, json_str},
    Error, Result,
};

/// Parameters of an `eth_call`/`eth_sendTransaction` style message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

impl CallRequest {
    pub fn new(from: Option<Address>, to: Address, data: Bytes) -> Self {
        Self { from, to, data }
    }

    pub fn to_json(&self) -> JsonValue {
        match self.from {
            Some(from) => json_map([
                ("from", json_str(&encode_address(&from))),
                ("to", json_str(&encode_address(&self.to))),
                ("data", json_str(&encode_data(&self.data))),
            ]),
            None => json_map([
                ("to", json_str(&encode_address(&self.to))),
                ("data", json_str(&encode_data(&self.data))),
            ]),
        }
    }
}

/// The subset of a transaction receipt the tasks report on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    /// `true` if the transaction executed successfully
    pub status: bool,
}

impl Receipt {
    /// Parse an `eth_getTransactionReceipt` result object.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let Some(hash) = json_field(value, "transactionHash") else {
            return Err(Error::UnexpectedJsonRpc("Receipt has no transactionHash".to_string()))
        };
        let transaction_hash = parse_h256(hash)?;

        let block_number = match json_field(value, "blockNumber") {
            Some(v) if !v.is_null() => Some(parse_quantity_u64(v)?),
            _ => None,
        };

        let gas_used = match json_field(value, "gasUsed") {
            Some(v) if !v.is_null() => Some(parse_quantity(v)?),
            _ => None,
        };

        // Pre-Byzantium receipts carry no status; treat them as successful
        let status = match json_field(value, "status") {
            Some(v) if !v.is_null() => !parse_quantity(v)?.is_zero(),
            _ => true,
        };

        Ok(Self { transaction_hash, block_number, gas_used, status })
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.status { "success" } else { "reverted" };
        write!(f, "{:#x} ({status})", self.transaction_hash)
    }
}

pub fn encode_quantity(value: U256) -> String {
    format!("{value:#x}")
}

pub fn encode_address(address: &Address) -> String {
    format!("{address:#x}")
}

pub fn encode_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn hex_str<'a>(value: &'a JsonValue, what: &str) -> Result<&'a str> {
    match value.get::<String>() {
        Some(s) => Ok(s.strip_prefix("0x").unwrap_or(s)),
        None => Err(Error::UnexpectedJsonRpc(format!("Expected a hex string for {what}"))),
    }
}

pub fn parse_quantity(value: &JsonValue) -> Result<U256> {
    let s = hex_str(value, "quantity")?;
    if s.is_empty() {
        return Ok(U256::zero())
    }
    U256::from_str_radix(s, 16).map_err(|_| Error::ParseFailed("Invalid hex quantity"))
}

/// A quantity that must fit `u64`, such as a chain ID or block number
pub fn parse_quantity_u64(value: &JsonValue) -> Result<u64> {
    let v = parse_quantity(value)?;
    if v > U256::from(u64::MAX) {
        return Err(Error::UnexpectedJsonRpc(format!("Quantity {v} does not fit into u64")))
    }
    Ok(v.as_u64())
}

pub fn parse_data(value: &JsonValue) -> Result<Bytes> {
    let s = hex_str(value, "data")?;
    Ok(Bytes::from(hex::decode(s)?))
}

pub fn parse_h256(value: &JsonValue) -> Result<H256> {
    let s = hex_str(value, "hash")?;
    let bytes = hex::decode(s)?;
    if bytes.len() != 32 {
        return Err(Error::ParseFailed("Hash is not 32 bytes long"))
    }
    Ok(H256::from_slice(&bytes))
}

pub fn parse_address(value: &JsonValue) -> Result<Address> {
    let s = hex_str(value, "address")?;
    parse_address_str(s)
}

/// Parse a `0x`-prefixed or bare hex address.
pub fn parse_address_str(s: &str) -> Result<Address> {
    let bare = s.strip_prefix("0x").unwrap_or(s);
    if bare.len() != 40 {
        return Err(Error::InvalidAddress(s.to_string()))
    }
    Address::from_str(bare).map_err(|_| Error::InvalidAddress(s.to_string()))
}

/// Parse a `0x`-prefixed 32 byte hex string, e.g. a pool ID.
pub fn parse_bytes32_str(s: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
    bytes.try_into().map_err(|_| Error::ParseFailed("Value is not 32 bytes long"))
}

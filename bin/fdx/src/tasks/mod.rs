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

use ethers::abi::Token;
use fhedex::{
    eth::{types::parse_bytes32_str, Address, I256, U256},
    Error, Result,
};

use crate::{config::NetworkConfig, registry::TaskRegistry};

/// Fhenix AMM tasks
pub mod amm;

/// Fhenix FHERC20 token tasks
pub mod fherc20;

/// Iceberg hook tasks
pub mod iceberg;

/// Uniswap v4 pool state tasks
pub mod pool;

/// CoFHE hybrid token tasks
pub mod token;

/// Register every built-in task.
pub fn register_all(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(Box::new(amm::AddLiquidity))?;
    registry.register(Box::new(amm::Swap))?;
    registry.register(Box::new(amm::BalanceOf))?;
    registry.register(Box::new(fherc20::Mint))?;
    registry.register(Box::new(fherc20::Wrap))?;
    registry.register(Box::new(fherc20::ApproveEncrypted))?;
    registry.register(Box::new(iceberg::GetIcebergPermissions))?;
    registry.register(Box::new(iceberg::PlaceIcebergOrder))?;
    registry.register(Box::new(iceberg::GetPoolQueue))?;
    registry.register(Box::new(pool::GetExchangeRate))?;
    registry.register(Box::new(pool::GetPoolState))?;
    registry.register(Box::new(token::GetTokenBalances))?;
    registry.register(Box::new(token::MintEncrypted))?;
    Ok(())
}

fn unexpected(what: &str, token: &Token) -> Error {
    Error::AbiError(format!("Unexpected {what} value {token:?}"))
}

pub(crate) fn first(tokens: &[Token], what: &str) -> Result<Token> {
    match tokens.first() {
        Some(t) => Ok(t.clone()),
        None => Err(Error::AbiError(format!("{what} returned nothing"))),
    }
}

pub(crate) fn token_uint(token: &Token, what: &str) -> Result<U256> {
    match token {
        Token::Uint(v) => Ok(*v),
        t => Err(unexpected(what, t)),
    }
}

pub(crate) fn token_int(token: &Token, what: &str) -> Result<i32> {
    match token {
        Token::Int(v) => Ok(I256::from_raw(*v).low_i32()),
        t => Err(unexpected(what, t)),
    }
}

pub(crate) fn token_address(token: &Token, what: &str) -> Result<Address> {
    match token {
        Token::Address(a) => Ok(*a),
        t => Err(unexpected(what, t)),
    }
}

pub(crate) fn token_string(token: &Token, what: &str) -> Result<String> {
    match token {
        Token::String(s) => Ok(s.clone()),
        t => Err(unexpected(what, t)),
    }
}

pub(crate) fn token_bools(token: &Token, what: &str) -> Result<Vec<bool>> {
    let Token::Tuple(fields) = token else { return Err(unexpected(what, token)) };
    fields
        .iter()
        .map(|f| match f {
            Token::Bool(b) => Ok(*b),
            t => Err(unexpected(what, t)),
        })
        .collect()
}

pub(crate) fn int_token(v: i32) -> Token {
    Token::Int(I256::from(v).into_raw())
}

/// The configured pool ID as a `bytes32` token
pub(crate) fn pool_id_token(network: &NetworkConfig) -> Result<Token> {
    let pool = network.pool()?;
    let id = parse_bytes32_str(&pool.pool_id).map_err(|_| {
        Error::ConfigurationError(format!("Invalid pool ID {}", pool.pool_id))
    })?;
    Ok(Token::FixedBytes(id.to_vec()))
}

/// Accepted values of a `token` parameter
pub(crate) const TOKEN_CHOICES: &[&str] = &["token0", "token1"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ints_survive_abi() {
        let encoded = ethers::abi::encode(&[int_token(-887220)]);
        let decoded = ethers::abi::decode(&[ethers::abi::ParamType::Int(24)], &encoded).unwrap();
        assert_eq!(token_int(&decoded[0], "tick").unwrap(), -887220);
    }
}

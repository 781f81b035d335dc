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

use ethers::types::U256;

use crate::{Error, Result};

fn invalid(name: &str, msg: impl Into<String>) -> Error {
    Error::InvalidTaskParam(name.to_string(), msg.into())
}

/// Parse a boolean parameter. Only `true` and `false` are accepted.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        v => Err(invalid(name, format!("expected true or false, got \"{v}\""))),
    }
}

/// Parse a decimal (or `0x` hex) unsigned integer that must fit `bits`.
pub fn parse_uint(name: &str, value: &str, bits: usize) -> Result<U256> {
    let (digits, radix) = match value.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None => (value, 10),
    };

    let not_int = || invalid(name, format!("\"{value}\" is not an integer"));
    if digits.is_empty() {
        return Err(not_int())
    }

    let v = U256::from_str_radix(digits, radix).map_err(|_| not_int())?;

    if v.bits() > bits {
        return Err(invalid(name, format!("{value} does not fit into uint{bits}")))
    }

    Ok(v)
}

pub fn parse_u8(name: &str, value: &str) -> Result<u8> {
    Ok(parse_uint(name, value, 8)?.low_u32() as u8)
}

pub fn parse_u128(name: &str, value: &str) -> Result<u128> {
    Ok(parse_uint(name, value, 128)?.as_u128())
}

/// Parse a signed tick, which must fit `int24`.
pub fn parse_int24(name: &str, value: &str) -> Result<i32> {
    const MIN: i64 = -(1 << 23);
    const MAX: i64 = (1 << 23) - 1;

    let v: i64 =
        value.parse().map_err(|_| invalid(name, format!("\"{value}\" is not an integer")))?;
    if !(MIN..=MAX).contains(&v) {
        return Err(invalid(name, format!("{value} does not fit into int24")))
    }

    Ok(v as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_strict() {
        assert!(parse_bool("z", "true").unwrap());
        assert!(!parse_bool("z", "false").unwrap());
        assert!(parse_bool("z", "False").is_err());
        assert!(parse_bool("z", "1").is_err());
        assert!(parse_bool("z", "").is_err());
    }

    #[test]
    fn uints_respect_width() {
        assert_eq!(parse_u8("amount", "255").unwrap(), 255);
        assert!(matches!(parse_u8("amount", "256"), Err(Error::InvalidTaskParam(..))));
        assert!(parse_u8("amount", "-1").is_err());
        assert_eq!(parse_u128("amount", "0x10").unwrap(), 16);
        assert!(parse_uint("amount", "abc", 256).is_err());
        assert!(matches!(parse_uint("amount", "", 256), Err(Error::InvalidTaskParam(..))));
        assert!(matches!(parse_uint("amount", "0x", 256), Err(Error::InvalidTaskParam(..))));
        assert_eq!(parse_uint("amount", "0xff", 8).unwrap(), U256::from(255));
    }

    #[test]
    fn ticks_fit_int24() {
        assert_eq!(parse_int24("tick", "-8388608").unwrap(), -8388608);
        assert_eq!(parse_int24("tick", "8388607").unwrap(), 8388607);
        assert!(parse_int24("tick", "8388608").is_err());
        assert!(parse_int24("tick", "1.5").is_err());
    }
}

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

use num_bigint::BigUint;
use tracing::debug;

use fhedex::{
    eth::{Address, U256},
    fhe::{FheType, SealedOutput},
    Error, Result,
};

use crate::Fdx;

/// Decimal places used when printing token prices
pub const PRICE_DECIMALS: u32 = 18;

/// Names of the Uniswap v4 hook permission flags, in ABI order
pub const HOOK_PERMISSIONS: [&str; 14] = [
    "beforeInitialize",
    "afterInitialize",
    "beforeAddLiquidity",
    "beforeRemoveLiquidity",
    "afterAddLiquidity",
    "afterRemoveLiquidity",
    "beforeSwap",
    "afterSwap",
    "beforeDonate",
    "afterDonate",
    "beforeSwapReturnDelta",
    "afterSwapReturnDelta",
    "afterAddLiquidityReturnDelta",
    "afterRemoveLiquidityReturnDelta",
];

/// Plain text lines produced by a task
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// What a task hands back to the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutput {
    Report(Report),
    /// The queried resource holds nothing
    Empty(String),
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report(r) => write!(f, "{r}"),
            Self::Empty(what) => writeln!(f, "{what} is empty"),
        }
    }
}

/// A value returned by a contract, tagged with what it takes to show it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnValue {
    Plain(U256),
    Sealed { contract: Address, sealed: SealedOutput, ty: FheType },
}

impl Fdx {
    /// Unseal `value` if its tag requires it and render it as text.
    pub async fn render(&self, value: &ReturnValue) -> Result<String> {
        match value {
            ReturnValue::Plain(v) => Ok(v.to_string()),
            ReturnValue::Sealed { contract, sealed, ty } => {
                debug!(target: "fdx::report", "Unsealing {ty} from {contract:#x}");
                let plain = self.fhe.unseal(*contract, sealed, *ty).await?;
                Ok(ty.format_plain(plain))
            }
        }
    }
}

fn to_biguint(v: U256) -> BigUint {
    let mut buf = [0u8; 32];
    v.to_big_endian(&mut buf);
    BigUint::from_bytes_be(&buf)
}

/// Format a fixed-point integer with `decimals` fractional digits.
pub fn format_fixed(value: &BigUint, decimals: u32) -> String {
    let scale = BigUint::from(10u32).pow(decimals);
    let int = value / &scale;
    let frac = (value % &scale).to_string();
    format!("{int}.{frac:0>width$}", width = decimals as usize)
}

/// `num / den`, rounded down or half-up.
fn div_round(num: &BigUint, den: &BigUint, half_up: bool) -> BigUint {
    if half_up {
        ((num << 1u32) + den) / (den << 1u32)
    } else {
        num / den
    }
}

fn rates(sqrt_price_x96: U256, half_up: bool) -> Result<(BigUint, BigUint)> {
    if sqrt_price_x96.is_zero() {
        return Err(Error::NotFound("pool price, the pool is not initialized".to_string()))
    }

    let sqrt = to_biguint(sqrt_price_x96);
    let ratio_x192 = &sqrt * &sqrt;
    let q192 = BigUint::from(1u32) << 192u32;
    let scale = BigUint::from(10u32).pow(PRICE_DECIMALS);

    let price0 = div_round(&(&ratio_x192 * &scale), &q192, half_up);
    let price1 = div_round(&(scale << 192u32), &ratio_x192, half_up);
    Ok((price0, price1))
}

/// Prices of token0 in token1 and of token1 in token0, both scaled by
/// 10^[`PRICE_DECIMALS`] and rounded down.
pub fn exchange_rates(sqrt_price_x96: U256) -> Result<(BigUint, BigUint)> {
    rates(sqrt_price_x96, false)
}

/// Same as [`exchange_rates`], rounded half-up at the last decimal.
pub fn exchange_rates_rounded(sqrt_price_x96: U256) -> Result<(BigUint, BigUint)> {
    rates(sqrt_price_x96, true)
}

pub fn exchange_rate_report(sqrt_price_x96: U256) -> Result<Report> {
    let (fixed0, fixed1) = exchange_rates_rounded(sqrt_price_x96)?;
    let (price0, price1) = exchange_rates(sqrt_price_x96)?;

    let mut report = Report::new();
    report
        .line(format!(
            "price of token0 in value of token1 : {}",
            format_fixed(&fixed0, PRICE_DECIMALS)
        ))
        .line(format!(
            "price of token1 in value of token0 : {}",
            format_fixed(&fixed1, PRICE_DECIMALS)
        ))
        .blank()
        .line(format!("price of token0 in value of token1 in lowest decimal : {price0}"))
        .line(format!("price of token1 in value of token0 in lowest decimal : {price1}"));
    Ok(report)
}

pub fn pool_state_report(
    sqrt_price_x96: U256,
    tick: i32,
    protocol_fee: u32,
    lp_fee: u32,
) -> Report {
    let mut report = Report::new();
    report
        .line("---- Current Pool State ----")
        .line(format!("sqrtPriceX96 : {sqrt_price_x96}"))
        .line(format!("tick         : {tick}"))
        .line(format!("protocolFee  : {protocol_fee}"))
        .line(format!("lpFee        : {lp_fee}"));
    report
}

pub fn hook_permissions_report(flags: &[bool]) -> Result<Report> {
    if flags.len() != HOOK_PERMISSIONS.len() {
        return Err(Error::AbiError(format!(
            "Expected {} hook permission flags, got {}",
            HOOK_PERMISSIONS.len(),
            flags.len()
        )))
    }

    let mut report = Report::new();
    report.line("-- Iceberg Hook Permissions --");
    for (name, flag) in HOOK_PERMISSIONS.iter().zip(flags) {
        report.line(format!("{name:<32}: {flag}"));
    }
    Ok(report)
}

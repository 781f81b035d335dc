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
use ethers::types::Address;
use tracing::{error, info};
use url::Url;

use crate::{eth::types::encode_address, Error, Result};

/// Source of native currency for development networks
#[async_trait]
pub trait Faucet: Send + Sync {
    /// Ask for funds to be sent to `address` and return once the faucet
    /// has answered. A rejection is a [`Error::FundingError`].
    async fn request_funds(&self, address: Address) -> Result<()>;
}

/// Faucet served over HTTP as `GET {base}/faucet?address=0x…`
pub struct HttpFaucet {
    base: Url,
}

impl HttpFaucet {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn request_url(&self, address: &Address) -> Result<Url> {
        let mut url = self.base.join("faucet")?;
        url.query_pairs_mut().append_pair("address", &encode_address(address));
        Ok(url)
    }
}

#[async_trait]
impl Faucet for HttpFaucet {
    async fn request_funds(&self, address: Address) -> Result<()> {
        let url = self.request_url(&address)?;
        info!(target: "faucet", "Requesting funds for {address:#x} from {}", self.base);

        let mut rep = match surf::get(url.as_str()).await {
            Ok(v) => v,
            Err(e) => {
                let e = format!("Failed sending faucet request: {e}");
                error!(target: "faucet", "{e}");
                return Err(Error::FundingError(e))
            }
        };

        if !rep.status().is_success() {
            let body = rep.body_string().await.unwrap_or_default();
            let e = format!("Faucet answered {}: {}", rep.status(), body.trim());
            error!(target: "faucet", "{e}");
            return Err(Error::FundingError(e))
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faucet_url_carries_address() {
        let faucet = HttpFaucet::new(Url::parse("http://127.0.0.1:42000").unwrap());
        let url = faucet.request_url(&Address::repeat_byte(0xab)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:42000/faucet?address=0xabababababababababababababababababababab"
        );
    }
}

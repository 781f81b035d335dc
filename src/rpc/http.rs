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

//! JSON-RPC client over HTTP POST, as spoken by EVM nodes and the FHE
//! encryption service.
use tinyjson::JsonValue;
use tracing::{debug, error};
use url::Url;

use super::jsonrpc::{JsonRequest, JsonResult};
use crate::{error::RpcError, Error, Result};

/// Stateless JSON-RPC client bound to a single HTTP endpoint.
#[derive(Clone)]
pub struct HttpRpcClient {
    endpoint: Url,
    client: surf::Client,
}

impl HttpRpcClient {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint, client: surf::Client::new() }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send a given JSON-RPC request and return the `result` member of
    /// the reply. JSON-RPC error objects are returned as
    /// [`Error::JsonRpcError`] carrying the remote code and message.
    pub async fn request(&self, req: JsonRequest) -> Result<JsonValue> {
        let body = req.stringify()?;
        debug!(target: "rpc::http", "--> {body}");

        let mut rep = match self
            .client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
        {
            Ok(v) => v,
            Err(e) => {
                error!(target: "rpc::http", "Failed sending request to {}: {e}", self.endpoint);
                return Err(Error::ConnectFailed(self.endpoint.to_string(), e.to_string()))
            }
        };

        let body = match rep.body_string().await {
            Ok(v) => v,
            Err(e) => {
                error!(target: "rpc::http", "Failed reading reply from {}: {e}", self.endpoint);
                return Err(Error::NetworkOperationFailed)
            }
        };
        debug!(target: "rpc::http", "<-- {body}");

        let value: JsonValue = body.parse()?;
        match JsonResult::try_from_value(&value)? {
            JsonResult::Response(r) => {
                if r.id != req.id {
                    return Err(RpcError::IdMismatch(req.id, r.id).into())
                }
                Ok(r.result)
            }
            JsonResult::Error(e) => Err(Error::JsonRpcError((e.error.code, e.error.message))),
        }
    }
}

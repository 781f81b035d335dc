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

//! Access to an EVM chain over JSON-RPC.
use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    signers::Signer as _,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, H256, U256},
};
use tinyjson::JsonValue;
use tracing::{debug, info};
use url::Url;

use super::{
    signer::Signer,
    types::{
        encode_address, encode_data, parse_address, parse_data, parse_h256, parse_quantity,
        parse_quantity_u64, CallRequest, Receipt,
    },
};
use crate::{
    error::TxError,
    rpc::{
        http::HttpRpcClient,
        jsonrpc::{ErrorCode, JsonRequest},
        util::{json_as_array, json_str, JsonArray},
    },
    Error, Result,
};

/// Operations the tasks need from a chain node. Every call is an
/// independent request; implementations hold no per-task state.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain ID reported by the node
    async fn chain_id(&self) -> Result<u64>;

    /// Accounts unlocked on the node, in node order
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Native currency balance of `address` at the latest block
    async fn balance(&self, address: Address) -> Result<U256>;

    /// Execute a read-only call. A revert is returned as
    /// [`TxError::Reverted`].
    async fn call(&self, req: CallRequest) -> Result<Bytes>;

    /// Sign (locally or node-side) and submit a transaction.
    /// Returns the transaction hash.
    async fn send_transaction(&self, signer: &Signer, to: Address, data: Bytes) -> Result<H256>;

    /// Wait until the transaction is mined and return its receipt.
    /// There is no timeout.
    async fn wait_for_receipt(&self, hash: H256) -> Result<Receipt>;
}

/// [`ChainClient`] backed by a node's HTTP JSON-RPC endpoint
pub struct EthRpcClient {
    rpc: HttpRpcClient,
    poll_interval: Duration,
}

impl EthRpcClient {
    pub fn new(endpoint: Url, poll_interval: Duration) -> Self {
        Self { rpc: HttpRpcClient::new(endpoint), poll_interval }
    }

    async fn request(&self, method: &str, params: Vec<JsonValue>) -> Result<JsonValue> {
        let req = JsonRequest::new(method, JsonArray(params));
        self.rpc.request(req).await.map_err(classify_node_error)
    }

    async fn estimate_gas(&self, req: &CallRequest) -> Result<U256> {
        let rep = self.request("eth_estimateGas", vec![req.to_json()]).await?;
        parse_quantity(&rep)
    }

    async fn gas_price(&self) -> Result<U256> {
        let rep = self.request("eth_gasPrice", vec![]).await?;
        parse_quantity(&rep)
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256> {
        let rep = self
            .request(
                "eth_getTransactionCount",
                vec![json_str(&encode_address(&address)), json_str("pending")],
            )
            .await?;
        parse_quantity(&rep)
    }
}

#[async_trait]
impl ChainClient for EthRpcClient {
    async fn chain_id(&self) -> Result<u64> {
        let rep = self.request("eth_chainId", vec![]).await?;
        parse_quantity_u64(&rep)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        let rep = self.request("eth_accounts", vec![]).await?;
        json_as_array(&rep, "eth_accounts")?.iter().map(parse_address).collect()
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        let params = vec![json_str(&encode_address(&address)), json_str("latest")];
        let rep = self.request("eth_getBalance", params).await?;
        parse_quantity(&rep)
    }

    async fn call(&self, req: CallRequest) -> Result<Bytes> {
        let rep = self.request("eth_call", vec![req.to_json(), json_str("latest")]).await?;
        parse_data(&rep)
    }

    async fn send_transaction(&self, signer: &Signer, to: Address, data: Bytes) -> Result<H256> {
        let from = signer.address();
        let call = CallRequest::new(Some(from), to, data.clone());

        // Estimation runs the call first, so reverts surface before submission.
        let gas = self.estimate_gas(&call).await?;
        debug!(target: "eth::client", "Estimated gas for call to {to:#x}: {gas}");

        let rep = match signer {
            Signer::Node(_) => {
                self.request("eth_sendTransaction", vec![call.to_json()]).await?
            }
            Signer::Local(wallet) => {
                let nonce = self.pending_nonce(from).await?;
                let gas_price = self.gas_price().await?;
                let tx: TypedTransaction = TransactionRequest::new()
                    .from(from)
                    .to(to)
                    .data(data)
                    .nonce(nonce)
                    .gas(gas)
                    .gas_price(gas_price)
                    .chain_id(wallet.chain_id())
                    .into();
                let signature = wallet.sign_transaction_sync(&tx)?;
                let raw = tx.rlp_signed(&signature);
                self.request("eth_sendRawTransaction", vec![json_str(&encode_data(&raw))]).await?
            }
        };

        let hash = parse_h256(&rep)?;
        info!(target: "eth::client", "Submitted transaction {hash:#x} from {from:#x}");
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: H256) -> Result<Receipt> {
        loop {
            let rep = self
                .request("eth_getTransactionReceipt", vec![json_str(&format!("{hash:#x}"))])
                .await?;

            if !rep.is_null() {
                return Receipt::from_json(&rep)
            }

            debug!(target: "eth::client", "Transaction {hash:#x} is still pending");
            smol::Timer::after(self.poll_interval).await;
        }
    }
}

/// Map node-side JSON-RPC errors of transaction related calls onto
/// [`TxError`] where they describe an execution failure.
fn classify_node_error(err: Error) -> Error {
    let Error::JsonRpcError((code, message)) = err else { return err };

    let lower = message.to_lowercase();
    if ErrorCode::from_code(code) == ErrorCode::ExecutionReverted || lower.contains("revert") {
        return TxError::Reverted(message).into()
    }

    if lower.contains("out of gas") || lower.contains("gas required exceeds") {
        return TxError::OutOfGas(message).into()
    }

    if ["nonce", "underpriced", "insufficient funds"].iter().any(|m| lower.contains(m)) {
        return TxError::Rpc(message).into()
    }

    Error::JsonRpcError((code, message))
}

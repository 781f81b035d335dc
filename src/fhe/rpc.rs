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
use ethers::types::{Address, H256, U256};
use smol::lock::Mutex;
use tinyjson::JsonValue;
use tracing::{debug, info};
use url::Url;

use super::{
    CiphertextHandle, EncryptedInput, Encryptable, FheClient, FheType, Permission, SealedOutput,
};
use crate::{
    eth::types::{encode_address, parse_address_str},
    rpc::{
        http::HttpRpcClient,
        jsonrpc::{ErrorCode, JsonRequest},
        util::{
            json_as_array, json_as_str, json_field, json_field_str, json_map, json_str, JsonArray,
            JsonNum,
        },
    },
    Error, Result,
};

/// [`FheClient`] talking to an encryption service over HTTP JSON-RPC
pub struct FheRpcClient {
    rpc: HttpRpcClient,
    /// Account bound by `fhe.initialize`
    account: Mutex<Option<Address>>,
}

impl FheRpcClient {
    pub fn new(endpoint: Url) -> Self {
        Self { rpc: HttpRpcClient::new(endpoint), account: Mutex::new(None) }
    }

    async fn bound_account(&self) -> Result<Address> {
        match *self.account.lock().await {
            Some(account) => Ok(account),
            None => Err(Error::FheNotInitialized),
        }
    }

    async fn request(&self, method: &str, params: Vec<JsonValue>) -> Result<JsonValue> {
        self.rpc.request(JsonRequest::new(method, JsonArray(params))).await
    }
}

#[async_trait]
impl FheClient for FheRpcClient {
    async fn initialize(&self, chain_id: u64, account: Address) -> Result<()> {
        self.request(
            "fhe.initialize",
            vec![JsonNum(chain_id as f64), json_str(&encode_address(&account))],
        )
        .await?;

        info!(target: "fhe::rpc", "Initialized FHE client for {account:#x} on chain {chain_id}");
        *self.account.lock().await = Some(account);
        Ok(())
    }

    async fn encrypt(
        &self,
        contract: Address,
        values: &[Encryptable],
    ) -> Result<Vec<EncryptedInput>> {
        let account = self.bound_account().await.map_err(encryption_error)?;

        let items = values
            .iter()
            .map(|v| {
                json_map([
                    ("utype", JsonNum(v.ty.utype() as f64)),
                    ("value", json_str(&v.value.to_string())),
                ])
            })
            .collect();

        debug!(target: "fhe::rpc", "Encrypting {} value(s) for {contract:#x}", values.len());
        let rep = self
            .request(
                "fhe.encrypt",
                vec![
                    json_str(&encode_address(&account)),
                    json_str(&encode_address(&contract)),
                    JsonArray(items),
                ],
            )
            .await
            .map_err(encryption_error)?;

        json_as_array(&rep, "fhe.encrypt")?.iter().map(parse_encrypted_input).collect()
    }

    async fn permission(&self, contract: Address) -> Result<Permission> {
        let account = self.bound_account().await?;
        let rep = self
            .request(
                "fhe.permission",
                vec![json_str(&encode_address(&account)), json_str(&encode_address(&contract))],
            )
            .await
            .map_err(decryption_error)?;

        let public_key = hex::decode(strip_0x(json_field_str(&rep, "publicKey")?))?;
        if public_key.len() != 32 {
            return Err(Error::UnexpectedJsonRpc("Permission key is not 32 bytes".to_string()))
        }
        let signature = hex::decode(strip_0x(json_field_str(&rep, "signature")?))?;

        Ok(Permission { contract, public_key: H256::from_slice(&public_key), signature })
    }

    async fn unseal(
        &self,
        contract: Address,
        sealed: &SealedOutput,
        ty: FheType,
    ) -> Result<U256> {
        let account = self.bound_account().await?;
        let rep = self
            .request(
                "fhe.unseal",
                vec![
                    json_str(&encode_address(&account)),
                    json_str(&encode_address(&contract)),
                    json_str(&sealed.to_string()),
                    JsonNum(ty.utype() as f64),
                ],
            )
            .await
            .map_err(decryption_error)?;

        let plain = json_as_str(&rep, "fhe.unseal")?;
        U256::from_dec_str(plain).map_err(|_| {
            Error::DecryptionError(format!("Service returned non-numeric \"{plain}\""))
        })
    }
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn json_u64(value: &JsonValue, key: &str) -> Result<u64> {
    match json_field(value, key).and_then(|v| v.get::<f64>()) {
        Some(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as u64),
        _ => Err(Error::UnexpectedJsonRpc(format!("Missing integer field \"{key}\""))),
    }
}

fn json_u8(value: &JsonValue, key: &str) -> Result<u8> {
    let n = json_u64(value, key)?;
    u8::try_from(n).map_err(|_| {
        Error::UnexpectedJsonRpc(format!("Field \"{key}\" out of range for u8: {n}"))
    })
}

fn parse_encrypted_input(value: &JsonValue) -> Result<EncryptedInput> {
    let ty = FheType::from_utype(json_u8(value, "utype")?)?;
    let contract = parse_address_str(json_field_str(value, "contract")?)?;

    let handle = if json_field(value, "ctHash").is_some() {
        let ct_hash = U256::from_str_radix(strip_0x(json_field_str(value, "ctHash")?), 16)
            .map_err(|_| Error::ParseFailed("Invalid ciphertext hash"))?;
        CiphertextHandle::Verified {
            ct_hash,
            security_zone: json_u8(value, "securityZone")?,
            utype: ty.utype(),
            signature: hex::decode(strip_0x(json_field_str(value, "signature")?))?,
        }
    } else {
        let zone = match json_field(value, "securityZone").and_then(|v| v.get::<f64>()) {
            Some(n) if n.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(n) => {
                *n as i32
            }
            Some(n) => {
                return Err(Error::UnexpectedJsonRpc(format!(
                    "Field \"securityZone\" out of range for i32: {n}"
                )))
            }
            None => 0,
        };
        CiphertextHandle::Packed {
            data: hex::decode(strip_0x(json_field_str(value, "data")?))?,
            security_zone: zone,
        }
    };

    Ok(EncryptedInput { ty, contract, handle })
}

/// Rejections of an encryption request, local or service-side
fn encryption_error(err: Error) -> Error {
    match err {
        Error::FheNotInitialized => Error::EncryptionError(err.to_string()),
        Error::JsonRpcError((code, msg)) => match ErrorCode::from_code(code) {
            ErrorCode::NotInitialized => Error::EncryptionError(format!("Not initialized: {msg}")),
            _ => Error::EncryptionError(msg),
        },
        e => e,
    }
}

/// Service-side rejections of a permission or unseal request
fn decryption_error(err: Error) -> Error {
    match err {
        Error::JsonRpcError((code, msg)) => match ErrorCode::from_code(code) {
            ErrorCode::NotInitialized => Error::FheNotInitialized,
            ErrorCode::PermissionDenied => {
                Error::DecryptionError(format!("Permission denied: {msg}"))
            }
            _ => Error::DecryptionError(msg),
        },
        e => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_reply_parses() {
        let raw = r#"{"utype":2,"contract":"0x3804398b131366afce8b1809f8e28f0dca6a5947","data":"0xc0ffee","securityZone":0}"#;
        let input = parse_encrypted_input(&raw.parse().unwrap()).unwrap();
        assert_eq!(input.ty, FheType::Uint8);
        assert_eq!(
            input.handle,
            CiphertextHandle::Packed { data: vec![0xc0, 0xff, 0xee], security_zone: 0 }
        );
    }

    #[test]
    fn verified_reply_parses() {
        let raw = r#"{"utype":6,"contract":"0x0ea00720caa3b6a5d18683d09a75e8425934529c","ctHash":"0x2a","securityZone":0,"signature":"0x01"}"#;
        let input = parse_encrypted_input(&raw.parse().unwrap()).unwrap();
        assert_eq!(input.ty, FheType::Uint128);
        assert!(matches!(input.handle, CiphertextHandle::Verified { utype: 6, .. }));
    }

    #[test]
    fn out_of_range_reply_fields_are_rejected() {
        let raw = r#"{"utype":258,"contract":"0x3804398b131366afce8b1809f8e28f0dca6a5947","data":"0xc0ffee","securityZone":0}"#;
        let res = parse_encrypted_input(&raw.parse().unwrap());
        assert!(matches!(res, Err(Error::UnexpectedJsonRpc(_))));

        let raw = r#"{"utype":6,"contract":"0x0ea00720caa3b6a5d18683d09a75e8425934529c","ctHash":"0x2a","securityZone":256,"signature":"0x01"}"#;
        let res = parse_encrypted_input(&raw.parse().unwrap());
        assert!(matches!(res, Err(Error::UnexpectedJsonRpc(_))));

        let raw = r#"{"utype":2,"contract":"0x3804398b131366afce8b1809f8e28f0dca6a5947","data":"0xc0ffee","securityZone":4294967296}"#;
        let res = parse_encrypted_input(&raw.parse().unwrap());
        assert!(matches!(res, Err(Error::UnexpectedJsonRpc(_))));

        let raw = r#"{"utype":2,"contract":"0x3804398b131366afce8b1809f8e28f0dca6a5947","data":"0xc0ffee","securityZone":-1}"#;
        let input = parse_encrypted_input(&raw.parse().unwrap()).unwrap();
        assert!(matches!(input.handle, CiphertextHandle::Packed { security_zone: -1, .. }));
    }

    #[test]
    fn service_errors_map_to_fhe_errors() {
        let e = decryption_error(Error::JsonRpcError((-32010, "no access".into())));
        assert!(matches!(e, Error::DecryptionError(_)));
        let e = encryption_error(Error::JsonRpcError((-32011, "euint512".into())));
        assert!(matches!(e, Error::EncryptionError(_)));
        let e = encryption_error(Error::JsonRpcError((-32012, "init first".into())));
        assert!(matches!(e, Error::EncryptionError(_)));
        let e = decryption_error(Error::JsonRpcError((-32012, "init first".into())));
        assert!(matches!(e, Error::FheNotInitialized));
    }

    #[test]
    fn uninitialized_client_refuses_to_encrypt() {
        let client = FheRpcClient::new(Url::parse("http://127.0.0.1:1").unwrap());
        let res = smol::block_on(client.encrypt(Address::zero(), &[Encryptable::uint8(1)]));
        assert!(matches!(res, Err(Error::EncryptionError(_))));
    }
}

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

use tracing::debug;

use fhedex::{
    eth::Signer,
    fhe::{EncryptedInput, Encryptable},
    Error, Result,
};

use crate::{contract::ContractHandle, Fdx};

impl Fdx {
    /// Bind the FHE client to the active chain and `signer`.
    pub async fn initialize_fhe(&self, signer: &Signer) -> Result<()> {
        let chain_id = self.chain.chain_id().await?;
        self.fhe.initialize(chain_id, signer.address()).await
    }

    /// Encrypt `values` for `contract` in one request and check that the
    /// reply matches the request position by position.
    pub async fn encrypt(
        &self,
        contract: &ContractHandle,
        values: &[Encryptable],
    ) -> Result<Vec<EncryptedInput>> {
        for v in values {
            // Re-check widths; the fields are public
            Encryptable::new(v.ty, v.value)?;
        }

        let inputs = self.fhe.encrypt(contract.address, values).await?;
        debug!(
            target: "fdx::encrypt",
            "Encrypted {} value(s) for {} at {:#x}", inputs.len(), contract.name, contract.address,
        );

        if inputs.len() != values.len() {
            return Err(Error::EncryptionError(format!(
                "Requested {} ciphertexts, received {}",
                values.len(),
                inputs.len()
            )))
        }

        for (i, (input, value)) in inputs.iter().zip(values).enumerate() {
            if input.ty != value.ty {
                return Err(Error::EncryptionError(format!(
                    "Ciphertext {i} is {}, expected {}",
                    input.ty, value.ty
                )))
            }

            if input.contract != contract.address {
                return Err(Error::EncryptionError(format!(
                    "Ciphertext {i} is bound to {:#x}, expected {:#x}",
                    input.contract, contract.address
                )))
            }
        }

        Ok(inputs)
    }
}

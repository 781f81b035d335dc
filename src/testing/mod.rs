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

//! In-process doubles of the chain node, the encryption service and the
//! faucet. Contract behavior is supplied by the tests as closures over
//! raw call data, so suites can model exactly the state they assert on.
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};

use crate::{
    error::TxError,
    eth::{CallRequest, ChainClient, Receipt, Signer},
    faucet::Faucet,
    fhe::{
        CiphertextHandle, EncryptedInput, Encryptable, FheClient, FheType, Permission,
        SealedOutput,
    },
    Error, Result,
};

/// A call or transaction as seen by a mock contract
#[derive(Clone, Debug)]
pub struct MockCall {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    /// `true` for state-mutating transactions
    pub is_tx: bool,
}

/// What a mock contract answers
#[derive(Clone, Debug)]
pub enum MockReply {
    Return(Bytes),
    Revert(String),
}

pub type MockHandler = Arc<dyn Fn(&MockCall) -> MockReply + Send + Sync>;

/// A transaction accepted by [`MockChain`]
#[derive(Clone, Debug)]
pub struct SentTx {
    pub hash: H256,
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

#[derive(Default)]
struct ChainState {
    accounts: Vec<Address>,
    balances: HashMap<Address, U256>,
    handlers: HashMap<Address, MockHandler>,
    sent: Vec<SentTx>,
    receipts: HashMap<H256, Receipt>,
    /// Number of times each contract was invoked, reads included
    invocations: HashMap<Address, usize>,
    /// Reverting transactions are mined with a failed status instead
    /// of being rejected at gas estimation.
    mine_reverts: bool,
}

/// [`ChainClient`] over in-memory accounts and closure-backed contracts
pub struct MockChain {
    chain_id: u64,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id, state: Mutex::new(ChainState::default()) }
    }

    /// Add an unlocked node account with the given balance.
    pub fn add_account(&self, address: Address, balance: U256) {
        let mut state = self.state.lock().unwrap();
        state.accounts.push(address);
        state.balances.insert(address, balance);
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.lock().unwrap().balances.insert(address, balance);
    }

    pub fn deploy<F>(&self, address: Address, handler: F)
    where
        F: Fn(&MockCall) -> MockReply + Send + Sync + 'static,
    {
        self.state.lock().unwrap().handlers.insert(address, Arc::new(handler));
    }

    pub fn set_mine_reverts(&self, mine_reverts: bool) {
        self.state.lock().unwrap().mine_reverts = mine_reverts;
    }

    /// Transactions accepted so far, in submission order
    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn invocations(&self, contract: Address) -> usize {
        *self.state.lock().unwrap().invocations.get(&contract).unwrap_or(&0)
    }

    fn invoke(&self, call: &MockCall) -> Result<MockReply> {
        let handler = {
            let mut state = self.state.lock().unwrap();
            *state.invocations.entry(call.to).or_default() += 1;
            match state.handlers.get(&call.to) {
                Some(h) => h.clone(),
                None => return Ok(MockReply::Return(Bytes::new())),
            }
        };
        // The handler runs unlocked so it may call back into the chain
        Ok(handler(call))
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        Ok(*self.state.lock().unwrap().balances.get(&address).unwrap_or(&U256::zero()))
    }

    async fn call(&self, req: CallRequest) -> Result<Bytes> {
        let call = MockCall { from: req.from, to: req.to, data: req.data, is_tx: false };
        match self.invoke(&call)? {
            MockReply::Return(data) => Ok(data),
            MockReply::Revert(reason) => Err(TxError::Reverted(reason).into()),
        }
    }

    async fn send_transaction(&self, signer: &Signer, to: Address, data: Bytes) -> Result<H256> {
        let from = signer.address();
        let call = MockCall { from: Some(from), to, data: data.clone(), is_tx: true };
        let reply = self.invoke(&call)?;

        let mut state = self.state.lock().unwrap();
        let status = match reply {
            MockReply::Return(_) => true,
            MockReply::Revert(reason) if !state.mine_reverts => {
                return Err(TxError::Reverted(reason).into())
            }
            MockReply::Revert(_) => false,
        };

        let nonce = state.sent.len() as u64 + 1;
        let hash = H256::from_low_u64_be(nonce);
        state.sent.push(SentTx { hash, from, to, data });
        state.receipts.insert(
            hash,
            Receipt {
                transaction_hash: hash,
                block_number: Some(nonce),
                gas_used: Some(U256::from(21000)),
                status,
            },
        );
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: H256) -> Result<Receipt> {
        match self.state.lock().unwrap().receipts.get(&hash) {
            Some(r) => Ok(r.clone()),
            None => Err(Error::NotFound(format!("receipt {hash:#x}"))),
        }
    }
}

/// Reply manipulation used to exercise the encryptor's reply checks
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tamper {
    None,
    /// Reverse the order of the returned inputs
    Reorder,
    /// Drop the last returned input
    Truncate,
    /// Bind every returned input to the zero address
    Rebind,
}

/// Wire shape the mock encryption service produces
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MockBackend {
    Packed,
    Verified,
}

struct Ciphertext {
    ty: FheType,
    contract: Address,
    value: U256,
}

struct FheState {
    initialized: Option<(u64, Address)>,
    next_id: u64,
    ciphertexts: HashMap<u64, Ciphertext>,
    sealed: HashMap<String, U256>,
    denied: HashSet<Address>,
    encrypt_calls: usize,
    tamper: Tamper,
}

/// [`FheClient`] that keeps plaintexts in memory
pub struct MockFheClient {
    backend: MockBackend,
    state: Mutex<FheState>,
}

impl MockFheClient {
    pub fn new(backend: MockBackend) -> Self {
        Self {
            backend,
            state: Mutex::new(FheState {
                initialized: None,
                next_id: 1,
                ciphertexts: HashMap::new(),
                sealed: HashMap::new(),
                denied: HashSet::new(),
                encrypt_calls: 0,
                tamper: Tamper::None,
            }),
        }
    }

    pub fn set_tamper(&self, tamper: Tamper) {
        self.state.lock().unwrap().tamper = tamper;
    }

    /// Refuse permissions and unsealing for `contract`.
    pub fn deny(&self, contract: Address) {
        self.state.lock().unwrap().denied.insert(contract);
    }

    pub fn encrypt_calls(&self) -> usize {
        self.state.lock().unwrap().encrypt_calls
    }

    pub fn initialized(&self) -> Option<(u64, Address)> {
        self.state.lock().unwrap().initialized
    }

    /// Recover the plaintext behind a handle, as a contract would operate
    /// on it. Returns the value type, bound contract and value.
    pub fn plaintext(&self, handle: &CiphertextHandle) -> Option<(FheType, Address, U256)> {
        let id = match handle {
            CiphertextHandle::Packed { data, .. } => {
                u64::from_be_bytes(data.as_slice().try_into().ok()?)
            }
            CiphertextHandle::Verified { ct_hash, .. } => ct_hash.low_u64(),
        };
        let state = self.state.lock().unwrap();
        state.ciphertexts.get(&id).map(|c| (c.ty, c.contract, c.value))
    }

    /// Seal `value` the way a Fhenix contract would for a permitted reader.
    pub fn seal(&self, value: U256) -> String {
        let mut state = self.state.lock().unwrap();
        let sealed = format!("sealed:{}", state.next_id);
        state.next_id += 1;
        state.sealed.insert(sealed.clone(), value);
        sealed
    }

    /// Store a contract-held ciphertext and return its hash, as CoFHE
    /// contracts return from encrypted views.
    pub fn store(&self, contract: Address, ty: FheType, value: U256) -> U256 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.ciphertexts.insert(id, Ciphertext { ty, contract, value });
        U256::from(id)
    }

    fn handle_for(&self, id: u64, ty: FheType) -> CiphertextHandle {
        match self.backend {
            MockBackend::Packed => {
                CiphertextHandle::Packed { data: id.to_be_bytes().to_vec(), security_zone: 0 }
            }
            MockBackend::Verified => CiphertextHandle::Verified {
                ct_hash: U256::from(id),
                security_zone: 0,
                utype: ty.utype(),
                signature: vec![0x5a; 65],
            },
        }
    }
}

#[async_trait]
impl FheClient for MockFheClient {
    async fn initialize(&self, chain_id: u64, account: Address) -> Result<()> {
        self.state.lock().unwrap().initialized = Some((chain_id, account));
        Ok(())
    }

    async fn encrypt(
        &self,
        contract: Address,
        values: &[Encryptable],
    ) -> Result<Vec<EncryptedInput>> {
        let mut ids = vec![];
        let tamper = {
            let mut state = self.state.lock().unwrap();
            if state.initialized.is_none() {
                return Err(Error::EncryptionError("FHE client is not initialized".to_string()))
            }
            state.encrypt_calls += 1;

            for v in values {
                if !v.ty.fits(v.value) {
                    return Err(Error::EncryptionError(format!("{} does not fit {}", v.value, v.ty)))
                }
                let id = state.next_id;
                state.next_id += 1;
                state.ciphertexts.insert(id, Ciphertext { ty: v.ty, contract, value: v.value });
                ids.push((id, v.ty));
            }
            state.tamper
        };

        let mut inputs: Vec<EncryptedInput> = ids
            .into_iter()
            .map(|(id, ty)| EncryptedInput { ty, contract, handle: self.handle_for(id, ty) })
            .collect();

        match tamper {
            Tamper::None => {}
            Tamper::Reorder => inputs.reverse(),
            Tamper::Truncate => {
                inputs.pop();
            }
            Tamper::Rebind => inputs.iter_mut().for_each(|i| i.contract = Address::zero()),
        }

        Ok(inputs)
    }

    async fn permission(&self, contract: Address) -> Result<Permission> {
        let state = self.state.lock().unwrap();
        let Some((_, account)) = state.initialized else { return Err(Error::FheNotInitialized) };
        if state.denied.contains(&contract) {
            return Err(Error::DecryptionError(format!("Permission denied for {contract:#x}")))
        }
        Ok(Permission {
            contract,
            public_key: H256::from(account),
            signature: vec![0x11; 65],
        })
    }

    async fn unseal(
        &self,
        contract: Address,
        sealed: &SealedOutput,
        ty: FheType,
    ) -> Result<U256> {
        let state = self.state.lock().unwrap();
        if state.initialized.is_none() {
            return Err(Error::FheNotInitialized)
        }
        if state.denied.contains(&contract) {
            return Err(Error::DecryptionError(format!("Permission denied for {contract:#x}")))
        }

        match sealed {
            SealedOutput::Sealed(s) => state
                .sealed
                .get(s)
                .copied()
                .ok_or_else(|| Error::DecryptionError(format!("Unknown sealed value {s}"))),
            SealedOutput::Handle(h) => match state.ciphertexts.get(&h.low_u64()) {
                Some(c) if c.contract == contract && c.ty == ty => Ok(c.value),
                Some(_) => Err(Error::DecryptionError(format!(
                    "Ciphertext {h:#x} is not readable as {ty} through {contract:#x}"
                ))),
                None => Err(Error::DecryptionError(format!("Unknown ciphertext {h:#x}"))),
            },
        }
    }
}

/// [`Faucet`] recording its requests and optionally crediting a
/// [`MockChain`]
pub struct MockFaucet {
    chain: Option<Arc<MockChain>>,
    amount: U256,
    fail: bool,
    requests: Mutex<Vec<Address>>,
}

impl MockFaucet {
    pub fn new(chain: Option<Arc<MockChain>>, amount: U256) -> Self {
        Self { chain, amount, fail: false, requests: Mutex::new(vec![]) }
    }

    /// A faucet that rejects every request
    pub fn failing() -> Self {
        Self { chain: None, amount: U256::zero(), fail: true, requests: Mutex::new(vec![]) }
    }

    pub fn requests(&self) -> Vec<Address> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Faucet for MockFaucet {
    async fn request_funds(&self, address: Address) -> Result<()> {
        self.requests.lock().unwrap().push(address);
        if self.fail {
            return Err(Error::FundingError("Faucet is dry".to_string()))
        }
        if let Some(chain) = &self.chain {
            chain.set_balance(address, self.amount);
        }
        Ok(())
    }
}

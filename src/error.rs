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

// Hello developer. Please add your error to the according subsection
// that is commented, or make a new subsection. Keep it clean.

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General library errors used throughout the codebase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // ==============
    // Parsing errors
    // ==============
    #[error("Parse failed: {0}")]
    ParseFailed(&'static str),

    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    HexDecodeError(#[from] hex::FromHexError),

    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),

    #[error("Invalid value for task parameter \"{0}\": {1}")]
    InvalidTaskParam(String, String),

    // ===============
    // Encoding errors
    // ===============
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("JSON generate error: {0}")]
    JsonGenerateError(String),

    #[error("TOML deserialize error: {0}")]
    TomlDeserializeError(String),

    #[error("ABI error: {0}")]
    AbiError(String),

    // ======================
    // Network-related errors
    // ======================
    #[error("Connection to {0} failed: {1}")]
    ConnectFailed(String, String),

    #[error("Network operation failed")]
    NetworkOperationFailed,

    // ===============
    // JSON-RPC errors
    // ===============
    #[error(transparent)]
    RpcError(#[from] RpcError),

    #[error("JSON-RPC error: {0:?}")]
    JsonRpcError((i32, String)),

    #[error("Unexpected JSON-RPC data received: {0}")]
    UnexpectedJsonRpc(String),

    // =====================
    // Configuration errors
    // =====================
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Network \"{0}\" is not configured")]
    NetworkNotConfigured(String),

    // =================
    // Funding errors
    // =================
    #[error("Funding error: {0}")]
    FundingError(String),

    // =================
    // Transaction errors
    // =================
    #[error(transparent)]
    TxError(#[from] TxError),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    // ===========
    // FHE errors
    // ===========
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("FHE client is not initialized")]
    FheNotInitialized,

    // ============
    // Query errors
    // ============
    #[error("Not found: {0}")]
    NotFound(String),

    // ===========
    // Task errors
    // ===========
    #[error("Task \"{0}\" is already registered")]
    TaskAlreadyRegistered(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    // =============
    // Misc errors
    // =============
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),

    #[error("Logger initialization failed: {0}")]
    SetLoggerError(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Whether retrying the failed operation could reasonably succeed.
    /// Transport and node-side RPC failures are transient; reverts,
    /// permission and validation failures are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectFailed(..) | Self::NetworkOperationFailed | Self::Io(_) => true,
            Self::JsonRpcError((code, _)) => *code == -32603 || (-32099..=-32000).contains(code),
            Self::TxError(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// JSON-RPC object parsing errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Request and reply ID mismatch: {0} != {1}")]
    IdMismatch(u16, u16),
}

/// Transaction submission and execution failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum TxError {
    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Transaction {0} reverted on-chain")]
    RevertedOnChain(String),

    #[error("Out of gas: {0}")]
    OutOfGas(String),

    #[error("Transaction submission failed: {0}")]
    Rpc(String),
}

impl TxError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

impl From<tinyjson::JsonParseError> for Error {
    fn from(err: tinyjson::JsonParseError) -> Self {
        Self::JsonParseError(err.to_string())
    }
}

impl From<tinyjson::JsonGenerateError> for Error {
    fn from(err: tinyjson::JsonGenerateError) -> Self {
        Self::JsonGenerateError(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlDeserializeError(err.to_string())
    }
}

impl From<ethers::abi::Error> for Error {
    fn from(err: ethers::abi::Error) -> Self {
        Self::AbiError(err.to_string())
    }
}

impl From<ethers::signers::WalletError> for Error {
    fn from(err: ethers::signers::WalletError) -> Self {
        Self::SigningFailed(err.to_string())
    }
}

use thiserror::Error;

use crate::types::Market;

#[derive(Debug, Error)]
pub enum DexError {
    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy::sol_types::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// The reader reported no such market. Permanent, retrying is pointless.
    #[error("market does not exist: {0}")]
    MarketNotFound(Market),

    #[error("pool is not initialized")]
    NotInitialized,
}

impl DexError {
    /// Whether the error will not go away by retrying the same request.
    pub fn is_permanent(&self) -> bool { matches!(self, DexError::MarketNotFound(_)) }
}

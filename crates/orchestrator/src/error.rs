use chaincode_common::{bytecode::BytecodeError, ethereum::ChainError, params::StoreError};
use ethers::types::H256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The plan is malformed; nothing was broadcast.
    #[error("plan validation: {0}")]
    PlanValidation(String),

    /// A pointer or special-address tag names something that does not exist.
    /// Always a configuration error, never retried.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A path the orchestrator deliberately does not implement.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The broadcast went out but no receipt arrived within the timeout.
    /// Halts the fold; downstream steps may depend on this address.
    #[error("contract {name} took longer than {timeout_secs}s to confirm (tx {tx:#x})")]
    ConfirmationTimeout {
        name: String,
        tx: H256,
        timeout_secs: u64,
    },

    #[error("invalid bytecode hex: {0}")]
    InvalidBytecode(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bytecode(#[from] BytecodeError),

    #[error("signing: {0}")]
    Signing(#[from] ethers::signers::WalletError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

//! Keeper-side error types.
//!
//! Per-task escalation failures are classified inside the cycle and
//! reported, not raised; only faults that stop the cycle itself — a
//! broken ledger file or a workspace the engine cannot resolve —
//! surface as [`KeeperError`].

use thiserror::Error;
use workflow_types::WorkflowError;

#[derive(Debug, Error)]
pub enum KeeperError {
    /// Reading or writing the ledger file failed
    #[error("ledger i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger file exists but does not parse
    #[error("ledger serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The engine rejected the cycle itself, e.g. an unknown workspace
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

pub type KeeperResult<T> = Result<T, KeeperError>;

//! Error taxonomy for the workflow engine
//!
//! Every guard violation maps to a specific kind, never a generic
//! "operation failed" — the kind is itself actionable. A failed guard
//! leaves the entity unmutated; partial transitions are never observable.

use thiserror::Error;

/// Result alias used across the workflow crates
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// All ways a workflow operation can be rejected
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Caller identity does not satisfy the role/admin requirement
    #[error("unauthorized operation")]
    Unauthorized,

    /// Entity is not in a state from which the operation is legal
    #[error("invalid workflow transition")]
    InvalidTransition,

    /// Escalation attempted at or before the task deadline
    #[error("deadline not reached")]
    DeadlineNotReached,

    /// Result submission attempted after the task deadline
    #[error("task deadline already passed")]
    DeadlinePassed,

    /// Retry attempted with the retry count already at the bound
    #[error("retry limit exceeded")]
    RetryLimitExceeded,

    /// Template configuration violates a structural bound
    #[error("invalid template configuration: {0}")]
    InvalidTemplate(String),

    /// A retry computed a new deadline that is not strictly in the future
    #[error("computed deadline is not strictly in the future")]
    InvalidDueAt,

    /// A task references a stage index the template does not define
    #[error("invalid stage index")]
    InvalidStageIndex,

    /// The derived entity address is already occupied
    #[error("entity already exists at '{0}'")]
    AlreadyExists(String),

    /// No entity stored at the derived address
    #[error("entity not found at '{0}'")]
    NotFound(String),
}

//! Stage definitions: the steps of a workflow template
//!
//! Each stage names its kind, the role required to submit a result for
//! it, and the SLA duration used to derive task deadlines. One stage is
//! realized as one task when its turn comes.

use crate::ActorRole;
use serde::{Deserialize, Serialize};

/// What a stage represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageKind {
    /// A human reviews and approves
    ManualApproval,
    /// An operator executes work
    OperatorExecution,
    /// Final settlement of the run
    Finalization,
}

/// One step of a workflow template
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// The kind tag for this stage
    pub kind: StageKind,
    /// Role an actor must hold to submit a result for this stage
    pub required_role: ActorRole,
    /// SLA duration in seconds; task deadlines are `now + sla_seconds`
    pub sla_seconds: i64,
}

impl StageDefinition {
    pub fn new(kind: StageKind, required_role: ActorRole, sla_seconds: i64) -> Self {
        Self {
            kind,
            required_role,
            sla_seconds,
        }
    }

    /// Manual-approval stage with the conventional approver role
    pub fn manual_approval(sla_seconds: i64) -> Self {
        Self::new(StageKind::ManualApproval, ActorRole::Approver, sla_seconds)
    }

    /// Operator-execution stage with the conventional operator role
    pub fn operator_execution(sla_seconds: i64) -> Self {
        Self::new(StageKind::OperatorExecution, ActorRole::Operator, sla_seconds)
    }

    /// Finalization stage with the conventional finalizer role
    pub fn finalization(sla_seconds: i64) -> Self {
        Self::new(StageKind::Finalization, ActorRole::Finalizer, sla_seconds)
    }
}

//! Workflow domain types for Taskforge
//!
//! An approval workflow is a bounded, multi-stage pipeline:
//!
//! - A [`Workspace`] is the administrative root, owned by one admin
//!   identity. It issues sequential indexes for templates and runs.
//! - A [`WorkflowTemplate`] is an immutable definition: 1–3 stages,
//!   a retry bound, a task-count bound, and an escalation horizon.
//! - A [`WorkflowRun`] is one execution of a template, advancing
//!   monotonically through `Active → Completed → Closed`.
//! - A [`Task`] is the unit the state machine actually transitions:
//!   `InProgress`, `AwaitingApproval`, `Failed`, `Escalated`, `Completed`.
//!
//! Task and run status are closed enumerations with data-free variants.
//! Every transition is a total function over the current state plus its
//! guards, so illegal states are unrepresentable and each row of the
//! transition table is directly testable.

#![deny(unsafe_code)]

pub mod actor;
pub mod errors;
pub mod run;
pub mod stage;
pub mod task;
pub mod template;
pub mod workspace;

pub use actor::{Actor, ActorId, ActorRole};
pub use errors::{WorkflowError, WorkflowResult};
pub use run::{RunId, RunStatus, WorkflowRun};
pub use stage::{StageDefinition, StageKind};
pub use task::{Task, TaskId, TaskStatus};
pub use template::{TemplateConfig, TemplateId, WorkflowTemplate};
pub use template::{MAX_RETRY_LIMIT, MAX_STAGES, MAX_TASKS};
pub use workspace::{Workspace, WorkspaceId};

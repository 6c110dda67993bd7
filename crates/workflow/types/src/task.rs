//! Tasks: the unit the state machine transitions
//!
//! A task is created `InProgress` with an absolute deadline and moves
//! only through the four guarded operations:
//!
//! | operation       | from                  | time guard        | to                          |
//! |-----------------|-----------------------|-------------------|-----------------------------|
//! | `submit_result` | InProgress, Failed    | `now <= due_at`   | AwaitingApproval / Failed   |
//! | `approve`       | AwaitingApproval      | none              | Completed                   |
//! | `retry`         | Failed                | none              | InProgress, later deadline  |
//! | `escalate`      | not Completed/Escalated | `now > due_at`  | Escalated                   |
//!
//! The deadline boundary is exact: a submission landing at `due_at` is
//! still on time, and an escalation at `due_at` is still too early.
//! Identity and role guards live one layer up, in the engine; the task
//! itself only enforces state and time.

use crate::{ActorRole, RunId, WorkflowError, WorkflowResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ── Task Identifier ──────────────────────────────────────────────────

/// Deterministic task address: run lineage plus index
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    /// Derive the address of task `index` within `run`
    pub fn derive(run: &RunId, index: u16) -> Self {
        Self(format!("task/{}/{}", run, index))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..16.min(self.0.len())]
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Task Status ──────────────────────────────────────────────────────

/// Status of a task within the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    /// Work is under way, deadline running
    #[default]
    InProgress,
    /// A successful result awaits admin approval
    AwaitingApproval,
    /// The last submission reported failure
    Failed,
    /// The deadline passed and escalation fired
    Escalated,
    /// Approved; globally terminal
    Completed,
}

impl TaskStatus {
    /// Terminal for escalation purposes: no further transition may fire
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Escalated)
    }
}

// ── Task ─────────────────────────────────────────────────────────────

/// One execution unit of a workflow run.
///
/// Tasks are never destroyed; terminal states are retained for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Derived address of this task
    pub id: TaskId,
    /// The run this task belongs to
    pub run: RunId,
    /// 0-based index, unique within the run
    pub task_index: u16,
    /// Index of the template stage this task realizes
    pub stage_index: u8,
    /// Role required to submit a result
    pub required_role: ActorRole,
    /// Retry bound, copied from the template at creation
    pub max_retries: u8,
    /// Retries consumed so far; never exceeds `max_retries`
    pub retry_count: u8,
    /// Absolute deadline; strictly increases on every retry
    pub due_at: DateTime<Utc>,
    /// Current status
    pub status: TaskStatus,
    /// Diagnostic code from the last failed submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_code: Option<u16>,
}

impl Task {
    pub fn new(
        run: RunId,
        task_index: u16,
        stage_index: u8,
        required_role: ActorRole,
        max_retries: u8,
        due_at: DateTime<Utc>,
    ) -> Self {
        let id = TaskId::derive(&run, task_index);
        Self {
            id,
            run,
            task_index,
            stage_index,
            required_role,
            max_retries,
            retry_count: 0,
            due_at,
            status: TaskStatus::InProgress,
            last_error_code: None,
        }
    }

    /// Whether the deadline has passed. `now == due_at` is not overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }

    /// Record the outcome of an execution attempt.
    ///
    /// Legal from `InProgress` or `Failed` while `now <= due_at`. A
    /// successful result moves to `AwaitingApproval`; a failed one to
    /// `Failed`, storing `error_code` for diagnosis. Late submissions
    /// are rejected with [`WorkflowError::DeadlinePassed`] so a stale
    /// completion can never override an escalation that should fire.
    pub fn submit_result(
        &mut self,
        success: bool,
        error_code: u16,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        if now > self.due_at {
            return Err(WorkflowError::DeadlinePassed);
        }
        if !matches!(self.status, TaskStatus::InProgress | TaskStatus::Failed) {
            return Err(WorkflowError::InvalidTransition);
        }
        if success {
            self.status = TaskStatus::AwaitingApproval;
            self.last_error_code = None;
        } else {
            self.status = TaskStatus::Failed;
            self.last_error_code = Some(error_code);
        }
        Ok(())
    }

    /// Approve a result awaiting sign-off, completing the task.
    pub fn approve(&mut self) -> WorkflowResult<()> {
        if self.status != TaskStatus::AwaitingApproval {
            return Err(WorkflowError::InvalidTransition);
        }
        self.status = TaskStatus::Completed;
        Ok(())
    }

    /// Re-attempt a failed task under a fresh deadline.
    ///
    /// The bound is checked before incrementing, so `retry_count` can
    /// never pass `max_retries`. The new deadline extends from the
    /// later of `now` and the old deadline, which keeps `due_at`
    /// strictly increasing across retries; a non-positive SLA would
    /// produce a deadline not strictly in the future and is rejected
    /// with [`WorkflowError::InvalidDueAt`].
    pub fn retry(&mut self, sla_seconds: i64, now: DateTime<Utc>) -> WorkflowResult<()> {
        if self.status != TaskStatus::Failed {
            return Err(WorkflowError::InvalidTransition);
        }
        if self.retry_count >= self.max_retries {
            return Err(WorkflowError::RetryLimitExceeded);
        }
        let base = if self.due_at > now { self.due_at } else { now };
        let new_due = base + Duration::seconds(sla_seconds);
        if new_due <= base {
            return Err(WorkflowError::InvalidDueAt);
        }
        self.retry_count += 1;
        self.status = TaskStatus::InProgress;
        self.due_at = new_due;
        self.last_error_code = None;
        Ok(())
    }

    /// Escalate an overdue task.
    ///
    /// Deliberately the only operation with no identity guard: its sole
    /// gate is the externally observable fact that the deadline passed.
    /// A second call on an escalated task fails `InvalidTransition`
    /// rather than silently succeeding.
    pub fn escalate(&mut self, now: DateTime<Utc>) -> WorkflowResult<()> {
        if now <= self.due_at {
            return Err(WorkflowError::DeadlineNotReached);
        }
        if self.status.is_terminal() {
            return Err(WorkflowError::InvalidTransition);
        }
        self.status = TaskStatus::Escalated;
        Ok(())
    }
}

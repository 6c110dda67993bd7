//! Workflow runs: one execution instance of a template
//!
//! Run status is monotone: `Active → Completed → Closed`, never
//! backward and never straight from `Active` to `Closed`. A run is
//! completed when its final task completes and closed by an explicit
//! close operation; it is never destroyed.

use crate::{ActorId, TemplateId, WorkflowError, WorkflowResult, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Run Identifier ───────────────────────────────────────────────────

/// Deterministic run address: workspace lineage plus index
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Derive the address of run `index` within `workspace`
    pub fn derive(workspace: &WorkspaceId, index: u32) -> Self {
        Self(format!("run/{}/{}", workspace, index))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..16.min(self.0.len())]
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Run Status ───────────────────────────────────────────────────────

/// Lifecycle state of a workflow run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    /// Tasks are still being worked
    #[default]
    Active,
    /// The final task completed
    Completed,
    /// Explicitly closed after completion
    Closed,
}

impl RunStatus {
    /// Whether the run has left the active phase
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }
}

// ── Workflow Run ─────────────────────────────────────────────────────

/// One execution instance of a workflow template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Derived address of this run
    pub id: RunId,
    /// The workspace this run belongs to
    pub workspace: WorkspaceId,
    /// The template this run instantiates
    pub template: TemplateId,
    /// Who started the run
    pub creator: ActorId,
    /// Sequential run number within the workspace
    pub run_index: u32,
    /// Current status
    pub status: RunStatus,
    /// Index of the stage currently being worked
    pub current_stage_index: u8,
    /// When the run was started
    pub created_at: DateTime<Utc>,
    /// When the run was closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn new(
        id: RunId,
        workspace: WorkspaceId,
        template: TemplateId,
        creator: ActorId,
        run_index: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workspace,
            template,
            creator,
            run_index,
            status: RunStatus::Active,
            current_stage_index: 0,
            created_at: now,
            closed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RunStatus::Active
    }

    /// Advance to the next stage after a task completes mid-run
    pub fn advance_stage(&mut self) {
        self.current_stage_index += 1;
    }

    /// Mark the run completed once its final task completes
    pub fn complete(&mut self) -> WorkflowResult<()> {
        if self.status != RunStatus::Active {
            return Err(WorkflowError::InvalidTransition);
        }
        self.status = RunStatus::Completed;
        Ok(())
    }

    /// Close a completed run.
    ///
    /// Closing work still in flight, or closing twice, is rejected with
    /// [`WorkflowError::InvalidTransition`].
    pub fn close(&mut self, now: DateTime<Utc>) -> WorkflowResult<()> {
        if self.status != RunStatus::Completed {
            return Err(WorkflowError::InvalidTransition);
        }
        self.status = RunStatus::Closed;
        self.closed_at = Some(now);
        Ok(())
    }
}

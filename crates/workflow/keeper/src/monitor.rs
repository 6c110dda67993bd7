//! Escalation monitor: the keeper's scan/decide/act cycle
//!
//! Each cycle loads the ledger, asks the engine for the tasks still in
//! play, and drives the permissionless escalation path for every task
//! whose deadline has passed by the keeper's own clock. The keeper
//! holds no authority: the engine re-checks the deadline and state on
//! every call, and the keeper classifies rejections instead of
//! treating them as faults.

use crate::errors::KeeperResult;
use crate::ledger::{KeeperLedger, LedgerStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use workflow_engine::{Clock, SystemClock, WorkflowEngine};
use workflow_types::{RunId, TaskStatus, WorkflowError, WorkflowResult, WorkspaceId};

// ── Authority seam ───────────────────────────────────────────────────

/// A task the keeper may need to act on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTask {
    pub run: RunId,
    pub task_index: u16,
    pub due_at: DateTime<Utc>,
    pub status: TaskStatus,
}

/// What the keeper needs from the engine: enumeration of live tasks
/// and the escalation operation itself
pub trait EscalationAuthority {
    /// Non-terminal tasks of the workspace's active runs
    fn pending_tasks(&self, workspace: &WorkspaceId) -> WorkflowResult<Vec<PendingTask>>;

    /// Drive the permissionless escalation of one task
    fn escalate_task(&mut self, run: &RunId, task_index: u16) -> WorkflowResult<()>;
}

impl EscalationAuthority for WorkflowEngine {
    fn pending_tasks(&self, workspace: &WorkspaceId) -> WorkflowResult<Vec<PendingTask>> {
        // Surface an unknown workspace instead of scanning nothing.
        self.workspace(workspace)?;

        let mut pending = Vec::new();
        for run in self.runs_for_workspace(workspace) {
            if !run.is_active() {
                continue;
            }
            for task in self.tasks_for_run(&run.id) {
                if task.status.is_terminal() {
                    continue;
                }
                pending.push(PendingTask {
                    run: run.id.clone(),
                    task_index: task.task_index,
                    due_at: task.due_at,
                    status: task.status,
                });
            }
        }
        Ok(pending)
    }

    fn escalate_task(&mut self, run: &RunId, task_index: u16) -> WorkflowResult<()> {
        WorkflowEngine::escalate_task(self, run, task_index)
    }
}

// ── Cycle report ─────────────────────────────────────────────────────

/// Outcome of one keeper cycle, keyed by escalation key
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Escalations driven this cycle (or, in dry-run, would have been)
    pub escalated: Vec<String>,
    /// Rejected as `InvalidTransition`: the task reached a terminal
    /// state through another path, so the key is settled
    pub raced: Vec<String>,
    /// Rejected as `DeadlineNotReached`: the engine's clock is behind
    /// this keeper's; retried next cycle
    pub deferred: Vec<String>,
    /// Unexpected rejections, retried next cycle
    pub errors: Vec<(String, WorkflowError)>,
    /// Tasks whose key the ledger already held
    pub skipped_processed: usize,
    /// Tasks not yet overdue by the keeper's clock
    pub skipped_not_due: usize,
}

impl CycleReport {
    /// Whether the cycle acted on anything at all
    pub fn is_quiet(&self) -> bool {
        self.escalated.is_empty()
            && self.raced.is_empty()
            && self.deferred.is_empty()
            && self.errors.is_empty()
    }
}

// ── Monitor ──────────────────────────────────────────────────────────

/// The keeper loop body: one call per scheduled cycle.
///
/// In dry-run mode the monitor never calls the engine; overdue tasks
/// are still recorded as handled in the ledger.
pub struct EscalationMonitor<S: LedgerStore> {
    ledger_store: S,
    clock: Arc<dyn Clock>,
    dry_run: bool,
}

impl<S: LedgerStore> EscalationMonitor<S> {
    pub fn new(ledger_store: S) -> Self {
        Self::with_clock(ledger_store, Arc::new(SystemClock))
    }

    pub fn with_clock(ledger_store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger_store,
            clock,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one scan/decide/act cycle over `workspace`.
    ///
    /// The ledger is loaded at the start and persisted once at the end
    /// of every cycle, dry-run included, after `last_run_at` is
    /// stamped; a crash mid-cycle at worst repeats work the engine
    /// will reject anyway.
    pub fn run_cycle(
        &self,
        authority: &mut dyn EscalationAuthority,
        workspace: &WorkspaceId,
    ) -> KeeperResult<CycleReport> {
        let now = self.clock.now();
        let mut ledger = self.ledger_store.load()?;
        let mut report = CycleReport::default();

        let pending = authority.pending_tasks(workspace)?;
        tracing::debug!(
            workspace = %workspace,
            pending = pending.len(),
            dry_run = self.dry_run,
            "keeper cycle started"
        );

        for task in pending {
            let key = KeeperLedger::escalation_key(&task.run, task.task_index);

            if ledger.is_processed(&key) {
                report.skipped_processed += 1;
                continue;
            }
            if now <= task.due_at {
                tracing::debug!(
                    key = %key,
                    remaining_secs = (task.due_at - now).num_seconds(),
                    "not yet due"
                );
                report.skipped_not_due += 1;
                continue;
            }

            if self.dry_run {
                // Recorded as handled even without calling the engine,
                // so flipping a dry-run keeper live does not replay the
                // escalations it already observed.
                tracing::info!(key = %key, due_at = %task.due_at, "dry-run: would escalate");
                ledger.mark_processed(&key, now);
                report.escalated.push(key);
                continue;
            }

            match authority.escalate_task(&task.run, task.task_index) {
                Ok(()) => {
                    tracing::info!(key = %key, "escalated overdue task");
                    ledger.mark_processed(&key, now);
                    report.escalated.push(key);
                }
                Err(WorkflowError::DeadlineNotReached) => {
                    // Overdue by our clock but not the engine's; leave
                    // the key unmarked and try again next cycle.
                    tracing::debug!(key = %key, "engine says not yet due, deferring");
                    report.deferred.push(key);
                }
                Err(WorkflowError::InvalidTransition) => {
                    // Someone settled the task between scan and act.
                    tracing::debug!(key = %key, "task already terminal, settling key");
                    ledger.mark_processed(&key, now);
                    report.raced.push(key);
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "escalation rejected");
                    report.errors.push((key, err));
                }
            }
        }

        ledger.last_run_at = Some(now);
        self.ledger_store.save(&ledger)?;

        tracing::info!(
            workspace = %workspace,
            escalated = report.escalated.len(),
            deferred = report.deferred.len(),
            errors = report.errors.len(),
            "keeper cycle finished"
        );
        Ok(report)
    }
}

//! The workflow engine: authoritative guarded transitions
//!
//! Every operation reads current entity state, evaluates its guards
//! (actor, prior state, timing) and either applies the whole mutation
//! or fails with a specific [`WorkflowError`] kind. Run-status
//! advancement after a task approval happens inside the same logical
//! step as the approval, so there is no window where a task is
//! completed but its run has not yet noticed.

use crate::clock::{Clock, SystemClock};
use crate::store::EntityStore;
use chrono::Duration;
use std::sync::Arc;
use workflow_types::{
    Actor, RunId, Task, TaskId, TemplateConfig, TemplateId, WorkflowError, WorkflowResult,
    WorkflowRun, WorkflowTemplate, Workspace, WorkspaceId,
};

/// The authoritative state machine over workspaces, templates, runs,
/// and tasks
pub struct WorkflowEngine {
    store: EntityStore,
    clock: Arc<dyn Clock>,
}

impl WorkflowEngine {
    /// Engine on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Engine on a caller-supplied clock (tests drive a manual one)
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: EntityStore::new(),
            clock,
        }
    }

    // ── Workspace Registry ───────────────────────────────────────────

    /// Create a workspace controlled by `admin`.
    ///
    /// The caller-supplied `workspace_id` is stored but not
    /// interpreted; the workspace address derives from the admin
    /// identity, so a second create for the same admin fails with
    /// [`WorkflowError::AlreadyExists`].
    pub fn create_workspace(&mut self, admin: &Actor, workspace_id: u64) -> WorkflowResult<WorkspaceId> {
        let now = self.clock.now();
        let workspace = Workspace::new(admin.id.clone(), workspace_id, now);
        let id = workspace.id();
        self.store.create_workspace(id.clone(), workspace)?;

        tracing::info!(workspace = %id, admin = %admin.id, "workspace created");
        Ok(id)
    }

    // ── Template Catalog ─────────────────────────────────────────────

    /// Create an immutable template at the workspace's next index.
    ///
    /// Admin-only. The configuration bounds are validated before
    /// anything is stored; a violation fails with
    /// [`WorkflowError::InvalidTemplate`] and consumes no index.
    pub fn create_template(
        &mut self,
        admin: &Actor,
        workspace: &WorkspaceId,
        config: TemplateConfig,
    ) -> WorkflowResult<TemplateId> {
        let now = self.clock.now();
        let ws = self.store.workspace(workspace)?;
        if !ws.is_admin(&admin.id) {
            return Err(WorkflowError::Unauthorized);
        }

        let id = TemplateId::derive(workspace, ws.template_count);
        let template = WorkflowTemplate::new(
            id.clone(),
            workspace.clone(),
            admin.id.clone(),
            config,
            now,
        );
        template.validate()?;

        self.store.create_template(id.clone(), template)?;
        self.store.workspace_mut(workspace)?.next_template_index();

        tracing::info!(template = %id, "template created");
        Ok(id)
    }

    // ── Run Lifecycle ────────────────────────────────────────────────

    /// Start a run of `template` and spawn its first task.
    ///
    /// Any actor may start a run. The first task realizes stage 0 with
    /// `due_at = now + stages[0].sla_seconds` and the template's retry
    /// bound.
    pub fn start_workflow_run(
        &mut self,
        creator: &Actor,
        workspace: &WorkspaceId,
        template: &TemplateId,
    ) -> WorkflowResult<RunId> {
        let now = self.clock.now();
        let ws = self.store.workspace(workspace)?;
        let run_index = ws.run_count;

        let tpl = self.store.template(template)?;
        if &tpl.workspace != workspace {
            return Err(WorkflowError::InvalidTemplate(
                "template belongs to another workspace".into(),
            ));
        }
        let first_stage = *tpl.stage(0)?;
        let retry_limit = tpl.retry_limit;

        let run_id = RunId::derive(workspace, run_index);
        let run = WorkflowRun::new(
            run_id.clone(),
            workspace.clone(),
            template.clone(),
            creator.id.clone(),
            run_index,
            now,
        );

        let first_task = Task::new(
            run_id.clone(),
            0,
            0,
            first_stage.required_role,
            retry_limit,
            now + Duration::seconds(first_stage.sla_seconds),
        );
        let first_task_id = first_task.id.clone();

        self.store.create_run(run_id.clone(), run)?;
        self.store.create_task(first_task_id.clone(), first_task)?;
        self.store.workspace_mut(workspace)?.next_run_index();

        tracing::info!(
            run = %run_id,
            task = %first_task_id,
            creator = %creator.id,
            "workflow run started"
        );
        Ok(run_id)
    }

    /// Close a completed run.
    ///
    /// Only the workspace admin or the run creator may close, and only
    /// once the run is `Completed` — closing work still in flight, or
    /// closing twice, fails with [`WorkflowError::InvalidTransition`].
    pub fn close_run(&mut self, actor: &Actor, run: &RunId) -> WorkflowResult<()> {
        let now = self.clock.now();
        let r = self.store.run(run)?;
        let ws = self.store.workspace(&r.workspace)?;
        if !ws.is_admin(&actor.id) && actor.id != r.creator {
            return Err(WorkflowError::Unauthorized);
        }

        self.store.run_mut(run)?.close(now)?;
        tracing::info!(run = %run, actor = %actor.id, "run closed");
        Ok(())
    }

    // ── Task State Machine ───────────────────────────────────────────

    /// Record the outcome of an execution attempt on a task.
    ///
    /// The actor must be the run creator, the workspace admin, or hold
    /// the stage's required role. The submission must land at or
    /// before the deadline and the task must be `InProgress` or
    /// `Failed`.
    pub fn submit_task_result(
        &mut self,
        actor: &Actor,
        run: &RunId,
        task_index: u16,
        success: bool,
        error_code: u16,
    ) -> WorkflowResult<()> {
        let now = self.clock.now();
        let r = self.store.run(run)?;
        let ws = self.store.workspace(&r.workspace)?;
        let creator = r.creator.clone();
        let admin = ws.admin.clone();

        let task_id = TaskId::derive(run, task_index);
        let required_role = self.store.task(&task_id)?.required_role;
        if actor.id != creator && actor.id != admin && actor.role != required_role {
            return Err(WorkflowError::Unauthorized);
        }

        let task = self.store.task_mut(&task_id)?;
        task.submit_result(success, error_code, now)?;

        if success {
            tracing::info!(task = %task_id, "task result submitted, awaiting approval");
        } else {
            tracing::warn!(task = %task_id, error_code, "task failed");
        }
        Ok(())
    }

    /// Approve a task awaiting sign-off, advancing the run.
    ///
    /// Admin-only. Within the same step the run either spawns the next
    /// stage's task with a fresh deadline, or — when the approved task
    /// realized the final stage — transitions to `Completed`. Returns
    /// the spawned task's id, if any.
    pub fn approve_task(
        &mut self,
        actor: &Actor,
        run: &RunId,
        task_index: u16,
    ) -> WorkflowResult<Option<TaskId>> {
        let now = self.clock.now();
        let r = self.store.run(run)?;
        let ws = self.store.workspace(&r.workspace)?;
        if !ws.is_admin(&actor.id) {
            return Err(WorkflowError::Unauthorized);
        }
        let template_id = r.template.clone();

        let task_id = TaskId::derive(run, task_index);
        let stage_index = self.store.task(&task_id)?.stage_index;

        // Resolve the advancement before mutating anything, so a bad
        // successor leaves both task and run untouched.
        let template = self.store.template(&template_id)?;
        let successor = if template.is_final_stage(stage_index) {
            None
        } else {
            let next_index = task_index
                .checked_add(1)
                .ok_or(WorkflowError::InvalidTransition)?;
            if next_index >= template.max_tasks {
                return Err(WorkflowError::InvalidTransition);
            }
            let next_stage = *template.stage(stage_index + 1)?;
            Some((next_index, stage_index + 1, next_stage, template.retry_limit))
        };

        self.store.task_mut(&task_id)?.approve()?;

        match successor {
            None => {
                self.store.run_mut(run)?.complete()?;
                tracing::info!(run = %run, task = %task_id, "final task approved, run completed");
                Ok(None)
            }
            Some((next_index, next_stage_index, stage, retry_limit)) => {
                let next_task = Task::new(
                    run.clone(),
                    next_index,
                    next_stage_index,
                    stage.required_role,
                    retry_limit,
                    now + Duration::seconds(stage.sla_seconds),
                );
                let next_task_id = next_task.id.clone();
                self.store.create_task(next_task_id.clone(), next_task)?;
                self.store.run_mut(run)?.advance_stage();

                tracing::info!(
                    run = %run,
                    task = %task_id,
                    next_task = %next_task_id,
                    "task approved, next stage spawned"
                );
                Ok(Some(next_task_id))
            }
        }
    }

    /// Re-attempt a failed task under a fresh, strictly later deadline.
    ///
    /// Admin-gated: re-attempting failed work carries elevated
    /// accountability, distinct from who attempted it. The bound check
    /// happens before the increment against the stored count.
    pub fn retry_task(&mut self, actor: &Actor, run: &RunId, task_index: u16) -> WorkflowResult<()> {
        let now = self.clock.now();
        let r = self.store.run(run)?;
        let ws = self.store.workspace(&r.workspace)?;
        if !ws.is_admin(&actor.id) {
            return Err(WorkflowError::Unauthorized);
        }
        let template_id = r.template.clone();

        let task_id = TaskId::derive(run, task_index);
        let stage_index = self.store.task(&task_id)?.stage_index;
        let sla_seconds = self.store.template(&template_id)?.stage(stage_index)?.sla_seconds;

        let task = self.store.task_mut(&task_id)?;
        task.retry(sla_seconds, now)?;

        tracing::info!(
            task = %task_id,
            retry_count = task.retry_count,
            due_at = %task.due_at,
            "task retried"
        );
        Ok(())
    }

    /// Escalate an overdue task.
    ///
    /// Permissionless: no identity parameter exists. The only gates
    /// are the deadline (`now > due_at`) and the task not already
    /// being terminal, which is what lets an untrusted monitor drive
    /// escalation.
    pub fn escalate_task(&mut self, run: &RunId, task_index: u16) -> WorkflowResult<()> {
        let now = self.clock.now();
        self.store.run(run)?;

        let task_id = TaskId::derive(run, task_index);
        let task = self.store.task_mut(&task_id)?;
        task.escalate(now)?;

        tracing::warn!(task = %task_id, "task escalated");
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn workspace(&self, id: &WorkspaceId) -> WorkflowResult<&Workspace> {
        self.store.workspace(id)
    }

    pub fn template(&self, id: &TemplateId) -> WorkflowResult<&WorkflowTemplate> {
        self.store.template(id)
    }

    pub fn run(&self, id: &RunId) -> WorkflowResult<&WorkflowRun> {
        self.store.run(id)
    }

    pub fn task(&self, run: &RunId, task_index: u16) -> WorkflowResult<&Task> {
        self.store.task(&TaskId::derive(run, task_index))
    }

    /// All runs of a workspace, ordered by run index
    pub fn runs_for_workspace(&self, workspace: &WorkspaceId) -> Vec<&WorkflowRun> {
        self.store.runs_of(workspace)
    }

    /// All tasks of a run, ordered by task index
    pub fn tasks_for_run(&self, run: &RunId) -> Vec<&Task> {
        self.store.tasks_of(run)
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

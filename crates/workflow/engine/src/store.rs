//! Entity store: atomic whole-entity storage at derived addresses
//!
//! Realizes the persistence contract the state machine needs: every
//! entity lives at a deterministic address derived from its lineage
//! (`workspace/{admin}`, `template/{workspace}/{index}`,
//! `run/{workspace}/{index}`, `task/{run}/{index}`), creation rejects
//! an occupied address, and lookups report a missing entity distinctly.
//! Each entity kind has its own typed map, so "exists but wrong kind"
//! is unrepresentable rather than a runtime error.
//!
//! Relationships are plain identifier references — children never hold
//! a pointer back to their parent, only its address.

use std::collections::HashMap;
use workflow_types::{
    RunId, Task, TaskId, TemplateId, WorkflowError, WorkflowResult, WorkflowRun, WorkflowTemplate,
    Workspace, WorkspaceId,
};

/// In-memory entity storage for the workflow engine
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    workspaces: HashMap<WorkspaceId, Workspace>,
    templates: HashMap<TemplateId, WorkflowTemplate>,
    runs: HashMap<RunId, WorkflowRun>,
    tasks: HashMap<TaskId, Task>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Workspaces ───────────────────────────────────────────────────

    pub fn create_workspace(&mut self, id: WorkspaceId, workspace: Workspace) -> WorkflowResult<()> {
        if self.workspaces.contains_key(&id) {
            return Err(WorkflowError::AlreadyExists(id.0));
        }
        self.workspaces.insert(id, workspace);
        Ok(())
    }

    pub fn workspace(&self, id: &WorkspaceId) -> WorkflowResult<&Workspace> {
        self.workspaces
            .get(id)
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    pub fn workspace_mut(&mut self, id: &WorkspaceId) -> WorkflowResult<&mut Workspace> {
        self.workspaces
            .get_mut(id)
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    // ── Templates ────────────────────────────────────────────────────

    pub fn create_template(
        &mut self,
        id: TemplateId,
        template: WorkflowTemplate,
    ) -> WorkflowResult<()> {
        if self.templates.contains_key(&id) {
            return Err(WorkflowError::AlreadyExists(id.0));
        }
        self.templates.insert(id, template);
        Ok(())
    }

    pub fn template(&self, id: &TemplateId) -> WorkflowResult<&WorkflowTemplate> {
        self.templates
            .get(id)
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    // ── Runs ─────────────────────────────────────────────────────────

    pub fn create_run(&mut self, id: RunId, run: WorkflowRun) -> WorkflowResult<()> {
        if self.runs.contains_key(&id) {
            return Err(WorkflowError::AlreadyExists(id.0));
        }
        self.runs.insert(id, run);
        Ok(())
    }

    pub fn run(&self, id: &RunId) -> WorkflowResult<&WorkflowRun> {
        self.runs
            .get(id)
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    pub fn run_mut(&mut self, id: &RunId) -> WorkflowResult<&mut WorkflowRun> {
        self.runs
            .get_mut(id)
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    /// All runs belonging to a workspace, ordered by run index
    pub fn runs_of(&self, workspace: &WorkspaceId) -> Vec<&WorkflowRun> {
        let mut runs: Vec<&WorkflowRun> = self
            .runs
            .values()
            .filter(|r| &r.workspace == workspace)
            .collect();
        runs.sort_by_key(|r| r.run_index);
        runs
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(&mut self, id: TaskId, task: Task) -> WorkflowResult<()> {
        if self.tasks.contains_key(&id) {
            return Err(WorkflowError::AlreadyExists(id.0));
        }
        self.tasks.insert(id, task);
        Ok(())
    }

    pub fn task(&self, id: &TaskId) -> WorkflowResult<&Task> {
        self.tasks
            .get(id)
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    pub fn task_mut(&mut self, id: &TaskId) -> WorkflowResult<&mut Task> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    /// All tasks belonging to a run, ordered by task index
    pub fn tasks_of(&self, run: &RunId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().filter(|t| &t.run == run).collect();
        tasks.sort_by_key(|t| t.task_index);
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use workflow_types::{Actor, ActorId, ActorRole};

    fn make_workspace(admin: &str) -> (WorkspaceId, Workspace) {
        let actor = Actor::admin(admin);
        let ws = Workspace::new(actor.id.clone(), 1, Utc::now());
        (ws.id(), ws)
    }

    #[test]
    fn test_create_rejects_occupied_address() {
        let mut store = EntityStore::new();
        let (id, ws) = make_workspace("alice");
        store.create_workspace(id.clone(), ws.clone()).unwrap();

        let err = store.create_workspace(id.clone(), ws).unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyExists(_)));
    }

    #[test]
    fn test_missing_entity_is_not_found() {
        let store = EntityStore::new();
        let err = store
            .workspace(&WorkspaceId::new("workspace/nobody"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[test]
    fn test_runs_of_filters_and_orders() {
        let mut store = EntityStore::new();
        let (ws_id, ws) = make_workspace("alice");
        store.create_workspace(ws_id.clone(), ws).unwrap();

        let template = TemplateId::derive(&ws_id, 0);
        for index in [2u32, 0, 1] {
            let id = RunId::derive(&ws_id, index);
            let run = WorkflowRun::new(
                id.clone(),
                ws_id.clone(),
                template.clone(),
                ActorId::new("creator"),
                index,
                Utc::now(),
            );
            store.create_run(id, run).unwrap();
        }

        let other_ws = WorkspaceId::new("workspace/bob");
        let stray = RunId::derive(&other_ws, 0);
        store
            .create_run(
                stray.clone(),
                WorkflowRun::new(
                    stray,
                    other_ws,
                    template,
                    ActorId::new("creator"),
                    0,
                    Utc::now(),
                ),
            )
            .unwrap();

        let runs = store.runs_of(&ws_id);
        assert_eq!(runs.len(), 3);
        assert_eq!(
            runs.iter().map(|r| r.run_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_tasks_of_orders_by_index() {
        let mut store = EntityStore::new();
        let ws_id = WorkspaceId::new("workspace/alice");
        let run_id = RunId::derive(&ws_id, 0);

        for index in [1u16, 0] {
            let task = Task::new(
                run_id.clone(),
                index,
                index as u8,
                ActorRole::Operator,
                1,
                Utc::now(),
            );
            store.create_task(task.id.clone(), task).unwrap();
        }

        let tasks = store.tasks_of(&run_id);
        assert_eq!(
            tasks.iter().map(|t| t.task_index).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }
}

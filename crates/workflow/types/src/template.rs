//! Workflow templates: immutable definitions of bounded pipelines
//!
//! A template fixes the stages, retry bound, task-count bound, and
//! escalation horizon for every run spawned from it. The bounds are
//! hard ceilings, not soft defaults: they cap the worst-case size and
//! cost of any run of this template. Templates are never mutated after
//! creation; there is no update operation.

use crate::{ActorId, StageDefinition, WorkflowError, WorkflowResult, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of stages a template may define
pub const MAX_STAGES: usize = 3;
/// Maximum number of tasks a run may spawn
pub const MAX_TASKS: u16 = 20;
/// Maximum retry bound a template may grant
pub const MAX_RETRY_LIMIT: u8 = 3;

// ── Template Identifier ──────────────────────────────────────────────

/// Deterministic template address: workspace lineage plus index
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl TemplateId {
    /// Derive the address of template `index` within `workspace`
    pub fn derive(workspace: &WorkspaceId, index: u32) -> Self {
        Self(format!("template/{}/{}", workspace, index))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Template Configuration ───────────────────────────────────────────

/// Caller-supplied configuration for a new template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Bound on tasks a run of this template may spawn (1..=20)
    pub max_tasks: u16,
    /// Bound on retries per task (0..=3)
    pub retry_limit: u8,
    /// Default SLA horizon in seconds; must be positive
    pub escalation_seconds: i64,
    /// Ordered stages, 1..=3
    pub stages: Vec<StageDefinition>,
}

// ── Workflow Template ────────────────────────────────────────────────

/// An immutable workflow definition scoped to its workspace
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    /// Derived address of this template
    pub id: TemplateId,
    /// The workspace this template belongs to
    pub workspace: WorkspaceId,
    /// The admin who created it
    pub creator: ActorId,
    /// Bound on tasks a run may spawn
    pub max_tasks: u16,
    /// Retry bound copied into each task at creation
    pub retry_limit: u8,
    /// Default SLA horizon in seconds
    pub escalation_seconds: i64,
    /// Ordered stages
    pub stages: Vec<StageDefinition>,
    /// When the template was created
    pub created_at: DateTime<Utc>,
}

impl WorkflowTemplate {
    pub fn new(
        id: TemplateId,
        workspace: WorkspaceId,
        creator: ActorId,
        config: TemplateConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workspace,
            creator,
            max_tasks: config.max_tasks,
            retry_limit: config.retry_limit,
            escalation_seconds: config.escalation_seconds,
            stages: config.stages,
            created_at: now,
        }
    }

    /// Validate the structural bounds, in the order they are specified.
    ///
    /// Each bound is a hard ceiling. A violation fails with
    /// [`WorkflowError::InvalidTemplate`] and nothing is stored.
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.stages.is_empty() || self.stages.len() > MAX_STAGES {
            return Err(WorkflowError::InvalidTemplate(format!(
                "stage count must be 1..={}, got {}",
                MAX_STAGES,
                self.stages.len()
            )));
        }
        if self.retry_limit > MAX_RETRY_LIMIT {
            return Err(WorkflowError::InvalidTemplate(format!(
                "retry limit must be <= {}, got {}",
                MAX_RETRY_LIMIT, self.retry_limit
            )));
        }
        if self.max_tasks == 0 || self.max_tasks > MAX_TASKS {
            return Err(WorkflowError::InvalidTemplate(format!(
                "max tasks must be 1..={}, got {}",
                MAX_TASKS, self.max_tasks
            )));
        }
        if self.escalation_seconds <= 0 {
            return Err(WorkflowError::InvalidTemplate(format!(
                "escalation horizon must be positive, got {}",
                self.escalation_seconds
            )));
        }
        // A non-positive SLA would spawn tasks already overdue, whose
        // retries can only dead-end in InvalidDueAt.
        for (index, stage) in self.stages.iter().enumerate() {
            if stage.sla_seconds <= 0 {
                return Err(WorkflowError::InvalidTemplate(format!(
                    "stage {} SLA must be positive, got {}",
                    index, stage.sla_seconds
                )));
            }
        }
        Ok(())
    }

    /// Number of stages in this template
    pub fn stage_count(&self) -> u8 {
        self.stages.len() as u8
    }

    /// Stage at `index`, or [`WorkflowError::InvalidStageIndex`]
    pub fn stage(&self, index: u8) -> WorkflowResult<&StageDefinition> {
        self.stages
            .get(index as usize)
            .ok_or(WorkflowError::InvalidStageIndex)
    }

    /// Whether `index` is the final stage of this template
    pub fn is_final_stage(&self, index: u8) -> bool {
        index as usize + 1 >= self.stages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StageKind;

    fn make_template(config: TemplateConfig) -> WorkflowTemplate {
        let workspace = WorkspaceId::new("workspace/admin-1");
        WorkflowTemplate::new(
            TemplateId::derive(&workspace, 0),
            workspace,
            ActorId::new("admin-1"),
            config,
            Utc::now(),
        )
    }

    fn valid_config() -> TemplateConfig {
        TemplateConfig {
            max_tasks: 5,
            retry_limit: 3,
            escalation_seconds: 3600,
            stages: vec![
                StageDefinition::operator_execution(300),
                StageDefinition::manual_approval(600),
            ],
        }
    }

    #[test]
    fn test_valid_template() {
        let template = make_template(valid_config());
        assert!(template.validate().is_ok());
        assert_eq!(template.stage_count(), 2);
    }

    #[test]
    fn test_retry_limit_ceiling() {
        // retry_limit = 5 is rejected; the same request at 3 succeeds.
        let mut config = valid_config();
        config.retry_limit = 5;
        let rejected = make_template(config);
        assert!(matches!(
            rejected.validate(),
            Err(WorkflowError::InvalidTemplate(_))
        ));

        let mut config = valid_config();
        config.retry_limit = 3;
        assert!(make_template(config).validate().is_ok());
    }

    #[test]
    fn test_stage_count_bounds() {
        let mut config = valid_config();
        config.stages.clear();
        assert!(make_template(config).validate().is_err());

        let mut config = valid_config();
        config.stages = vec![StageDefinition::manual_approval(60); 4];
        assert!(make_template(config).validate().is_err());

        let mut config = valid_config();
        config.stages = vec![StageDefinition::manual_approval(60); 3];
        assert!(make_template(config).validate().is_ok());
    }

    #[test]
    fn test_max_tasks_bounds() {
        let mut config = valid_config();
        config.max_tasks = 0;
        assert!(make_template(config).validate().is_err());

        let mut config = valid_config();
        config.max_tasks = 21;
        assert!(make_template(config).validate().is_err());

        let mut config = valid_config();
        config.max_tasks = 20;
        assert!(make_template(config).validate().is_ok());
    }

    #[test]
    fn test_escalation_horizon_must_be_positive() {
        let mut config = valid_config();
        config.escalation_seconds = 0;
        assert!(make_template(config).validate().is_err());
    }

    #[test]
    fn test_stage_sla_must_be_positive() {
        let mut config = valid_config();
        config.stages[1] = StageDefinition::manual_approval(0);
        assert!(matches!(
            make_template(config).validate(),
            Err(WorkflowError::InvalidTemplate(_))
        ));

        let mut config = valid_config();
        config.stages[0] = StageDefinition::operator_execution(-60);
        assert!(make_template(config).validate().is_err());
    }

    #[test]
    fn test_stage_lookup() {
        let template = make_template(valid_config());
        assert_eq!(template.stage(0).unwrap().kind, StageKind::OperatorExecution);
        assert_eq!(template.stage(1).unwrap().kind, StageKind::ManualApproval);
        assert!(matches!(
            template.stage(2),
            Err(WorkflowError::InvalidStageIndex)
        ));
    }

    #[test]
    fn test_final_stage() {
        let template = make_template(valid_config());
        assert!(!template.is_final_stage(0));
        assert!(template.is_final_stage(1));
    }

    #[test]
    fn test_derived_id() {
        let ws = WorkspaceId::new("workspace/admin-1");
        assert_eq!(TemplateId::derive(&ws, 3).0, "template/workspace/admin-1/3");
    }
}

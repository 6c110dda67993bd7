//! Workspaces: the administrative root of the workflow hierarchy
//!
//! A workspace is owned by exactly one admin identity and issues the
//! sequential indexes used to address the templates and runs created
//! within it. Counts only increase, and each count value is consumed
//! exactly once as the index of the next child.

use crate::ActorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Workspace Identifier ─────────────────────────────────────────────

/// Deterministic workspace address, derived from the admin identity
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub String);

impl WorkspaceId {
    /// Derive the address for the workspace owned by `admin`
    pub fn for_admin(admin: &ActorId) -> Self {
        Self(format!("workspace/{}", admin))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..16.min(self.0.len())]
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Workspace ────────────────────────────────────────────────────────

/// Administrative boundary owning templates and runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// The permanent controller of this workspace
    pub admin: ActorId,
    /// Caller-supplied identifier, stored but not interpreted
    pub workspace_id: u64,
    /// Index the next created template will occupy
    pub template_count: u32,
    /// Index the next created run will occupy
    pub run_count: u32,
    /// When the workspace was created
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(admin: ActorId, workspace_id: u64, now: DateTime<Utc>) -> Self {
        Self {
            admin,
            workspace_id,
            template_count: 0,
            run_count: 0,
            created_at: now,
        }
    }

    /// The derived address of this workspace
    pub fn id(&self) -> WorkspaceId {
        WorkspaceId::for_admin(&self.admin)
    }

    pub fn is_admin(&self, actor: &ActorId) -> bool {
        &self.admin == actor
    }

    /// Consume the next template index. Each value is handed out once.
    pub fn next_template_index(&mut self) -> u32 {
        let index = self.template_count;
        self.template_count += 1;
        index
    }

    /// Consume the next run index. Each value is handed out once.
    pub fn next_run_index(&mut self) -> u32 {
        let index = self.run_count;
        self.run_count += 1;
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_workspace() -> Workspace {
        Workspace::new(ActorId::new("admin-1"), 42, Utc::now())
    }

    #[test]
    fn test_new_workspace_counts_start_at_zero() {
        let ws = make_workspace();
        assert_eq!(ws.template_count, 0);
        assert_eq!(ws.run_count, 0);
        assert_eq!(ws.workspace_id, 42);
    }

    #[test]
    fn test_indexes_are_sequential_and_consumed_once() {
        let mut ws = make_workspace();
        assert_eq!(ws.next_template_index(), 0);
        assert_eq!(ws.next_template_index(), 1);
        assert_eq!(ws.template_count, 2);

        assert_eq!(ws.next_run_index(), 0);
        assert_eq!(ws.next_run_index(), 1);
        assert_eq!(ws.next_run_index(), 2);
        assert_eq!(ws.run_count, 3);
    }

    #[test]
    fn test_admin_check() {
        let ws = make_workspace();
        assert!(ws.is_admin(&ActorId::new("admin-1")));
        assert!(!ws.is_admin(&ActorId::new("mallory")));
    }

    #[test]
    fn test_derived_id() {
        let ws = make_workspace();
        assert_eq!(ws.id(), WorkspaceId::for_admin(&ActorId::new("admin-1")));
        assert_eq!(ws.id().0, "workspace/admin-1");
    }
}

//! Authoritative workflow engine for Taskforge
//!
//! The engine owns every state transition. No caller — including the
//! escalation keeper that detects overdue work — can move an entity
//! into a state the rules forbid. Each operation checks actor, prior
//! state, and timing against current entity state and either applies
//! the whole mutation or fails with a specific [`WorkflowError`] kind,
//! leaving the entity untouched.
//!
//! # Architecture
//!
//! - [`EntityStore`] — atomic whole-entity read-modify-write keyed by
//!   addresses derived from `(kind, parent lineage, index)`
//! - [`Clock`] — second-granularity time source, swappable in tests
//! - [`WorkflowEngine`] — the eight guarded operations:
//!   `create_workspace`, `create_template`, `start_workflow_run`,
//!   `submit_task_result`, `approve_task`, `retry_task`,
//!   `escalate_task`, `close_run`
//!
//! # Example
//!
//! ```rust
//! use workflow_engine::WorkflowEngine;
//! use workflow_types::{Actor, StageDefinition, TemplateConfig};
//!
//! let mut engine = WorkflowEngine::new();
//! let admin = Actor::admin("alice");
//!
//! let workspace = engine.create_workspace(&admin, 1).unwrap();
//! let template = engine
//!     .create_template(&admin, &workspace, TemplateConfig {
//!         max_tasks: 5,
//!         retry_limit: 2,
//!         escalation_seconds: 3600,
//!         stages: vec![StageDefinition::manual_approval(300)],
//!     })
//!     .unwrap();
//!
//! let run = engine.start_workflow_run(&admin, &workspace, &template).unwrap();
//! assert!(engine.run(&run).unwrap().is_active());
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod engine;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::WorkflowEngine;
pub use store::EntityStore;

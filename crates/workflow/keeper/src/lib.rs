//! Escalation keeper for Taskforge
//!
//! A scheduled process that watches active runs and drives the
//! permissionless `escalate_task` path for any task whose deadline has
//! passed. The keeper is untrusted by construction: the engine
//! re-validates every call, so a buggy or malicious keeper can cause
//! no transition the rules forbid. What the keeper adds on top is
//! operational discipline:
//!
//! - an idempotency [`KeeperLedger`], persisted between cycles, so a
//!   restarted keeper does not re-issue escalations it already drove
//! - classification of engine rejections into benign races, clock-skew
//!   deferrals, and genuine faults ([`CycleReport`])
//! - a dry-run mode that reports what would be escalated without
//!   calling the engine, while still recording each observation in the
//!   ledger so a later live keeper does not replay it
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use workflow_engine::{ManualClock, WorkflowEngine};
//! use workflow_keeper::{EscalationMonitor, InMemoryLedger};
//! use workflow_types::{Actor, StageDefinition, TemplateConfig};
//!
//! let clock = ManualClock::new(chrono::Utc::now());
//! let mut engine = WorkflowEngine::with_clock(Arc::new(clock.clone()));
//! let admin = Actor::admin("alice");
//!
//! let workspace = engine.create_workspace(&admin, 1).unwrap();
//! let template = engine
//!     .create_template(&admin, &workspace, TemplateConfig {
//!         max_tasks: 5,
//!         retry_limit: 1,
//!         escalation_seconds: 3600,
//!         stages: vec![StageDefinition::operator_execution(300)],
//!     })
//!     .unwrap();
//! engine.start_workflow_run(&admin, &workspace, &template).unwrap();
//!
//! clock.advance_secs(301);
//! let monitor = EscalationMonitor::with_clock(InMemoryLedger::new(), Arc::new(clock));
//! let report = monitor.run_cycle(&mut engine, &workspace).unwrap();
//! assert_eq!(report.escalated.len(), 1);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod ledger;
pub mod monitor;

pub use errors::{KeeperError, KeeperResult};
pub use ledger::{InMemoryLedger, JsonFileLedger, KeeperLedger, LedgerStore};
pub use monitor::{CycleReport, EscalationAuthority, EscalationMonitor, PendingTask};

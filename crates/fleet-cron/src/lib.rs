//! fleet-cron: recurring workflow triggers
//!
//! This crate turns `on.schedule` entries of a workflow into running timers:
//! - Cron expression validation and next-run computation
//! - Extraction of cron triggers from workflow definitions
//! - The [`CronManager`] registry of scheduled workflows
//! - Human-readable descriptions of common expressions

pub mod describe;
pub mod expr;
pub mod handler;
pub mod manager;
pub mod triggers;

pub use describe::describe_cron;
pub use handler::{DispatchHandler, TriggerHandler};
pub use manager::{CronManager, ScheduleReport};
pub use triggers::{TriggerParser, WorkflowTriggers, YamlTriggerParser};

//! Cron trigger extraction from workflow definitions
//!
//! Only the `on.schedule` section is read:
//!
//! ```yaml
//! on:
//!   push:
//!     branches: [main]
//!   schedule:
//!     - cron: "0 0 * * *"
//!     - cron: "*/15 * * * *"
//! ```

use fleet_core::{FleetError, FleetResult};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Triggers relevant to the cron manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTriggers {
    /// Cron expressions, in the order written; empty means nothing to schedule
    pub schedule: Vec<String>,
}

/// Extracts triggers from a raw workflow definition
pub trait TriggerParser: Send + Sync {
    /// Parse the trigger section of `definition`
    fn parse_triggers(&self, definition: &str) -> FleetResult<WorkflowTriggers>;
}

/// Parser for YAML workflow definitions
#[derive(Debug, Default)]
pub struct YamlTriggerParser;

impl TriggerParser for YamlTriggerParser {
    fn parse_triggers(&self, definition: &str) -> FleetResult<WorkflowTriggers> {
        let document: Value = serde_yaml::from_str(definition)?;

        let on = match &document {
            Value::Mapping(root) => root.get("on"),
            Value::Null => None,
            _ => {
                return Err(FleetError::Workflow(
                    "Workflow definition must be a mapping".to_string(),
                ))
            }
        };

        // `on: push` and `on: [push, pull_request]` carry no schedule.
        let schedule = match on {
            Some(Value::Mapping(on)) => on.get("schedule"),
            _ => None,
        };

        let entries = match schedule {
            None | Some(Value::Null) => return Ok(WorkflowTriggers::default()),
            Some(Value::Sequence(entries)) => entries,
            Some(_) => {
                return Err(FleetError::Workflow(
                    "on.schedule must be a list".to_string(),
                ))
            }
        };

        let schedule = entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Mapping(m) => m.get("cron").and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .map(|expr| expr.trim().to_string())
            .collect();

        Ok(WorkflowTriggers { schedule })
    }
}

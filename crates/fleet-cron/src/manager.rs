//! Scheduled workflow registry
//!
//! Each entry owns one timer task. Replacing, disabling or removing an entry
//! aborts its timer; a firing already handed to the trigger handler runs to
//! completion regardless.

use chrono::{DateTime, Utc};
use cron::Schedule;
use fleet_core::{schedule_key, ScheduledWorkflow, SchedulerStats};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::expr;
use crate::handler::TriggerHandler;
use crate::triggers::{TriggerParser, YamlTriggerParser};

/// A scheduled workflow and its running timer
struct Entry {
    workflow: ScheduledWorkflow,
    schedule: Schedule,
    timer: Option<JoinHandle<()>>,
}

impl Entry {
    fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

type EntriesMap = HashMap<String, Entry>;

/// Result of registering a workflow's cron triggers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleReport {
    /// Number of expressions now scheduled
    pub scheduled: usize,
    /// One message per rejected expression
    pub errors: Vec<String>,
}

/// Registry of cron-triggered workflows
pub struct CronManager {
    /// Entries indexed by composite key
    entries: Arc<RwLock<EntriesMap>>,
    /// Invoked on every firing
    handler: Arc<dyn TriggerHandler>,
    /// Extracts cron expressions from workflow definitions
    parser: Arc<dyn TriggerParser>,
}

impl CronManager {
    /// Create a manager reading YAML workflow definitions
    pub fn new(handler: Arc<dyn TriggerHandler>) -> Self {
        Self::with_parser(handler, Arc::new(YamlTriggerParser))
    }

    /// Create a manager with a custom trigger parser
    pub fn with_parser(handler: Arc<dyn TriggerHandler>, parser: Arc<dyn TriggerParser>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            handler,
            parser,
        }
    }

    /// Register every cron trigger found in `workflow_definition`.
    ///
    /// Invalid expressions are reported in the returned errors and do not
    /// prevent their siblings from being scheduled. An expression already
    /// registered for this repository and path replaces the old entry.
    pub async fn schedule_workflow(
        &self,
        repository_id: &str,
        workflow_path: &str,
        workflow_definition: &str,
    ) -> ScheduleReport {
        let mut report = ScheduleReport::default();

        let triggers = match self.parser.parse_triggers(workflow_definition) {
            Ok(triggers) => triggers,
            Err(e) => {
                warn!(
                    repository_id = %repository_id,
                    workflow_path = %workflow_path,
                    error = %e,
                    "Failed to read workflow triggers"
                );
                report.errors.push(e.to_string());
                return report;
            }
        };

        let mut seen = HashSet::new();
        for cron_expression in triggers.schedule {
            if !seen.insert(cron_expression.clone()) {
                continue;
            }

            let schedule = match expr::parse(&cron_expression) {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(
                        repository_id = %repository_id,
                        workflow_path = %workflow_path,
                        cron = %cron_expression,
                        error = %e,
                        "Skipping invalid cron expression"
                    );
                    report
                        .errors
                        .push(format!("Invalid cron expression: {}", cron_expression));
                    continue;
                }
            };

            let mut workflow = ScheduledWorkflow::new(
                repository_id,
                workflow_path,
                workflow_definition,
                cron_expression,
            );
            workflow.next_run = expr::next_run(&schedule);
            let key = workflow.id.clone();

            let mut entries = self.entries.write().await;
            if let Some(mut previous) = entries.remove(&key) {
                previous.stop();
                debug!(schedule_id = %key, "Replaced existing schedule");
            }

            let timer = self.spawn_timer(key.clone(), schedule.clone());
            entries.insert(
                key.clone(),
                Entry {
                    workflow,
                    schedule,
                    timer: Some(timer),
                },
            );

            info!(schedule_id = %key, "Workflow scheduled");
            report.scheduled += 1;
        }

        report
    }

    /// Remove one trigger, or every trigger of the workflow when
    /// `cron_expression` is `None`. Returns how many were removed.
    pub async fn unschedule_workflow(
        &self,
        repository_id: &str,
        workflow_path: &str,
        cron_expression: Option<&str>,
    ) -> usize {
        let mut entries = self.entries.write().await;

        let keys: Vec<String> = match cron_expression {
            Some(cron_expression) => {
                let key = schedule_key(repository_id, workflow_path, cron_expression);
                if entries.contains_key(&key) {
                    vec![key]
                } else {
                    Vec::new()
                }
            }
            None => entries
                .values()
                .filter(|e| {
                    e.workflow.repository_id == repository_id
                        && e.workflow.workflow_path == workflow_path
                })
                .map(|e| e.workflow.id.clone())
                .collect(),
        };

        for key in &keys {
            if let Some(mut entry) = entries.remove(key) {
                entry.stop();
                info!(schedule_id = %key, "Workflow unscheduled");
            }
        }

        keys.len()
    }

    /// Start or stop a trigger without forgetting it. Returns `false` when the
    /// trigger is not registered.
    pub async fn toggle_schedule(
        &self,
        repository_id: &str,
        workflow_path: &str,
        cron_expression: &str,
        enabled: bool,
    ) -> bool {
        let key = schedule_key(repository_id, workflow_path, cron_expression);
        let mut entries = self.entries.write().await;

        let Some(entry) = entries.get_mut(&key) else {
            return false;
        };

        if enabled {
            if entry.timer.is_none() {
                entry.timer = Some(self.spawn_timer(key.clone(), entry.schedule.clone()));
            }
        } else {
            entry.stop();
        }
        entry.workflow.enabled = enabled;

        info!(schedule_id = %key, enabled = enabled, "Schedule toggled");
        true
    }

    /// Metadata of every scheduled workflow, optionally for one repository
    pub async fn get_scheduled_workflows(
        &self,
        repository_id: Option<&str>,
    ) -> Vec<ScheduledWorkflow> {
        let entries = self.entries.read().await;
        let mut workflows: Vec<ScheduledWorkflow> = entries
            .values()
            .filter(|e| repository_id.map_or(true, |id| e.workflow.repository_id == id))
            .map(|e| e.workflow.clone())
            .collect();
        workflows.sort_by(|a, b| a.id.cmp(&b.id));
        workflows
    }

    /// Metadata of the scheduled workflows of one repository
    pub async fn get_repository_schedules(&self, repository_id: &str) -> Vec<ScheduledWorkflow> {
        self.get_scheduled_workflows(Some(repository_id)).await
    }

    /// Counts of registered, enabled and disabled triggers
    pub async fn get_scheduler_stats(&self) -> SchedulerStats {
        let entries = self.entries.read().await;
        let enabled = entries.values().filter(|e| e.workflow.enabled).count();
        SchedulerStats {
            total: entries.len(),
            enabled,
            disabled: entries.len() - enabled,
        }
    }

    /// Stop every timer. Entries stay readable.
    pub async fn shutdown(&self) {
        let mut entries = self.entries.write().await;
        let mut stopped = 0;
        for entry in entries.values_mut() {
            if entry.timer.is_some() {
                entry.stop();
                stopped += 1;
            }
        }
        info!(timers = stopped, "Cron manager stopped");
    }

    fn spawn_timer(&self, key: String, schedule: Schedule) -> JoinHandle<()> {
        tokio::spawn(run_timer(
            key,
            schedule,
            Arc::downgrade(&self.entries),
            self.handler.clone(),
        ))
    }
}

/// Timer loop for one entry. Ends when the entry or its manager is gone.
async fn run_timer(
    key: String,
    schedule: Schedule,
    entries: Weak<RwLock<EntriesMap>>,
    handler: Arc<dyn TriggerHandler>,
) {
    let mut after: DateTime<Utc> = Utc::now();

    loop {
        let Some(due) = expr::next_after(&schedule, after) else {
            warn!(schedule_id = %key, "Schedule has no upcoming runs");
            return;
        };

        let wait = (due - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let workflow = {
            let Some(registry) = entries.upgrade() else {
                return;
            };
            let mut guard = registry.write().await;
            let Some(entry) = guard.get_mut(&key) else {
                return;
            };
            entry.workflow.last_run = Some(Utc::now());
            entry.workflow.next_run = expr::next_after(&schedule, due.max(Utc::now()));
            entry.workflow.clone()
        };

        debug!(schedule_id = %key, "Cron trigger fired");

        // The firing runs as its own task: aborting this timer leaves it running,
        // and a panic inside the handler is contained here.
        let handler = handler.clone();
        let firing = tokio::spawn(async move { handler.on_fire(workflow).await });
        match firing.await {
            Ok(Ok(())) => debug!(schedule_id = %key, "Scheduled run completed"),
            Ok(Err(e)) => error!(schedule_id = %key, error = %e, "Scheduled run failed"),
            Err(e) => error!(schedule_id = %key, error = %e, "Scheduled run panicked"),
        }

        // Slots missed while the firing ran are skipped, not replayed.
        after = due.max(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fleet_core::{FleetError, FleetResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const EVERY_SECOND: &str = "* * * * * *";

    /// Counts firings and optionally fails or panics
    #[derive(Default)]
    struct CountingHandler {
        fired: AtomicUsize,
        fail: bool,
        panic: bool,
    }

    #[async_trait]
    impl TriggerHandler for CountingHandler {
        async fn on_fire(&self, _workflow: ScheduledWorkflow) -> FleetResult<()> {
            self.fired.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("handler exploded");
            }
            if self.fail {
                return Err(FleetError::Dispatch("no capacity".to_string()));
            }
            Ok(())
        }
    }

    fn workflow(crons: &[&str]) -> String {
        let mut yaml = String::from("name: test\non:\n  schedule:\n");
        for cron in crons {
            yaml.push_str(&format!("    - cron: \"{}\"\n", cron));
        }
        yaml
    }

    fn manager() -> (CronManager, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        (CronManager::new(handler.clone()), handler)
    }

    async fn wait_for_firings(handler: &CountingHandler, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while handler.fired.load(Ordering::SeqCst) < count {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .expect("timer did not fire");
    }

    #[tokio::test]
    async fn test_schedule_workflow() {
        let (manager, _) = manager();
        let report = manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&["0 0 * * *", "*/15 * * * *"]))
            .await;

        assert_eq!(report.scheduled, 2);
        assert!(report.errors.is_empty());

        let schedules = manager.get_scheduled_workflows(None).await;
        assert_eq!(schedules.len(), 2);
        assert!(schedules.iter().all(|s| s.enabled && s.next_run.is_some()));
        assert!(schedules.iter().all(|s| s.last_run.is_none()));
    }

    #[tokio::test]
    async fn test_invalid_expression_isolated() {
        let (manager, _) = manager();
        let report = manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&["bogus", "0 0 * * *", "99 * * * *"]))
            .await;

        assert_eq!(report.scheduled, 1);
        assert_eq!(
            report.errors,
            vec![
                "Invalid cron expression: bogus".to_string(),
                "Invalid cron expression: 99 * * * *".to_string(),
            ]
        );
        assert_eq!(manager.get_scheduled_workflows(None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_definition() {
        let (manager, _) = manager();
        let report = manager
            .schedule_workflow("repo1", "ci.yml", "on: [unterminated")
            .await;

        assert_eq!(report.scheduled, 0);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_no_schedule_is_not_an_error() {
        let (manager, _) = manager();
        let report = manager.schedule_workflow("repo1", "ci.yml", "on: push").await;
        assert_eq!(report, ScheduleReport::default());
    }

    #[tokio::test]
    async fn test_repeated_expression_counted_once() {
        let (manager, _) = manager();
        let report = manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&["0 0 * * *", "0 0 * * *"]))
            .await;

        assert_eq!(report.scheduled, 1);
        assert!(report.errors.is_empty());
        assert_eq!(manager.get_scheduled_workflows(None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_reschedule_replaces_entry() {
        let (manager, _) = manager();
        let definition = workflow(&["0 0 * * *"]);

        manager.schedule_workflow("repo1", "ci.yml", &definition).await;
        manager.schedule_workflow("repo1", "ci.yml", &definition).await;

        let schedules = manager.get_scheduled_workflows(None).await;
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].id, "repo1:ci.yml:0 0 * * *");
        assert_eq!(manager.get_scheduler_stats().await.total, 1);
    }

    #[tokio::test]
    async fn test_reschedule_does_not_duplicate_timers() {
        let (manager, handler) = manager();
        let definition = workflow(&[EVERY_SECOND]);

        manager.schedule_workflow("repo1", "ci.yml", &definition).await;
        manager.schedule_workflow("repo1", "ci.yml", &definition).await;
        manager.schedule_workflow("repo1", "ci.yml", &definition).await;

        tokio::time::sleep(Duration::from_millis(2500)).await;
        manager.shutdown().await;

        // One timer firing once a second, not three
        let fired = handler.fired.load(Ordering::SeqCst);
        assert!((1..=3).contains(&fired), "fired {} times", fired);
    }

    #[tokio::test]
    async fn test_timer_fires_and_records_last_run() {
        let (manager, handler) = manager();
        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&[EVERY_SECOND]))
            .await;

        wait_for_firings(&handler, 1).await;

        let schedules = manager.get_repository_schedules("repo1").await;
        assert!(schedules[0].last_run.is_some());
        assert!(schedules[0].next_run > schedules[0].last_run);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_failing_handler_keeps_timer_running() {
        let handler = Arc::new(CountingHandler {
            fail: true,
            ..Default::default()
        });
        let manager = CronManager::new(handler.clone());
        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&[EVERY_SECOND]))
            .await;

        wait_for_firings(&handler, 2).await;
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_panicking_handler_keeps_timer_running() {
        let handler = Arc::new(CountingHandler {
            panic: true,
            ..Default::default()
        });
        let manager = CronManager::new(handler.clone());
        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&[EVERY_SECOND]))
            .await;

        wait_for_firings(&handler, 2).await;
        assert_eq!(manager.get_scheduler_stats().await.enabled, 1);
        manager.shutdown().await;
    }

    /// Records when each firing starts; the first firing is slow
    struct SlowFirstHandler {
        starts: Mutex<Vec<Instant>>,
        first_delay: Duration,
    }

    #[async_trait]
    impl TriggerHandler for SlowFirstHandler {
        async fn on_fire(&self, _workflow: ScheduledWorkflow) -> FleetResult<()> {
            let first = {
                let mut starts = self.starts.lock().unwrap();
                starts.push(Instant::now());
                starts.len() == 1
            };
            if first {
                tokio::time::sleep(self.first_delay).await;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_firing_skips_missed_slots() {
        let handler = Arc::new(SlowFirstHandler {
            starts: Mutex::new(Vec::new()),
            first_delay: Duration::from_millis(3200),
        });
        let manager = CronManager::new(handler.clone());
        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&[EVERY_SECOND]))
            .await;

        tokio::time::timeout(Duration::from_secs(10), async {
            while handler.starts.lock().unwrap().len() < 3 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .expect("timer did not fire");
        manager.shutdown().await;

        let starts = handler.starts.lock().unwrap().clone();
        for pair in starts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_millis(500), "firings {:?} apart", gap);
        }

        let schedule = manager.get_repository_schedules("repo1").await.remove(0);
        assert!(schedule.next_run > schedule.last_run);
    }

    #[tokio::test]
    async fn test_unschedule_single_and_all() {
        let (manager, _) = manager();
        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&["0 0 * * *", "0 */6 * * *"]))
            .await;
        manager
            .schedule_workflow("repo1", "release.yml", &workflow(&["0 0 1 * *"]))
            .await;

        assert_eq!(
            manager
                .unschedule_workflow("repo1", "ci.yml", Some("0 */6 * * *"))
                .await,
            1
        );
        assert_eq!(
            manager
                .unschedule_workflow("repo1", "ci.yml", Some("0 */6 * * *"))
                .await,
            0
        );

        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&["*/15 * * * *"]))
            .await;
        assert_eq!(manager.unschedule_workflow("repo1", "ci.yml", None).await, 2);

        let remaining = manager.get_scheduled_workflows(None).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].workflow_path, "release.yml");
    }

    #[tokio::test]
    async fn test_toggle_preserves_metadata() {
        let (manager, handler) = manager();
        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&[EVERY_SECOND]))
            .await;
        wait_for_firings(&handler, 1).await;

        assert!(manager.toggle_schedule("repo1", "ci.yml", EVERY_SECOND, false).await);
        let disabled = manager.get_repository_schedules("repo1").await.remove(0);
        assert!(!disabled.enabled);
        assert!(disabled.last_run.is_some());
        assert!(disabled.next_run.is_some());

        let fired = handler.fired.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(handler.fired.load(Ordering::SeqCst), fired);

        let stats = manager.get_scheduler_stats().await;
        assert_eq!((stats.total, stats.enabled, stats.disabled), (1, 0, 1));

        assert!(manager.toggle_schedule("repo1", "ci.yml", EVERY_SECOND, true).await);
        let enabled = manager.get_repository_schedules("repo1").await.remove(0);
        assert!(enabled.enabled);
        assert_eq!(enabled.last_run, disabled.last_run);
        assert_eq!(enabled.next_run, disabled.next_run);

        wait_for_firings(&handler, fired + 1).await;
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_toggle_unknown_schedule() {
        let (manager, _) = manager();
        assert!(!manager.toggle_schedule("repo1", "ci.yml", "0 0 * * *", true).await);
    }

    #[tokio::test]
    async fn test_repository_filter() {
        let (manager, _) = manager();
        manager
            .schedule_workflow("repo1", "ci.yml", &workflow(&["0 0 * * *"]))
            .await;
        manager
            .schedule_workflow("repo2", "ci.yml", &workflow(&["0 0 * * *"]))
            .await;

        let repo2 = manager.get_repository_schedules("repo2").await;
        assert_eq!(repo2.len(), 1);
        assert_eq!(repo2[0].repository_id, "repo2");
        assert!(manager.get_repository_schedules("repo3").await.is_empty());
    }

    #[tokio::test]
    async fn test_independent_managers() {
        let (first, _) = manager();
        let (second, _) = manager();
        first
            .schedule_workflow("repo1", "ci.yml", &workflow(&["0 0 * * *"]))
            .await;

        assert_eq!(first.get_scheduler_stats().await.total, 1);
        assert_eq!(second.get_scheduler_stats().await.total, 0);
    }
}

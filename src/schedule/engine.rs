use crate::config::EngineConfig;
use crate::schedule::allocator::TimeSlotAllocator;
use crate::schedule::analytics::ScheduleAnalytics;
use crate::schedule::conflicts::ConflictDetector;
use crate::schedule::error::{Result, SchedulingError};
use crate::schedule::graph::DependencyGraph;
use crate::schedule::types::*;
use crate::schedule::validator::ScheduleValidator;
use crate::task::{Task, TaskId, TaskStore};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Source of "now" for a scheduling request
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Stages a single scheduling request moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulingPhase {
    Collecting,
    Ordering,
    Allocating,
    Validating,
    Completed,
    Failed,
}

/// Entry point tying the task store to the pure scheduling pipeline.
///
/// Task lookups are the only await points; ordering, allocation, conflict
/// detection and validation run synchronously once the batch is resolved.
/// The engine keeps no state between requests.
pub struct SchedulingEngine<S: TaskStore> {
    store: S,
    config: EngineConfig,
    clock: Clock,
}

impl<S: TaskStore> SchedulingEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, mostly useful for deterministic runs
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a schedule for the given tasks
    pub async fn create_schedule(
        &self,
        task_ids: &[TaskId],
        constraints: SchedulingConstraints,
    ) -> Result<TaskSchedule> {
        self.run(task_ids, constraints, HashMap::new()).await
    }

    /// Re-allocate `changed` tasks, carrying every other slot forward unchanged.
    ///
    /// An empty change set returns the input schedule as-is.
    pub async fn reschedule(
        &self,
        schedule: &TaskSchedule,
        changed: &[TaskId],
    ) -> Result<TaskSchedule> {
        if changed.is_empty() {
            debug!("Nothing changed, keeping schedule {}", schedule.id);
            return Ok(schedule.clone());
        }

        let changed_set: HashSet<TaskId> = changed.iter().copied().collect();
        let existing: HashMap<TaskId, ScheduledTimeSlot> = schedule
            .slots
            .iter()
            .filter(|slot| !changed_set.contains(&slot.task_id))
            .map(|slot| (slot.task_id, slot.clone()))
            .collect();

        let mut task_ids = schedule.task_ids();
        task_ids.extend(changed.iter().filter(|id| schedule.slot_for(**id).is_none()));

        info!(
            "Rescheduling {} changed task(s), carrying {} slot(s) forward",
            changed_set.len(),
            existing.len()
        );
        self.run(&task_ids, schedule.constraints.clone(), existing)
            .await
    }

    /// Earliest start for a single task that still honors its dependencies
    /// and deadline
    pub async fn optimal_start_time(
        &self,
        task_id: TaskId,
        constraints: SchedulingConstraints,
    ) -> Result<DateTime<Utc>> {
        let task = self.store.fetch_task(task_id).await?;
        let dependencies = self.store.fetch_dependencies(task_id).await?;

        let allocator = TimeSlotAllocator::new(constraints, self.config.allocator.clone())?;
        let start = allocator.optimal_start(&task, &dependencies, (self.clock)())?;
        debug!("Optimal start for task {} is {}", task_id, start);
        Ok(start)
    }

    /// Summary statistics for an accepted schedule; unresolvable tasks are skipped
    pub async fn analyze(&self, schedule: &TaskSchedule) -> ScheduleAnalytics {
        let tasks = self.collect_tasks(&schedule.task_ids()).await;
        let by_id: HashMap<TaskId, Task> = tasks.into_iter().map(|t| (t.id, t)).collect();
        ScheduleAnalytics::compute(schedule, &by_id, self.config.assumed_workday_minutes)
    }

    async fn run(
        &self,
        task_ids: &[TaskId],
        constraints: SchedulingConstraints,
        existing: HashMap<TaskId, ScheduledTimeSlot>,
    ) -> Result<TaskSchedule> {
        let request_id = Uuid::new_v4();

        match self.execute(request_id, task_ids, constraints, existing).await {
            Ok(schedule) => {
                Self::transition(request_id, SchedulingPhase::Completed);
                info!(
                    "Schedule {} accepted: {} slot(s), {} warning(s)",
                    schedule.id,
                    schedule.slots.len(),
                    schedule.conflicts.len()
                );
                Ok(schedule)
            }
            Err(err) => {
                Self::transition(request_id, SchedulingPhase::Failed);
                warn!("Scheduling request {} failed: {}", request_id, err);
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        request_id: Uuid,
        task_ids: &[TaskId],
        constraints: SchedulingConstraints,
        existing: HashMap<TaskId, ScheduledTimeSlot>,
    ) -> Result<TaskSchedule> {
        Self::transition(request_id, SchedulingPhase::Collecting);
        let tasks = self.collect_tasks(task_ids).await;
        if tasks.is_empty() {
            return Err(SchedulingError::NoValidTasks);
        }

        Self::transition(request_id, SchedulingPhase::Ordering);
        let sequence = DependencyGraph::build(&tasks).sequence();
        if sequence.has_cycle() {
            warn!(
                "Request {} has {} dependency cycle(s), policy {:?}",
                request_id,
                sequence.cycles().len(),
                self.config.cycle_policy
            );
        }
        let order = sequence.into_result(self.config.cycle_policy)?;

        Self::transition(request_id, SchedulingPhase::Allocating);
        let by_id: HashMap<TaskId, Task> = tasks.into_iter().map(|t| (t.id, t)).collect();
        let ordered: Vec<&Task> = order.iter().filter_map(|id| by_id.get(id)).collect();
        let allocator = TimeSlotAllocator::new(constraints, self.config.allocator.clone())?;
        let slots = allocator.allocate(&ordered, &existing, (self.clock)())?;

        Self::transition(request_id, SchedulingPhase::Validating);
        let conflicts = ConflictDetector::detect(&slots, &by_id);
        ScheduleValidator::validate(&slots, &conflicts, allocator.constraints())?;

        let total_estimated_duration = slots
            .iter()
            .fold(Duration::zero(), |total, slot| {
                total.checked_add(&slot.duration).unwrap_or(Duration::MAX)
            });

        Ok(TaskSchedule {
            id: Uuid::new_v4(),
            slots,
            constraints: allocator.constraints().clone(),
            generated_at: (self.clock)(),
            total_estimated_duration,
            conflicts,
        })
    }

    /// Resolve ids concurrently, dropping duplicates and failed lookups
    async fn collect_tasks(&self, task_ids: &[TaskId]) -> Vec<Task> {
        let mut seen = HashSet::new();
        let unique: Vec<TaskId> = task_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let results = join_all(unique.iter().map(|&id| self.store.fetch_task(id))).await;

        results
            .into_iter()
            .zip(unique)
            .filter_map(|(result, id)| match result {
                Ok(task) => Some(task),
                Err(err) => {
                    warn!("Skipping task {}: {}", id, err);
                    None
                }
            })
            .collect()
    }

    fn transition(request_id: Uuid, phase: SchedulingPhase) {
        debug!("Scheduling request {} -> {:?}", request_id, phase);
    }
}

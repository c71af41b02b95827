use crate::schedule::error::{Result, SchedulingError, SettingsError};
use crate::schedule::types::*;
use crate::task::{Task, TaskId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Tuning for slot placement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorSettings {
    /// Fixed increment used to step through `Unavailable` restrictions
    #[serde(with = "crate::duration_secs")]
    pub restriction_step: Duration,
    /// Upper bound on cursor advances while searching for one start time
    pub max_advance_steps: u32,
    /// Duration assumed for tasks without an estimate
    #[serde(with = "crate::duration_secs")]
    pub default_task_duration: Duration,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            restriction_step: Duration::minutes(15),
            max_advance_steps: 10_000,
            default_task_duration: Duration::hours(1),
        }
    }
}

impl AllocatorSettings {
    /// Reject settings that would stall or reverse the allocation cursor
    pub fn validate(&self) -> std::result::Result<(), SettingsError> {
        if self.restriction_step <= Duration::zero() {
            return Err(SettingsError::NonPositiveStep(self.restriction_step.num_seconds()));
        }
        if self.default_task_duration <= Duration::zero() {
            return Err(SettingsError::NonPositiveDefaultDuration(
                self.default_task_duration.num_seconds(),
            ));
        }
        Ok(())
    }
}

/// Places tasks on a single timeline under calendar constraints
#[derive(Clone, Debug)]
pub struct TimeSlotAllocator {
    constraints: SchedulingConstraints,
    settings: AllocatorSettings,
}

impl TimeSlotAllocator {
    /// Fails with [`SchedulingError::Settings`] when either input is unusable
    pub fn new(constraints: SchedulingConstraints, settings: AllocatorSettings) -> Result<Self> {
        settings.validate()?;
        constraints.validate()?;
        Ok(Self {
            constraints,
            settings,
        })
    }

    pub fn constraints(&self) -> &SchedulingConstraints {
        &self.constraints
    }

    /// Assign a slot to every task, in the given order.
    ///
    /// Tasks present in `existing` keep their slot verbatim and do not move the
    /// cursor. Everything else is packed forward from `now`, separated by the
    /// configured break.
    pub fn allocate(
        &self,
        tasks: &[&Task],
        existing: &HashMap<TaskId, ScheduledTimeSlot>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledTimeSlot>> {
        let mut cursor = now;
        let mut slots = Vec::with_capacity(tasks.len());

        for task in tasks {
            if let Some(slot) = existing.get(&task.id) {
                trace!("Keeping existing slot for task {}", task.id);
                slots.push(slot.clone());
                continue;
            }

            let duration = task.resolved_duration(self.settings.default_task_duration);
            cursor = self.next_available(task.id, cursor)?;

            let slot = ScheduledTimeSlot::new(task.id, cursor, duration, task.due_date.is_none())
                .ok_or_else(|| SchedulingError::out_of_range(task.id))?;
            debug!(
                "Placed task {} at {} - {}",
                task.id, slot.start, slot.end
            );
            cursor = slot
                .end
                .checked_add_signed(self.constraints.break_duration)
                .ok_or_else(|| SchedulingError::out_of_range(task.id))?;
            slots.push(slot);
        }

        Ok(slots)
    }

    /// Earliest instant at or after `from` inside working hours and outside
    /// every `Unavailable` restriction.
    ///
    /// Restrictions are stepped through in `restriction_step` increments, not
    /// skipped to their end, so starts always land on that grid relative to
    /// `from`.
    pub fn next_available(&self, task_id: TaskId, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut cursor = from;
        let mut steps = 0u32;

        loop {
            let next = if !self.constraints.is_within_working_hours(cursor) {
                self.constraints.working_hours.next_opening(cursor)
            } else if let Some(restriction) = self.constraints.blocking_restriction_at(cursor) {
                trace!("{} blocked by restriction '{}'", cursor, restriction.name);
                cursor.checked_add_signed(self.settings.restriction_step)
            } else {
                return Ok(cursor);
            };
            cursor = next.ok_or_else(|| SchedulingError::out_of_range(task_id))?;

            steps += 1;
            if steps > self.settings.max_advance_steps {
                return Err(SchedulingError::Infeasible {
                    task_id,
                    reason: format!(
                        "No available time slot after {} attempts",
                        self.settings.max_advance_steps
                    ),
                });
            }
        }
    }

    /// Best start time for one task given its dependencies and deadline.
    ///
    /// Unfinished dependencies are assumed to complete `now + their duration`.
    pub fn optimal_start(
        &self,
        task: &Task,
        dependencies: &[Task],
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let fallback = self.settings.default_task_duration;
        let duration = task.resolved_duration(fallback);

        let mut earliest = now;
        for dep in dependencies {
            let done = match dep.completed_at {
                Some(completed_at) => completed_at,
                None => now
                    .checked_add_signed(dep.resolved_duration(fallback))
                    .ok_or_else(|| SchedulingError::out_of_range(task.id))?,
            };
            earliest = earliest.max(done);
        }

        let start = self.next_available(task.id, earliest)?;

        if let Some(due_date) = task.due_date {
            // A due date too early to subtract from cannot be met either
            let latest_start = due_date
                .checked_sub_signed(duration)
                .ok_or_else(|| SchedulingError::deadline(task.id))?;
            if start > latest_start {
                debug!(
                    "Task {} needs to start by {} but the next slot is {}",
                    task.id, latest_start, start
                );
                return Err(SchedulingError::deadline(task.id));
            }
        }

        Ok(start)
    }
}

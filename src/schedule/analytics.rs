//! Read-only summary statistics over an accepted schedule.
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Scheduled minutes | Sum of slot durations |
//! | Buffer minutes | Sum of positive gaps between consecutive slots (by start) |
//! | Utilization | `scheduled / workday * 100`, may exceed 100 |
//! | Priority distribution | Scheduled tasks per priority |
//! | Time of day | Slot starts bucketed by hour |

use crate::schedule::types::*;
use crate::task::{Task, TaskId, TaskPriority};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Default workday used for utilization
pub const DEFAULT_WORKDAY_MINUTES: u32 = 8 * 60;

/// Part of the day a slot starts in
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Morning 6-11, Afternoon 12-17, Evening 18-23, Night otherwise
    pub fn of(instant: DateTime<Utc>) -> Self {
        match instant.hour() {
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=23 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScheduleAnalytics {
    pub total_tasks: usize,
    pub total_scheduled_minutes: i64,
    pub average_task_minutes: f64,
    pub buffer_minutes: i64,
    pub utilization_percent: f64,
    pub priority_distribution: BTreeMap<TaskPriority, usize>,
    pub time_of_day_distribution: BTreeMap<TimeOfDay, usize>,
}

impl ScheduleAnalytics {
    /// Compute statistics for `schedule`.
    ///
    /// Slots whose task is missing from `tasks` still count towards time
    /// metrics but are left out of the priority distribution.
    pub fn compute(
        schedule: &TaskSchedule,
        tasks: &HashMap<TaskId, Task>,
        workday_minutes: u32,
    ) -> Self {
        let total_tasks = schedule.slots.len();
        let scheduled = sum_durations(schedule.slots.iter().map(|slot| slot.duration));
        let scheduled_minutes = scheduled.num_seconds() as f64 / 60.0;

        let average_task_minutes = if total_tasks == 0 {
            0.0
        } else {
            scheduled_minutes / total_tasks as f64
        };

        let utilization_percent = if workday_minutes == 0 {
            0.0
        } else {
            scheduled_minutes / workday_minutes as f64 * 100.0
        };

        let mut priority_distribution: BTreeMap<TaskPriority, usize> =
            TaskPriority::ALL.iter().map(|&p| (p, 0)).collect();
        let mut skipped = 0usize;
        for slot in &schedule.slots {
            match tasks.get(&slot.task_id) {
                Some(task) => *priority_distribution.entry(task.priority).or_default() += 1,
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("{} slot(s) without task data left out of priority distribution", skipped);
        }

        let mut time_of_day_distribution: BTreeMap<TimeOfDay, usize> =
            TimeOfDay::ALL.iter().map(|&t| (t, 0)).collect();
        for slot in &schedule.slots {
            *time_of_day_distribution
                .entry(TimeOfDay::of(slot.start))
                .or_default() += 1;
        }

        Self {
            total_tasks,
            total_scheduled_minutes: scheduled.num_minutes(),
            average_task_minutes,
            buffer_minutes: Self::buffer_minutes(&schedule.slots),
            utilization_percent,
            priority_distribution,
            time_of_day_distribution,
        }
    }

    /// Idle minutes between consecutive slots; overlaps contribute nothing
    pub fn buffer_minutes(slots: &[ScheduledTimeSlot]) -> i64 {
        let mut sorted: Vec<&ScheduledTimeSlot> = slots.iter().collect();
        sorted.sort_by_key(|slot| slot.start);

        let gaps = sorted
            .windows(2)
            .map(|pair| (pair[1].start - pair[0].end).max(Duration::zero()));
        sum_durations(gaps).num_minutes()
    }
}

/// Sum without intermediate truncation, saturating instead of overflowing
fn sum_durations(durations: impl Iterator<Item = Duration>) -> Duration {
    durations.fold(Duration::zero(), |total, d| {
        total.checked_add(&d).unwrap_or(Duration::MAX)
    })
}

use crate::schedule::error::SettingsError;
use crate::task::TaskId;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Daily wall-clock window (evaluated in UTC) during which tasks may start.
///
/// `start == end` covers the whole day. `start > end` wraps past midnight,
/// e.g. 22:00-06:00 for a night shift.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Kinds of time restriction; only `Unavailable` blocks allocation
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionType {
    Unavailable,
    Avoid,
    Preferred,
}

/// Named blackout interval `[start, end)`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TimeRestriction {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub restriction_type: RestrictionType,
}

/// Calendar constraints applied while allocating slots
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SchedulingConstraints {
    /// Gap inserted between consecutively allocated tasks
    #[serde(with = "crate::duration_secs")]
    pub break_duration: Duration,
    pub working_hours: WorkingHours,
    #[serde(default)]
    pub restrictions: Vec<TimeRestriction>,
}

/// Concrete `[start, end)` interval assigned to one task
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScheduledTimeSlot {
    pub task_id: TaskId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(with = "crate::duration_secs")]
    pub duration: Duration,
    /// True when the task has no hard due date
    pub is_flexible: bool,
}

/// Accepted schedule produced by a single scheduling request.
///
/// Never mutated after construction; rescheduling builds a new value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaskSchedule {
    pub id: Uuid,
    pub slots: Vec<ScheduledTimeSlot>,
    pub constraints: SchedulingConstraints,
    pub generated_at: DateTime<Utc>,
    #[serde(with = "crate::duration_secs")]
    pub total_estimated_duration: Duration,
    pub conflicts: Vec<SchedulingConflict>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    TimeOverlap,
    DeadlineMiss,
    DependencyViolation,
}

/// Conflict severity; `Critical` blocks acceptance of a schedule
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SchedulingConflict {
    pub conflict_type: ConflictType,
    pub task_id: TaskId,
    pub description: String,
    pub severity: ConflictSeverity,
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Window from whole hours, e.g. `from_hours(9, 17)`; out-of-range hours fall back to midnight
    pub fn from_hours(start_hour: u32, end_hour: u32) -> Self {
        let at = |hour| NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
        Self::new(at(start_hour), at(end_hour))
    }

    /// Whether the wall-clock time of `instant` lies in `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let time = instant.time();
        if self.start == self.end {
            true
        } else if self.start < self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }

    /// `from` itself when inside the window, otherwise the next window opening.
    ///
    /// `None` when that opening lies past the last representable instant.
    pub fn next_opening(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.contains(from) {
            return Some(from);
        }

        let today = from.date_naive().and_time(self.start).and_utc();
        if today > from {
            Some(today)
        } else {
            today.checked_add_signed(Duration::days(1))
        }
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self::from_hours(9, 17)
    }
}

impl TimeRestriction {
    pub fn new(
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        restriction_type: RestrictionType,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            restriction_type,
        }
    }

    /// Shorthand for an `Unavailable` blackout
    pub fn unavailable(name: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(name, start, end, RestrictionType::Unavailable)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn is_blocking(&self) -> bool {
        self.restriction_type == RestrictionType::Unavailable
    }
}

impl SchedulingConstraints {
    pub fn new(working_hours: WorkingHours) -> Self {
        Self {
            working_hours,
            ..Default::default()
        }
    }

    pub fn with_restriction(mut self, restriction: TimeRestriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    pub fn with_break_duration(mut self, break_duration: Duration) -> Self {
        self.break_duration = break_duration;
        self
    }

    pub fn is_within_working_hours(&self, instant: DateTime<Utc>) -> bool {
        self.working_hours.contains(instant)
    }

    /// Reject a negative break, which would pack tasks on top of each other
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.break_duration < Duration::zero() {
            return Err(SettingsError::NegativeBreak(self.break_duration.num_seconds()));
        }
        Ok(())
    }

    /// First `Unavailable` restriction covering `instant`, if any
    pub fn blocking_restriction_at(&self, instant: DateTime<Utc>) -> Option<&TimeRestriction> {
        self.restrictions
            .iter()
            .find(|r| r.is_blocking() && r.contains(instant))
    }
}

impl Default for SchedulingConstraints {
    fn default() -> Self {
        Self {
            working_hours: WorkingHours::default(),
            restrictions: Vec::new(),
            break_duration: Duration::minutes(15),
        }
    }
}

impl ScheduledTimeSlot {
    /// Slot of `duration` from `start`; `None` when the end is out of range
    pub fn new(
        task_id: TaskId,
        start: DateTime<Utc>,
        duration: Duration,
        is_flexible: bool,
    ) -> Option<Self> {
        let end = start.checked_add_signed(duration)?;
        Some(Self {
            task_id,
            start,
            end,
            duration,
            is_flexible,
        })
    }
}

impl TaskSchedule {
    /// Look up the slot assigned to a task
    pub fn slot_for(&self, task_id: TaskId) -> Option<&ScheduledTimeSlot> {
        self.slots.iter().find(|slot| slot.task_id == task_id)
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.slots.iter().map(|slot| slot.task_id).collect()
    }

    pub fn has_blocking_conflicts(&self) -> bool {
        self.conflicts.iter().any(|c| c.is_blocking())
    }

    pub fn conflicts_of_type(&self, conflict_type: ConflictType) -> Vec<&SchedulingConflict> {
        self.conflicts
            .iter()
            .filter(|c| c.conflict_type == conflict_type)
            .collect()
    }
}

impl SchedulingConflict {
    pub fn time_overlap(task_id: TaskId, description: impl Into<String>) -> Self {
        Self {
            conflict_type: ConflictType::TimeOverlap,
            task_id,
            description: description.into(),
            severity: ConflictSeverity::High,
        }
    }

    pub fn deadline_miss(task_id: TaskId, description: impl Into<String>) -> Self {
        Self {
            conflict_type: ConflictType::DeadlineMiss,
            task_id,
            description: description.into(),
            severity: ConflictSeverity::Critical,
        }
    }

    pub fn dependency_violation(task_id: TaskId, description: impl Into<String>) -> Self {
        Self {
            conflict_type: ConflictType::DependencyViolation,
            task_id,
            description: description.into(),
            severity: ConflictSeverity::High,
        }
    }

    /// Blocking conflicts reject the whole schedule
    pub fn is_blocking(&self) -> bool {
        self.severity == ConflictSeverity::Critical
    }
}

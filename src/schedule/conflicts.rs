use crate::schedule::types::*;
use crate::task::{Task, TaskId};
use std::collections::HashMap;
use tracing::debug;

/// Inspects a finished slot list for overlaps, deadline misses and
/// dependency-order violations.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Collect every conflict in the slot list.
    ///
    /// `tasks` supplies due dates and dependency ids; slots whose task is not
    /// in the map are only checked for overlaps.
    pub fn detect(
        slots: &[ScheduledTimeSlot],
        tasks: &HashMap<TaskId, Task>,
    ) -> Vec<SchedulingConflict> {
        let mut conflicts = Self::detect_overlaps(slots);
        conflicts.extend(Self::detect_deadline_misses(slots, tasks));
        conflicts.extend(Self::detect_dependency_violations(slots, tasks));

        debug!(
            "Detected {} conflict(s) across {} slot(s)",
            conflicts.len(),
            slots.len()
        );
        conflicts
    }

    /// Adjacent slots (by start time) where the earlier one runs past the later start
    pub fn detect_overlaps(slots: &[ScheduledTimeSlot]) -> Vec<SchedulingConflict> {
        let mut sorted: Vec<&ScheduledTimeSlot> = slots.iter().collect();
        sorted.sort_by_key(|slot| slot.start);

        sorted
            .windows(2)
            .filter(|pair| pair[0].end > pair[1].start)
            .map(|pair| {
                SchedulingConflict::time_overlap(
                    pair[1].task_id,
                    format!(
                        "Task {} starts at {} before task {} ends at {}",
                        pair[1].task_id, pair[1].start, pair[0].task_id, pair[0].end
                    ),
                )
            })
            .collect()
    }

    pub fn detect_deadline_misses(
        slots: &[ScheduledTimeSlot],
        tasks: &HashMap<TaskId, Task>,
    ) -> Vec<SchedulingConflict> {
        slots
            .iter()
            .filter_map(|slot| {
                let due_date = tasks.get(&slot.task_id)?.due_date?;
                (slot.end > due_date).then(|| {
                    SchedulingConflict::deadline_miss(
                        slot.task_id,
                        format!(
                            "Task {} ends at {} after its due date {}",
                            slot.task_id, slot.end, due_date
                        ),
                    )
                })
            })
            .collect()
    }

    pub fn detect_dependency_violations(
        slots: &[ScheduledTimeSlot],
        tasks: &HashMap<TaskId, Task>,
    ) -> Vec<SchedulingConflict> {
        let by_task: HashMap<TaskId, &ScheduledTimeSlot> =
            slots.iter().map(|slot| (slot.task_id, slot)).collect();
        let mut conflicts = Vec::new();

        for slot in slots {
            let Some(task) = tasks.get(&slot.task_id) else {
                continue;
            };
            for dep_id in &task.dependencies {
                let Some(dep_slot) = by_task.get(dep_id) else {
                    continue;
                };
                if dep_slot.end > slot.start {
                    conflicts.push(SchedulingConflict::dependency_violation(
                        slot.task_id,
                        format!(
                            "Task {} starts at {} before dependency {} ends at {}",
                            slot.task_id, slot.start, dep_id, dep_slot.end
                        ),
                    ));
                }
            }
        }

        conflicts
    }
}

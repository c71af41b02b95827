use crate::schedule::error::{InvalidReason, Result, SchedulingError};
use crate::schedule::types::*;
use tracing::warn;

/// Gates acceptance of a computed schedule.
///
/// Only `Critical` conflicts and starts outside working hours reject a
/// schedule. Overlaps and dependency-order violations stay attached to the
/// accepted schedule as warnings.
pub struct ScheduleValidator;

impl ScheduleValidator {
    pub fn validate(
        slots: &[ScheduledTimeSlot],
        conflicts: &[SchedulingConflict],
        constraints: &SchedulingConstraints,
    ) -> Result<()> {
        let critical: Vec<SchedulingConflict> = conflicts
            .iter()
            .filter(|c| c.is_blocking())
            .cloned()
            .collect();
        if !critical.is_empty() {
            warn!("Rejecting schedule with {} critical conflict(s)", critical.len());
            return Err(SchedulingError::Invalid {
                reason: InvalidReason::CriticalConflicts,
                conflicts: critical,
            });
        }

        let outside: Vec<&ScheduledTimeSlot> = slots
            .iter()
            .filter(|slot| !constraints.is_within_working_hours(slot.start))
            .collect();
        if !outside.is_empty() {
            warn!(
                "Rejecting schedule: {} slot(s) start outside working hours",
                outside.len()
            );
            return Err(SchedulingError::Invalid {
                reason: InvalidReason::OutsideWorkingHours,
                conflicts: Vec::new(),
            });
        }

        for conflict in conflicts {
            warn!(
                "Accepting schedule with {:?} conflict on task {}: {}",
                conflict.conflict_type, conflict.task_id, conflict.description
            );
        }

        Ok(())
    }
}

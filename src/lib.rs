//! # Slotplan
//!
//! A task scheduling and conflict-resolution engine. Given tasks with
//! priorities, estimated durations, dependencies and deadlines, it produces a
//! concrete time allocation that respects working hours and blackout
//! restrictions, flags conflicts, and reports utilization analytics.
//!
//! ## Architecture Overview
//!
//! - **[`task`]**: the read-only task model and the [`TaskStore`] boundary
//! - **[`schedule`]**: dependency ordering, slot allocation, conflict
//!   detection, validation, analytics and the [`SchedulingEngine`] façade
//! - **[`config`]**: TOML-backed engine configuration
//!
//! The engine is stateless. Task lookups are its only asynchronous step; the
//! rest of the pipeline is pure, synchronous computation:
//!
//! ```text
//! task ids -> fetch -> DependencyGraph -> TimeSlotAllocator
//!          -> ConflictDetector + ScheduleValidator -> TaskSchedule
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::Duration;
//! use slotplan::{EngineConfig, InMemoryTaskStore, SchedulingConstraints, SchedulingEngine, Task};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let write = Task::new("Write report").with_duration(Duration::minutes(90));
//!     let review = Task::new("Review report").with_dependencies(vec![write.id]);
//!     let ids = vec![write.id, review.id];
//!
//!     let store = InMemoryTaskStore::from_tasks(vec![write, review]);
//!     let engine = SchedulingEngine::new(store, EngineConfig::default());
//!
//!     let schedule = engine
//!         .create_schedule(&ids, SchedulingConstraints::default())
//!         .await?;
//!     let analytics = engine.analyze(&schedule).await;
//!
//!     println!("{} slots, {:.1}% utilization", schedule.slots.len(), analytics.utilization_percent);
//!     Ok(())
//! }
//! ```

/// Task records and the external task-store interface.
pub mod task;

/// Scheduling pipeline: graph, allocator, conflicts, validator, analytics.
pub mod schedule;

/// Engine configuration loading and discovery.
pub mod config;

/// Command-line interface.
pub mod cli;

mod duration_secs;

pub use config::{ConfigDiscovery, EngineConfig};
pub use schedule::{
    AllocatorSettings, ConflictDetector, ConflictSeverity, ConflictType, CyclePolicy,
    DependencyGraph, InvalidReason, RestrictionType, ScheduleAnalytics, ScheduleValidator,
    ScheduledTimeSlot, SchedulingConflict, SchedulingConstraints, SchedulingEngine,
    SchedulingError, SchedulingPhase, Sequence, SettingsError, TaskSchedule, TimeOfDay,
    TimeRestriction, TimeSlotAllocator, WorkingHours,
};
pub use task::{InMemoryTaskStore, StoreError, Task, TaskId, TaskPriority, TaskStore};

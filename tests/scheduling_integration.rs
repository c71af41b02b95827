use chrono::{DateTime, Duration, TimeZone, Utc};
use slotplan::cli::TaskLoader;
use slotplan::{
    ConflictType, EngineConfig, InMemoryTaskStore, SchedulingConstraints, SchedulingEngine,
    SchedulingError, StoreError, Task, TaskId, TaskPriority, TaskStore, TimeRestriction,
    WorkingHours,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
}

/// Store that fails every other lookup, standing in for a flaky backend
struct FlakyStore {
    inner: InMemoryTaskStore,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TaskStore for FlakyStore {
    async fn fetch_task(&self, id: TaskId) -> Result<Task, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.fetch_task(id).await
    }

    async fn fetch_dependencies(&self, id: TaskId) -> Result<Vec<Task>, StoreError> {
        self.inner.fetch_dependencies(id).await
    }
}

#[tokio::test]
async fn test_full_day_with_lunch_blackout() {
    let lunch = TimeRestriction::unavailable("lunch", at(2, 12, 0), at(2, 13, 0));
    let constraints = SchedulingConstraints::new(WorkingHours::from_hours(9, 17))
        .with_break_duration(Duration::minutes(10))
        .with_restriction(lunch);

    let spec = Task::new("spec")
        .with_priority(TaskPriority::High)
        .with_duration(Duration::minutes(110));
    let implement = Task::new("implement")
        .with_priority(TaskPriority::High)
        .with_duration(Duration::minutes(120))
        .with_dependencies(vec![spec.id]);
    let release = Task::new("release")
        .with_priority(TaskPriority::Critical)
        .with_duration(Duration::minutes(30))
        .with_due_date(at(2, 17, 0))
        .with_dependencies(vec![implement.id]);
    let ids = vec![release.id, implement.id, spec.id];

    let store = InMemoryTaskStore::from_tasks(vec![spec.clone(), implement.clone(), release.clone()]);
    let engine =
        SchedulingEngine::new(store, EngineConfig::default()).with_clock(|| at(2, 8, 45));

    let schedule = engine.create_schedule(&ids, constraints).await.unwrap();

    // spec 09:00-10:50, break, then 11:00 is free
    assert_eq!(schedule.slot_for(spec.id).unwrap().start, at(2, 9, 0));
    assert_eq!(schedule.slot_for(implement.id).unwrap().start, at(2, 11, 0));
    // implement ends 13:00, so release starts right after the break
    let release_slot = schedule.slot_for(release.id).unwrap();
    assert_eq!(release_slot.start, at(2, 13, 10));
    assert!(!release_slot.is_flexible);
    assert!(schedule.conflicts.is_empty());

    let analytics = engine.analyze(&schedule).await;
    assert_eq!(analytics.total_tasks, 3);
    assert_eq!(analytics.total_scheduled_minutes, 260);
    assert_eq!(analytics.buffer_minutes, 20);
    assert_eq!(analytics.priority_distribution[&TaskPriority::High], 2);
}

#[tokio::test]
async fn test_lunch_blackout_pushes_task_in_fixed_steps() {
    let lunch = TimeRestriction::unavailable("lunch", at(2, 12, 0), at(2, 12, 50));
    let constraints = SchedulingConstraints::default().with_restriction(lunch);
    let task = Task::new("after lunch");
    let store = InMemoryTaskStore::from_tasks(vec![task.clone()]);

    let schedule = SchedulingEngine::new(store, EngineConfig::default())
        .with_clock(|| at(2, 12, 5))
        .create_schedule(&[task.id], constraints)
        .await
        .unwrap();

    // 12:05 -> 12:20 -> 12:35 -> 12:50
    assert_eq!(schedule.slots[0].start, at(2, 12, 50));
}

#[tokio::test]
async fn test_flaky_store_lookups_are_skipped() {
    let tasks: Vec<Task> = (0..4).map(|i| Task::new(format!("t{}", i))).collect();
    let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
    let store = FlakyStore {
        inner: InMemoryTaskStore::from_tasks(tasks),
        calls: AtomicUsize::new(0),
    };

    let schedule = SchedulingEngine::new(store, EngineConfig::default())
        .with_clock(|| at(2, 9, 0))
        .create_schedule(&ids, SchedulingConstraints::default())
        .await
        .unwrap();

    assert_eq!(schedule.slots.len(), 2);
}

#[tokio::test]
async fn test_infeasible_when_blackout_never_ends() {
    let forever = TimeRestriction::unavailable("leave", at(1, 0, 0), at(1, 0, 0) + Duration::days(3650));
    let task = Task::new("stuck");
    let store = InMemoryTaskStore::from_tasks(vec![task.clone()]);

    let err = SchedulingEngine::new(store, EngineConfig::default())
        .with_clock(|| at(2, 9, 0))
        .create_schedule(&[task.id], SchedulingConstraints::default().with_restriction(forever))
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulingError::Infeasible { task_id, .. } if task_id == task.id));
}

#[tokio::test]
async fn test_schedule_from_task_file_round_trips_through_json() {
    let mut file = NamedTempFile::with_suffix(".json").unwrap();
    write!(
        file,
        r#"{{
            "tasks": [
                {{ "id": "3f0c9a1e-8c1b-4b7e-9d52-0a3c2f7e5b11", "title": "a", "estimated_duration": 3600 }},
                {{ "id": "8a6d4b2c-1f3e-4a5b-8c7d-9e0f1a2b3c4d", "title": "b", "estimated_duration": 1800,
                   "dependencies": ["3f0c9a1e-8c1b-4b7e-9d52-0a3c2f7e5b11"] }}
            ]
        }}"#
    )
    .unwrap();

    let task_file = TaskLoader::load(file.path()).unwrap();
    let ids = task_file.task_ids();
    let engine = SchedulingEngine::new(task_file.into_store(), EngineConfig::default())
        .with_clock(|| at(2, 9, 0));
    let schedule = engine
        .create_schedule(&ids, SchedulingConstraints::default())
        .await
        .unwrap();

    let json = serde_json::to_string(&schedule).unwrap();
    let restored: slotplan::TaskSchedule = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, schedule);
    assert!(restored.conflicts_of_type(ConflictType::DependencyViolation).is_empty());
    assert_eq!(restored.total_estimated_duration, Duration::minutes(90));
}

//! Integration tests for cascading task deletion.
//!
//! These tests drive `TrackingServices` against the in-memory database and
//! verify:
//! 1. The single `task_delete` event lists every dependent that was removed
//! 2. Nothing else in the database is touched
//! 3. A missing task changes nothing and publishes nothing
//! 4. Events reach the broadcaster in commit order through the worker pool

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use timekeeper::adapters::{
    CapturingPublisher, DeliveryPoolConfig, DeliveryWorkerPool, MemoryDatabase,
    RecordingBroadcaster,
};
use timekeeper::application::TrackingServices;
use timekeeper::domain::foundation::{
    ScheduleEntryId, SessionId, SessionRecordId, TaskId, Timestamp,
};
use timekeeper::domain::notification::NotificationType;
use timekeeper::domain::tracking::{
    Resource, ScheduleEntry, Session, SessionDraft, SessionRecord, SessionRecordDraft, Task,
    TaskDraft,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    db: Arc<MemoryDatabase>,
    publisher: Arc<CapturingPublisher>,
    services: TrackingServices<MemoryDatabase>,
}

impl Harness {
    fn new() -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let publisher = Arc::new(CapturingPublisher::new());
        let services = TrackingServices::new(db.clone(), db.stores(), publisher.clone());
        Self {
            db,
            publisher,
            services,
        }
    }

    fn last_event_json(&self) -> Value {
        let events = self.publisher.published_events();
        let last = events.last().expect("no event published");
        serde_json::to_value(last).unwrap()
    }
}

fn task(id: i64) -> Task {
    Task::from_draft(TaskId::new(id), TaskDraft::new(format!("task {id}")))
}

fn session(id: i64, task_id: i64) -> Session {
    Session {
        id: SessionId::new(id),
        task_id: Some(TaskId::new(task_id)),
        started_at: Timestamp::now(),
        ended_at: Some(Timestamp::now()),
    }
}

fn record(id: i64, session_id: i64, task_id: i64) -> SessionRecord {
    SessionRecord::from_draft(
        SessionRecordId::new(id),
        SessionRecordDraft::new(Some(SessionId::new(session_id)), Some(TaskId::new(task_id)), 900),
    )
}

fn entry(id: i64, task_id: i64) -> ScheduleEntry {
    ScheduleEntry {
        id: ScheduleEntryId::new(id),
        task_id: Some(TaskId::new(task_id)),
        starts_at: Timestamp::now(),
        ends_at: Timestamp::now(),
    }
}

// =============================================================================
// Event Contents
// =============================================================================

#[tokio::test]
async fn task_with_dependents_publishes_one_event_listing_all_of_them() {
    let h = Harness::new();
    h.db.put(task(10)).await;
    h.db.put(session(101, 10)).await;
    h.db.put(session(102, 10)).await;
    h.db.put(record(201, 101, 10)).await;
    h.db.put(record(202, 102, 10)).await;
    h.db.put(entry(301, 10)).await;

    let summary = h.services.delete_task(TaskId::new(10)).await.unwrap();

    assert_eq!(summary.dependent_count(), 5);
    assert_eq!(h.publisher.event_count(), 1);

    let event = h.last_event_json();
    assert_eq!(event["notificationType"], "task_delete");
    assert_eq!(event["id"], 10);
    assert_eq!(event["ids"], Value::Null);
    assert_eq!(event["data"], Value::Null);
    assert_eq!(
        event["affected"],
        json!([
            {"notificationType": "session_delete", "ids": [101, 102]},
            {"notificationType": "session_record_delete", "ids": [201, 202]},
            {"notificationType": "schedule_entry_delete", "ids": [301]},
        ])
    );
    assert!(event["timestamp"].is_i64());
}

#[tokio::test]
async fn task_without_dependents_lists_three_empty_groups() {
    let h = Harness::new();
    h.db.put(task(20)).await;

    h.services.delete_task(TaskId::new(20)).await.unwrap();

    let event = h.last_event_json();
    assert_eq!(event["id"], 20);
    assert_eq!(
        event["affected"],
        json!([
            {"notificationType": "session_delete", "ids": []},
            {"notificationType": "session_record_delete", "ids": []},
            {"notificationType": "schedule_entry_delete", "ids": []},
        ])
    );
}

#[tokio::test]
async fn dependents_are_not_announced_individually() {
    let h = Harness::new();
    h.db.put(task(10)).await;
    h.db.put(session(101, 10)).await;
    h.db.put(record(201, 101, 10)).await;

    h.services.delete_task(TaskId::new(10)).await.unwrap();

    assert!(!h.publisher.has_event(NotificationType::SessionDelete));
    assert!(!h.publisher.has_event(NotificationType::SessionRecordDelete));
    assert_eq!(h.publisher.events_of_type(NotificationType::TaskDelete).len(), 1);
}

// =============================================================================
// Database Effects
// =============================================================================

#[tokio::test]
async fn unrelated_rows_survive_the_cascade() {
    let h = Harness::new();
    h.db.put(task(10)).await;
    h.db.put(task(11)).await;
    h.db.put(session(101, 10)).await;
    h.db.put(session(111, 11)).await;
    h.db.put(record(211, 111, 11)).await;
    h.db.put(entry(311, 11)).await;

    h.services.delete_task(TaskId::new(10)).await.unwrap();

    let tables = h.db.snapshot().await;
    assert!(!tables.contains::<Task>(TaskId::new(10)));
    assert!(tables.contains::<Task>(TaskId::new(11)));
    assert!(tables.contains::<Session>(SessionId::new(111)));
    assert!(tables.contains::<SessionRecord>(SessionRecordId::new(211)));
    assert!(tables.contains::<ScheduleEntry>(ScheduleEntryId::new(311)));
}

#[tokio::test]
async fn missing_task_is_not_found_with_no_writes_and_no_event() {
    let h = Harness::new();
    h.db.put(task(11)).await;
    h.db.put(session(101, 11)).await;
    let before = h.db.snapshot().await;

    let err = h.services.delete_task(TaskId::new(999)).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(h.publisher.event_count(), 0);
    assert_eq!(h.db.committed_writes(), 0);
    assert_eq!(h.db.snapshot().await, before);
}

#[tokio::test]
async fn records_of_other_tasks_pointing_at_deleted_sessions_are_detached() {
    let h = Harness::new();
    h.db.put(task(10)).await;
    h.db.put(task(11)).await;
    h.db.put(session(101, 10)).await;
    // Belongs to task 11 but was recorded against a session of task 10
    h.db.put(record(250, 101, 11)).await;

    h.services.delete_task(TaskId::new(10)).await.unwrap();

    let tables = h.db.snapshot().await;
    let survivor = tables
        .get::<SessionRecord>(SessionRecordId::new(250))
        .expect("record of another task must survive");
    assert_eq!(survivor.session_id, None);
    assert_eq!(survivor.task_id, Some(TaskId::new(11)));
}

// =============================================================================
// Ordering Through The Delivery Pool
// =============================================================================

#[tokio::test]
async fn sequential_mutations_reach_subscribers_in_commit_order() {
    let db = Arc::new(MemoryDatabase::new());
    let broadcaster = Arc::new(RecordingBroadcaster::new());
    let (publisher, pool) = DeliveryWorkerPool::start(
        DeliveryPoolConfig::default().with_workers(3),
        broadcaster.clone(),
    );
    let services = TrackingServices::new(db.clone(), db.stores(), Arc::new(publisher));

    let created = services.create_task(TaskDraft::new("Write report")).await.unwrap();
    let started = services
        .create_session(SessionDraft {
            task_id: Some(created.id),
            started_at: Timestamp::now(),
            ended_at: None,
        })
        .await
        .unwrap();
    services
        .create_session_record(SessionRecordDraft::new(Some(started.id), Some(created.id), 120))
        .await
        .unwrap();
    services.delete_task(created.id).await.unwrap();

    drop(services);
    let stats = pool.shutdown().await;

    let types: Vec<NotificationType> = broadcaster
        .envelopes()
        .iter()
        .map(|e| e.notification_type())
        .collect();
    assert_eq!(
        types,
        vec![
            NotificationType::TaskCreate,
            NotificationType::SessionCreate,
            NotificationType::SessionRecordCreate,
            NotificationType::TaskDelete,
        ]
    );
    assert_eq!(stats.forwarded, 4);
    assert_eq!(stats.dropped, 0);
}

// =============================================================================
// Property: affected ids are exactly the task's dependents
// =============================================================================

#[derive(Debug, Clone)]
struct Population {
    /// Owning task (0..3) of each session, record and entry.
    sessions: Vec<i64>,
    records: Vec<i64>,
    entries: Vec<i64>,
}

fn population() -> impl Strategy<Value = Population> {
    (
        prop::collection::vec(0i64..3, 0..8),
        prop::collection::vec(0i64..3, 0..8),
        prop::collection::vec(0i64..3, 0..8),
    )
        .prop_map(|(sessions, records, entries)| Population {
            sessions,
            records,
            entries,
        })
}

fn owned_ids(owners: &[i64], base: i64, task: i64) -> BTreeSet<i64> {
    owners
        .iter()
        .enumerate()
        .filter(|(_, owner)| **owner == task)
        .map(|(n, _)| base + n as i64)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn affected_ids_match_dependents_exactly(pop in population(), target in 0i64..3) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (event, tables) = runtime.block_on(async {
            let h = Harness::new();
            for t in 0..3 {
                h.db.put(task(t)).await;
            }
            for (n, owner) in pop.sessions.iter().enumerate() {
                h.db.put(session(100 + n as i64, *owner)).await;
            }
            for (n, owner) in pop.records.iter().enumerate() {
                // Sessions are not necessarily from the same task
                h.db.put(record(200 + n as i64, 100, *owner)).await;
            }
            for (n, owner) in pop.entries.iter().enumerate() {
                h.db.put(entry(300 + n as i64, *owner)).await;
            }

            h.services.delete_task(TaskId::new(target)).await.unwrap();
            (h.publisher.published_events(), h.db.snapshot().await)
        });

        prop_assert_eq!(event.len(), 1);
        let groups = event[0].affected().unwrap();
        prop_assert_eq!(groups.len(), 3);

        let expected = [
            owned_ids(&pop.sessions, 100, target),
            owned_ids(&pop.records, 200, target),
            owned_ids(&pop.entries, 300, target),
        ];
        for (group, expected) in groups.iter().zip(expected.iter()) {
            let actual: BTreeSet<i64> = group.ids().iter().copied().collect();
            prop_assert_eq!(&actual, expected);
            prop_assert_eq!(actual.len(), group.ids().len());
        }

        // Nothing that belonged to another task was removed
        for (n, owner) in pop.sessions.iter().enumerate() {
            let present = tables.contains::<Session>(SessionId::new(100 + n as i64));
            prop_assert_eq!(present, *owner != target);
        }
        for (n, owner) in pop.records.iter().enumerate() {
            let present = tables.contains::<SessionRecord>(SessionRecordId::new(200 + n as i64));
            prop_assert_eq!(present, *owner != target);
        }
        for (n, owner) in pop.entries.iter().enumerate() {
            let present = tables.contains::<ScheduleEntry>(ScheduleEntryId::new(300 + n as i64));
            prop_assert_eq!(present, *owner != target);
        }
    }
}

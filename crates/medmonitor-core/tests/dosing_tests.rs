//! Dosing service integration and property tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use medmonitor_core::db::Database;
use medmonitor_core::dosing::{DosingService, RefillNeeded};
use medmonitor_core::models::{DoseAction, NewMedication, NewUser};
use proptest::prelude::*;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(7, 59, 0)
        .unwrap()
}

fn setup(inventory: i64, threshold: i64) -> (Database, i64) {
    let db = Database::open_in_memory().unwrap();
    let user_id = db.insert_user(&NewUser::new("Anna", 34).unwrap()).unwrap();
    let med = NewMedication::new(user_id, "Aspirin", "1 tablet", "08:00")
        .unwrap()
        .with_inventory_count(inventory)
        .with_refill_threshold(threshold);
    let id = db.insert_medication(&med).unwrap();
    (db, id)
}

fn action_strategy() -> impl Strategy<Value = DoseAction> {
    prop_oneof![
        Just(DoseAction::Taken),
        Just(DoseAction::Postponed),
        Just(DoseAction::Skipped),
    ]
}

#[test]
fn test_taken_then_postponed_scenario() {
    let (db, id) = setup(5, 5);
    let service = DosingService::new(&db);

    let taken = service.record_at(id, DoseAction::Taken, 1, start()).unwrap();
    assert_eq!(taken.medication.inventory_count, 4);
    assert_eq!(
        taken.refill,
        Some(RefillNeeded {
            medication_id: id,
            medication_name: "Aspirin".into(),
            inventory_count: 4,
            refill_threshold: 5,
        })
    );

    let postponed = service
        .record_at(id, DoseAction::Postponed, 1, start() + Duration::minutes(10))
        .unwrap();
    assert_eq!(postponed.medication.inventory_count, 4);
    assert!(postponed.refill_needed());

    let events = db.list_dose_events(id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, DoseAction::Taken);
    assert_eq!(events[1].action, DoseAction::Postponed);
}

#[test]
fn test_wall_clock_timestamps_non_decreasing() {
    let (db, id) = setup(100, 5);
    let service = DosingService::new(&db);

    for action in [DoseAction::Taken, DoseAction::Skipped, DoseAction::Taken] {
        service.record(id, action, 1).unwrap();
    }

    let times: Vec<NaiveDateTime> = db
        .list_dose_events(id)
        .unwrap()
        .iter()
        .map(|e| NaiveDateTime::parse_from_str(&e.action_time, "%Y-%m-%d %H:%M:%S").unwrap())
        .collect();
    assert_eq!(times.len(), 3);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

proptest! {
    #[test]
    fn prop_inventory_and_refill(
        inventory in -20i64..200,
        threshold in -5i64..50,
        steps in prop::collection::vec((action_strategy(), 1i64..5), 1..20),
    ) {
        let (db, id) = setup(inventory, threshold);
        let service = DosingService::new(&db);

        let mut expected = inventory;
        let mut now = start();
        for (i, (action, quantity)) in steps.iter().enumerate() {
            let outcome = service.record_at(id, *action, *quantity, now).unwrap();

            if *action == DoseAction::Taken {
                expected -= quantity;
            }
            prop_assert_eq!(outcome.medication.inventory_count, expected);
            prop_assert_eq!(outcome.refill_needed(), expected <= threshold);
            prop_assert_eq!(db.count_dose_events(id).unwrap(), (i + 1) as u64);

            now += Duration::seconds(30);
        }

        let events = db.list_dose_events(id).unwrap();
        prop_assert_eq!(events.len(), steps.len());
        for (event, (action, _)) in events.iter().zip(steps.iter()) {
            prop_assert_eq!(event.action, *action);
        }
        prop_assert!(events.windows(2).all(|w| w[0].action_time <= w[1].action_time));
    }
}

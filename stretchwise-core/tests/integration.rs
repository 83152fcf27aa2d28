//! Integration tests for the selection engine, stores and analytics
//!
//! Every scenario runs against both storage backends.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use stretchwise_core::analytics::{detailed_stats_table, StatsSummary};
use stretchwise_core::config::{StorageBackend, StorageConfig};
use stretchwise_core::engine::{compute_weights, record_action, select_next, SelectionResult};
use stretchwise_core::{
    catalog, open_store, ActionKind, Category, Config, Database, Error, JsonStore, NewStretch,
    Preferences, Priority, Store,
};
use tempfile::TempDir;

fn backends() -> Vec<(&'static str, Box<dyn Store>)> {
    let db = Database::open_in_memory().expect("failed to open in-memory database");
    db.migrate().expect("failed to migrate");
    vec![
        ("sqlite", Box::new(db) as Box<dyn Store>),
        ("json", Box::new(JsonStore::in_memory())),
    ]
}

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 14, 8, 30, 0).unwrap()
}

fn today() -> NaiveDate {
    morning().date_naive()
}

fn squat_hold() -> NewStretch {
    NewStretch::new(
        "Squat Hold",
        Priority::High,
        Category::Hips,
        "Hold a deep squat for one minute.",
    )
}

#[test]
fn single_stretch_is_offered_then_limit_reached() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let id = store.add(&squat_hold()).unwrap();
        assert_eq!(id, 1, "{name}");

        let mut rng = StdRng::seed_from_u64(11);
        let first = select_next(store, today(), &mut rng).unwrap();
        assert_eq!(first.stretch().map(|s| s.id), Some(1), "{name}");

        record_action(store, id, ActionKind::Completed, &morning()).unwrap();

        for _ in 0..5 {
            let again = select_next(store, today(), &mut rng).unwrap();
            assert!(
                matches!(again, SelectionResult::LimitReached { .. }),
                "{name}: expected limit reached, got {:?}",
                again
            );
        }

        // A new day reopens the stretch
        let tomorrow = today() + Duration::days(1);
        let next_day = select_next(store, tomorrow, &mut rng).unwrap();
        assert_eq!(next_day.stretch().map(|s| s.id), Some(1), "{name}");
    }
}

#[test]
fn two_skips_block_but_one_does_not() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let id = store.add(&squat_hold()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        record_action(store, id, ActionKind::Skipped, &morning()).unwrap();
        let after_one = select_next(store, today(), &mut rng).unwrap();
        assert!(after_one.stretch().is_some(), "{name}");

        record_action(store, id, ActionKind::Skipped, &(morning() + Duration::hours(1))).unwrap();
        let after_two = select_next(store, today(), &mut rng).unwrap();
        assert!(
            matches!(after_two, SelectionResult::LimitReached { .. }),
            "{name}"
        );
    }
}

#[test]
fn empty_and_disabled_catalog_reports_empty() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(
            matches!(
                select_next(store, today(), &mut rng).unwrap(),
                SelectionResult::EmptyCatalog { .. }
            ),
            "{name}"
        );

        let mut disabled = squat_hold();
        disabled.enabled = Some(false);
        store.add(&disabled).unwrap();
        assert!(
            matches!(
                select_next(store, today(), &mut rng).unwrap(),
                SelectionResult::EmptyCatalog { .. }
            ),
            "{name}"
        );
    }
}

#[test]
fn priority_weights_split_three_to_one() {
    for (name, store) in backends() {
        let store = store.as_ref();
        store.add(&squat_hold()).unwrap();
        store
            .add(&NewStretch::new(
                "Plank",
                Priority::Low,
                Category::Core,
                "Hold a forearm plank.",
            ))
            .unwrap();

        let prefs = Preferences {
            high_priority_weight: 3.0,
            low_priority_weight: 1.0,
            recency_weight: 2.0,
            never_done_bonus: 5.0,
            ..Preferences::default()
        };
        store.save_preferences(&prefs).unwrap();

        let weights = compute_weights(
            &store.list_enabled().unwrap(),
            &store.query_all().unwrap(),
            &store.preferences().unwrap(),
            today(),
        );
        assert!((weights[0] - 0.75).abs() < 1e-9, "{name}: {:?}", weights);
        assert!((weights[1] - 0.25).abs() < 1e-9, "{name}: {:?}", weights);
    }
}

#[test]
fn add_then_get_round_trips() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let input = squat_hold();
        let id = store.add(&input).unwrap();
        let stored = store.get(id).unwrap().expect("stretch should exist");
        assert_eq!(stored, input.clone().with_id(id), "{name}");
        assert_eq!(stored.enabled, Some(true), "{name}");

        assert!(
            matches!(store.add(&input), Err(Error::DuplicateName(_))),
            "{name}"
        );
    }
}

#[test]
fn names_are_unique_case_sensitively() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let plank = |n: &str| NewStretch::new(n, Priority::Low, Category::Core, "Hold a plank.");

        let upper = store.add(&plank("Plank")).unwrap();
        let lower = store.add(&plank("plank")).unwrap();
        assert_ne!(upper, lower, "{name}");
        assert_eq!(store.list().unwrap().len(), 2, "{name}");

        assert!(
            matches!(store.add(&plank("Plank")), Err(Error::DuplicateName(_))),
            "{name}"
        );
    }
}

#[test]
fn add_stores_trimmed_text() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let padded = NewStretch::new(
            "  Plank ",
            Priority::Low,
            Category::Core,
            " Hold a plank.\n",
        );
        let id = store.add(&padded).unwrap();

        let stored = store.get(id).unwrap().expect("stretch should exist");
        assert_eq!(stored.name, "Plank", "{name}");
        assert_eq!(stored.description, "Hold a plank.", "{name}");

        // Trimmed names collide with existing ones
        assert!(
            matches!(
                store.add(&NewStretch::new("Plank  ", Priority::High, Category::Core, "x")),
                Err(Error::DuplicateName(_))
            ),
            "{name}"
        );
    }
}

#[test]
fn delete_removes_stretch_and_history() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let id = store.add(&squat_hold()).unwrap();
        record_action(store, id, ActionKind::Completed, &morning()).unwrap();
        record_action(store, id, ActionKind::Skipped, &(morning() - Duration::days(1))).unwrap();

        assert_eq!(store.delete(id).unwrap(), 2, "{name}");
        assert!(store.query_by_stretch(id).unwrap().is_empty(), "{name}");
        assert!(store.get(id).unwrap().is_none(), "{name}");
        assert!(
            matches!(
                record_action(store, id, ActionKind::Completed, &morning()),
                Err(Error::NotFound(_))
            ),
            "{name}"
        );
    }
}

#[test]
fn stats_follow_recorded_history() {
    for (name, store) in backends() {
        let store = store.as_ref();
        let added = catalog::seed_starter_catalog(store).unwrap();
        assert!(added > 0, "{name}");
        let stretches = store.list().unwrap();
        let first = stretches[0].id;
        let second = stretches[1].id;

        for days_ago in 0..3 {
            let at = morning() - Duration::days(days_ago);
            record_action(store, first, ActionKind::Completed, &at).unwrap();
        }
        record_action(store, second, ActionKind::Completed, &morning()).unwrap();
        record_action(store, second, ActionKind::Skipped, &(morning() - Duration::days(5)))
            .unwrap();

        let summary = StatsSummary::compute(&store.query_all().unwrap(), today());
        assert_eq!(summary.today_completed, 2, "{name}");
        assert_eq!(summary.current_streak, 3, "{name}");
        assert_eq!(summary.longest_streak, 3, "{name}");
        assert_eq!(summary.total_completed, 4, "{name}");
        assert_eq!(summary.favorite.as_deref(), Some(stretches[0].name.as_str()));

        let table = detailed_stats_table(&store.query_all().unwrap(), &stretches);
        assert_eq!(table.len(), stretches.len(), "{name}");
        assert_eq!(table[0].stretch_id, first, "{name}");
        assert_eq!(table[1].success_rate_display(), "50.0%", "{name}");

        assert_eq!(store.delete_all().unwrap(), 5, "{name}");
        assert!(store.daily_aggregates().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn file_backends_persist_across_reopen() {
    let temp = TempDir::new().unwrap();

    for backend in [StorageBackend::Sqlite, StorageBackend::Json] {
        let config = Config {
            storage: StorageConfig {
                backend,
                path: Some(temp.path().join(backend.default_file_name())),
            },
            ..Default::default()
        };

        {
            let store = open_store(&config).unwrap();
            let id = store.add(&squat_hold()).unwrap();
            record_action(store.as_ref(), id, ActionKind::Completed, &morning()).unwrap();
        }

        let store = open_store(&config).unwrap();
        let stretches = store.list().unwrap();
        assert_eq!(stretches.len(), 1, "{}", backend.as_str());
        assert_eq!(store.query_all().unwrap().len(), 1, "{}", backend.as_str());
        assert_eq!(store.query_by_date(today()).unwrap().len(), 1);
    }
}

#[test]
fn json_file_with_legacy_stretch_fields_still_selects() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.json");
    std::fs::write(
        &path,
        r#"{"stretches": [
            {"id": 1, "name": "Old", "priority": "medium", "category": "hips", "description": "d"},
            {"id": 2, "name": "Older", "description": "no priority or category"}
        ]}"#,
    )
    .unwrap();

    let config = Config {
        storage: StorageConfig {
            backend: StorageBackend::Json,
            path: Some(path),
        },
        ..Default::default()
    };
    let store = open_store(&config).unwrap();

    let stretches = store.list().unwrap();
    assert_eq!(stretches[0].priority, Priority::Low);
    assert_eq!(stretches[0].category, Category::Hips);
    assert_eq!(stretches[1].priority, Priority::Low);
    assert_eq!(stretches[1].category, Category::General);

    // Both fall back to low priority, so they weigh the same
    let weights = compute_weights(
        &stretches,
        &[],
        &store.preferences().unwrap(),
        today(),
    );
    assert!((weights[0] - 0.5).abs() < 1e-9, "{:?}", weights);

    let mut rng = StdRng::seed_from_u64(9);
    let picked = select_next(store.as_ref(), today(), &mut rng).unwrap();
    assert!(picked.stretch().is_some());
}

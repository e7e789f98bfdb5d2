//! Classification properties, checked against both version store backends.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsmon::content_digest;
use jsmon::model::{PollOutcome, TargetId};
use jsmon::store::{MemoryVersionStore, SqliteVersionStore, VersionStore};
use jsmon::{Classification, MonitorError};

const URL: &str = "https://cdn.example.com/lib/app.min.js";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn observe(
    store: &dyn VersionStore,
    target_id: &TargetId,
    body: &str,
    at: DateTime<Utc>,
) -> Classification {
    let d = content_digest(body.as_bytes());
    store.classify(target_id, &d.digest, d.size, at).unwrap()
}

fn backends() -> Vec<(&'static str, Box<dyn VersionStore>)> {
    vec![
        ("memory", Box::new(MemoryVersionStore::new())),
        ("sqlite", Box::new(SqliteVersionStore::open_in_memory().unwrap())),
    ]
}

#[test]
fn first_sighting_creates_version_one() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        let c = observe(store.as_ref(), &target.target_id, "var x=1;", t0());

        assert_eq!(c.outcome, PollOutcome::FirstSighting, "{name}");
        assert_eq!(c.version, 1, "{name}");
        assert!(c.previous.is_none(), "{name}");

        let history = store.history(&target.target_id).unwrap();
        assert_eq!(history.len(), 1, "{name}");
        assert_eq!(history[0].first_seen, t0(), "{name}");
        assert_eq!(history[0].last_seen, t0(), "{name}");
        assert_eq!(history[0].content_size, 8, "{name}");
    }
}

#[test]
fn identical_content_only_moves_last_seen() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        observe(store.as_ref(), &target.target_id, "var x=1;", t0());

        for hours in 1..=3 {
            let c = observe(
                store.as_ref(),
                &target.target_id,
                "var x=1;",
                t0() + Duration::hours(hours),
            );
            assert_eq!(c.outcome, PollOutcome::KnownVersion, "{name}");
            assert_eq!(c.version, 1, "{name}");
        }

        let history = store.history(&target.target_id).unwrap();
        assert_eq!(history.len(), 1, "{name}");
        assert_eq!(history[0].first_seen, t0(), "{name}");
        assert_eq!(history[0].last_seen, t0() + Duration::hours(3), "{name}");
    }
}

#[test]
fn novel_content_appends_new_version() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        observe(store.as_ref(), &target.target_id, "var x=1;", t0());
        let c = observe(
            store.as_ref(),
            &target.target_id,
            "var x=2;",
            t0() + Duration::hours(1),
        );

        assert_eq!(c.outcome, PollOutcome::NewVersion, "{name}");
        assert_eq!(c.version, 2, "{name}");
        let previous = c.previous.unwrap();
        assert_eq!(previous.version, 1, "{name}");
        assert_eq!(previous.content_digest, content_digest(b"var x=1;").digest, "{name}");
    }
}

#[test]
fn revert_to_previous_content_is_reused_version() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        observe(store.as_ref(), &target.target_id, "A", t0());
        observe(store.as_ref(), &target.target_id, "B", t0() + Duration::hours(1));
        let c = observe(store.as_ref(), &target.target_id, "A", t0() + Duration::hours(2));

        assert_eq!(c.outcome, PollOutcome::ReusedVersion { reverted_to: 1 }, "{name}");
        assert_eq!(c.version, 3, "{name}");
        assert_eq!(c.previous.unwrap().version, 2, "{name}");
    }
}

/// A revert to content seen two or more versions back is still a rollback.
/// Checking membership against only the immediately preceding record would
/// report it as a brand new version.
#[test]
fn revert_further_back_is_reused_version() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        for (i, body) in ["A", "B", "C"].iter().enumerate() {
            observe(
                store.as_ref(),
                &target.target_id,
                body,
                t0() + Duration::hours(i as i64),
            );
        }
        let c = observe(store.as_ref(), &target.target_id, "A", t0() + Duration::hours(5));

        assert_eq!(c.outcome, PollOutcome::ReusedVersion { reverted_to: 1 }, "{name}");
        assert_eq!(c.version, 4, "{name}");
    }
}

#[test]
fn rollback_reports_most_recent_matching_version() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        // A(1) B(2) A(3) C(4) -> A matches versions 1 and 3.
        for (i, body) in ["A", "B", "A", "C"].iter().enumerate() {
            observe(
                store.as_ref(),
                &target.target_id,
                body,
                t0() + Duration::hours(i as i64),
            );
        }
        let c = observe(store.as_ref(), &target.target_id, "A", t0() + Duration::hours(9));
        assert_eq!(c.outcome, PollOutcome::ReusedVersion { reverted_to: 3 }, "{name}");
        assert_eq!(c.version, 5, "{name}");
    }
}

#[test]
fn versions_are_dense_and_history_is_most_recent_first() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        for (i, body) in ["1", "2", "2", "3", "1", "1", "4"].iter().enumerate() {
            observe(
                store.as_ref(),
                &target.target_id,
                body,
                t0() + Duration::minutes(i as i64),
            );
        }

        let versions: Vec<u32> = store
            .history(&target.target_id)
            .unwrap()
            .iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, vec![5, 4, 3, 2, 1], "{name}");
    }
}

#[test]
fn targets_are_isolated() {
    for (name, store) in backends() {
        let a = store.register("https://a.example/x.js", t0()).unwrap();
        let b = store.register("https://b.example/x.js", t0()).unwrap();

        observe(store.as_ref(), &a.target_id, "same", t0());
        let c = observe(store.as_ref(), &b.target_id, "same", t0());
        assert_eq!(c.outcome, PollOutcome::FirstSighting, "{name}");
        assert_eq!(store.history(&a.target_id).unwrap().len(), 1, "{name}");
    }
}

#[test]
fn registration_is_idempotent_and_ordered() {
    for (name, store) in backends() {
        let first = store.register("https://b.example/x.js", t0()).unwrap();
        store.register("https://a.example/x.js", t0()).unwrap();
        let again = store
            .register("https://b.example/x.js", t0() + Duration::days(1))
            .unwrap();

        assert_eq!(again, first, "{name}");
        let urls: Vec<String> = store.targets().unwrap().into_iter().map(|t| t.url).collect();
        assert_eq!(urls, vec!["https://b.example/x.js", "https://a.example/x.js"], "{name}");
    }
}

#[test]
fn register_all_counts_new_targets() {
    for (name, store) in backends() {
        let urls = vec![
            "https://a.example/x.js".to_string(),
            "https://a.example/x.js".to_string(),
            "https://b.example/y.js".to_string(),
        ];
        assert_eq!(store.register_all(&urls, t0()).unwrap(), 2, "{name}");
        assert_eq!(store.register_all(&urls, t0()).unwrap(), 0, "{name}");
    }
}

#[test]
fn unregistered_target_is_precondition_error() {
    for (name, store) in backends() {
        let d = content_digest(b"x");
        let err = store
            .classify(&TargetId::for_url(URL), &d.digest, d.size, t0())
            .unwrap_err();
        assert!(matches!(err, MonitorError::Precondition(_)), "{name}: {err:?}");
        assert!(store.history(&TargetId::for_url(URL)).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn empty_content_is_a_valid_version() {
    for (name, store) in backends() {
        let target = store.register(URL, t0()).unwrap();
        let c = observe(store.as_ref(), &target.target_id, "", t0());
        assert_eq!(c.outcome, PollOutcome::FirstSighting, "{name}");
        assert_eq!(store.history(&target.target_id).unwrap()[0].content_size, 0, "{name}");
    }
}

// ============================================================================
// Concurrent writers
// ============================================================================

const WRITERS: u32 = 16;

/// Classify a distinct body per thread, all at once, through `stores[i % len]`.
fn classify_concurrently(stores: &[&dyn VersionStore], target_id: &TargetId) -> Vec<u32> {
    let barrier = std::sync::Barrier::new(WRITERS as usize);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = stores[i as usize % stores.len()];
                let barrier = &barrier;
                scope.spawn(move || {
                    let d = content_digest(format!("var build={i};").as_bytes());
                    barrier.wait();
                    store.classify(target_id, &d.digest, d.size, t0())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap().version)
            .collect()
    })
}

fn assert_dense_versions(name: &str, store: &dyn VersionStore, target_id: &TargetId, mut versions: Vec<u32>) {
    versions.sort_unstable();
    assert_eq!(versions, (1..=WRITERS).collect::<Vec<_>>(), "{name}");
    let history = store.history(target_id).unwrap();
    assert_eq!(history.len(), WRITERS as usize, "{name}");
    let recorded: Vec<u32> = history.iter().map(|r| r.version).collect();
    assert_eq!(recorded, (1..=WRITERS).rev().collect::<Vec<_>>(), "{name}");
}

#[test]
fn concurrent_classify_assigns_each_version_once() {
    let tmp = tempfile::tempdir().unwrap();
    let memory = MemoryVersionStore::new();
    let sqlite = SqliteVersionStore::open(&tmp.path().join("jsmon.sqlite3")).unwrap();
    let stores: [(&str, &dyn VersionStore); 2] = [("memory", &memory), ("sqlite file", &sqlite)];

    for (name, store) in stores {
        let target = store.register(URL, t0()).unwrap();
        let versions = classify_concurrently(&[store], &target.target_id);
        assert_dense_versions(name, store, &target.target_id, versions);
    }
}

#[test]
fn concurrent_classify_across_database_handles() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("jsmon.sqlite3");
    let handles: Vec<SqliteVersionStore> = (0..4)
        .map(|_| SqliteVersionStore::open(&path).unwrap())
        .collect();
    let target = handles[0].register(URL, t0()).unwrap();

    let stores: Vec<&dyn VersionStore> = handles.iter().map(|s| s as &dyn VersionStore).collect();
    let versions = classify_concurrently(&stores, &target.target_id);
    assert_dense_versions("sqlite handles", &handles[1], &target.target_id, versions);
}

//! Facade integration tests: load-time wiring, the pooled-object
//! round-trip, and concurrent query execution.

use std::sync::Arc;
use std::thread;

use eyre::bail;
use rankdb::{Config, Database, Id, MemoryStorage, Set, Storage};

fn open(config: Config, storage: &MemoryStorage) -> Database {
    Database::open(config, storage, storage.clone()).unwrap()
}

fn sample() -> MemoryStorage {
    MemoryStorage::new()
        .with_id("a-1", 1)
        .with_id("b-2", 2)
        .with_id("c-3", 3)
        .with_list("recent", (1..=60).collect())
        .with_set("odd", (1..=60).filter(|id| id % 2 == 1).collect())
        .with_payload(2, b"two")
}

#[test]
fn dictionary_resolves_both_directions() {
    let storage = sample();
    let db = open(Config::new().path("corpus-a"), &storage);

    assert_eq!(db.id_count(), 3);
    assert_eq!(db.id("a-1"), Some(1));
    assert_eq!(db.external_id(2), Some("b-2"));
    assert_eq!(db.id("z-9"), None);
    assert_eq!(db.external_id(9), None);
    assert_eq!(db.path(), "corpus-a");
}

#[test]
fn unknown_set_lookups_share_one_empty_singleton() {
    let storage = sample();
    let db = open(Config::new(), &storage);

    let a = db.set("missing-a");
    let b = db.set("missing-b");
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &Set::empty()));
    assert_eq!(a.len(), 0);
}

#[test]
fn checkout_after_release_starts_from_canonical_state() {
    let storage = sample();
    let db = open(Config::new(), &storage);

    // Configure everything away from the defaults, then release.
    let configured = db
        .query("recent")
        .and("odd")
        .desc()
        .offset(7)
        .limit(3)
        .execute();
    assert_eq!(configured.len(), 3);
    configured.release();

    // The recycled query must behave as freshly built: ascending, offset
    // 0, no filters, default page of 50.
    let fresh = db.query("recent").execute();
    assert_eq!(fresh.len(), 50);
    assert_eq!(fresh.ids()[0], 1);
    assert_eq!(fresh.ids()[49], 50);
    assert!(fresh.more());
    fresh.release();
}

#[test]
fn fetch_serves_payloads_and_misses() {
    let storage = sample();
    let db = open(Config::new(), &storage);

    assert_eq!(&db.fetch(2).unwrap()[..], b"two");
    assert!(db.fetch(55).is_none());
}

#[test]
fn queries_run_concurrently() {
    let storage = sample();
    let db = Arc::new(open(Config::new(), &storage));

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for _ in 0..50 {
                    let result = db
                        .query("recent")
                        .and("odd")
                        .offset(worker % 3)
                        .limit(10)
                        .execute();
                    let ids = result.ids().to_vec();
                    assert!(ids.len() <= 10);
                    assert!(ids.iter().all(|id| id % 2 == 1));
                    result.release();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

struct BrokenStorage;

impl Storage for BrokenStorage {
    fn id_count(&self) -> u32 {
        0
    }

    fn list_count(&self) -> u32 {
        0
    }

    fn set_count(&self) -> u32 {
        0
    }

    fn each_id(&self, _visit: &mut dyn FnMut(&str, Id)) -> eyre::Result<()> {
        bail!("index payload corrupted")
    }

    fn each_set(&self, _visit: &mut dyn FnMut(&str, &[Id])) -> eyre::Result<()> {
        Ok(())
    }

    fn each_list(&self, _visit: &mut dyn FnMut(&str, &[Id])) -> eyre::Result<()> {
        Ok(())
    }
}

#[test]
fn storage_errors_fail_open() {
    let fetcher = MemoryStorage::new();
    let err = Database::open(Config::new(), &BrokenStorage, fetcher).unwrap_err();
    assert!(err.to_string().contains("id dictionary"));
}

//! Integration tests for `avdata_store`.

use avdata_store::{
    Access, AccessMode, Action, ArgumentList, AssetStore, Origin, ResourceEvent, StoreError, Value,
};
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

fn sample_store() -> AssetStore {
    let store = AssetStore::new();
    store.create("/plant/boiler/temp", AccessMode::Variable).unwrap();
    store.create("/plant/boiler/on", AccessMode::Variable).unwrap();
    store.create("/plant/name", AccessMode::Variable).unwrap();
    store.create("/plant/rate", AccessMode::Setting).unwrap();
    store.create("/plant/reset", AccessMode::Command).unwrap();
    store
}

// ─────────────────────────────────────────────────────────────────────
// Path invariants
// ─────────────────────────────────────────────────────────────────────

#[test]
fn no_path_is_a_prefix_of_another() {
    let store = sample_store();
    for candidate in ["/plant", "/plant/boiler", "/plant/boiler/temp/x", "/plant/name"] {
        assert!(store.create(candidate, AccessMode::Variable).is_err());
    }

    let paths = store.paths();
    for a in &paths {
        for b in &paths {
            assert!(!avdata_store::path::is_subpath(a, b), "{a} contains {b}");
        }
    }
}

#[test]
fn access_masks_follow_mode() {
    let store = sample_store();

    assert_eq!(store.server_access("/plant/name").unwrap(), Access::READ);
    assert_eq!(
        store.client_access("/plant/name").unwrap(),
        Access::READ | Access::WRITE
    );
    assert_eq!(
        store.server_access("/plant/rate").unwrap(),
        Access::READ | Access::WRITE
    );
    assert_eq!(store.client_access("/plant/rate").unwrap(), Access::READ);
    assert_eq!(store.server_access("/plant/reset").unwrap(), Access::EXECUTE);
    assert!(matches!(
        store.server_access("/plant"),
        Err(StoreError::NotFound(_))
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Multi-value round trip
// ─────────────────────────────────────────────────────────────────────

#[test]
fn subtree_round_trips_into_settings() {
    let source = sample_store();
    source.set_float("/plant/boiler/temp", 71.25).unwrap();
    source.set_bool("/plant/boiler/on", true).unwrap();
    source.set_string("/plant/name", "north").unwrap();
    source
        .set("/plant/rate", Value::Int(30), Origin::Server)
        .unwrap();

    let payload = source.read_subtree("/plant", 4096).unwrap();

    let target = AssetStore::new();
    for path in ["/plant/boiler/temp", "/plant/boiler/on", "/plant/name", "/plant/rate"] {
        target.create(path, AccessMode::Setting).unwrap();
    }
    let report = target
        .write_subtree("/plant", &payload, Origin::Server)
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.applied, 4);
    assert_eq!(target.get_float("/plant/boiler/temp").unwrap(), 71.25);
    assert!(target.get_bool("/plant/boiler/on").unwrap());
    assert_eq!(target.get_string("/plant/name").unwrap(), "north");
    assert_eq!(target.get_int("/plant/rate").unwrap(), 30);
}

#[test]
fn unset_values_travel_as_null_and_are_not_applied() {
    let source = sample_store();
    source.set_int("/plant/name", 1).unwrap();
    let payload = source.read_subtree("/plant/boiler", 4096).unwrap();

    let target = AssetStore::new();
    target.create("/plant/boiler/temp", AccessMode::Setting).unwrap();
    target.create("/plant/boiler/on", AccessMode::Setting).unwrap();
    let report = target
        .write_subtree("/plant/boiler", &payload, Origin::Server)
        .unwrap();

    assert_eq!(report.applied, 0);
    assert_eq!(report.failures.len(), 2);
}

#[test]
fn integer_beyond_i32_fails_its_entry_only() {
    let store = AssetStore::new();
    store.create("/d/a", AccessMode::Setting).unwrap();
    store.create("/d/b", AccessMode::Setting).unwrap();

    let mut payload = Vec::new();
    minicbor::Encoder::new(&mut payload)
        .map(2)
        .unwrap()
        .str("a")
        .unwrap()
        .u64(u64::MAX)
        .unwrap()
        .str("b")
        .unwrap()
        .u8(7)
        .unwrap();
    let report = store.write_subtree("/d", &payload, Origin::Server).unwrap();

    assert_eq!(report.applied, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "/d/a");
    assert_eq!(store.get_int("/d/b").unwrap(), 7);
    assert_eq!(store.get("/d/a", Origin::Client).unwrap(), Value::None);
}

#[test]
fn subtree_larger_than_capacity_fails() {
    let store = sample_store();
    store.set_string("/plant/name", &"n".repeat(200)).unwrap();
    assert!(matches!(
        store.read_subtree("/plant", 64),
        Err(StoreError::Codec(avdata_store::CodecError::BufferFull))
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Handlers and re-entrancy
// ─────────────────────────────────────────────────────────────────────

#[test]
fn read_handler_refreshes_value_before_encoding() {
    let store = sample_store();
    let reads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reads);
    store
        .add_handler("/plant/boiler/temp", move |event: &ResourceEvent<'_>| {
            if event.action == Action::Read {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                event
                    .store
                    .set(event.path, Value::Float(n as f64), Origin::Client)
                    .unwrap();
            }
        })
        .unwrap();

    assert_eq!(
        store.get("/plant/boiler/temp", Origin::Server).unwrap(),
        Value::Float(1.0)
    );
    store.read_subtree("/plant", 4096).unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 2);
    assert_eq!(store.get_float("/plant/boiler/temp").unwrap(), 2.0);
}

#[test]
fn write_handler_may_update_sibling() {
    let store = sample_store();
    store
        .add_handler("/plant/rate", |event: &ResourceEvent<'_>| {
            let rate = event.store.get_int(event.path).unwrap_or_default();
            event.store.set_int("/plant/name", rate * 2).unwrap();
        })
        .unwrap();

    store
        .set("/plant/rate", Value::Int(21), Origin::Server)
        .unwrap();
    assert_eq!(store.get_int("/plant/name").unwrap(), 42);
}

#[test]
fn command_handler_can_remove_itself() {
    let store = sample_store();
    let token = Arc::new(Mutex::new(None));
    let runs = Arc::new(AtomicUsize::new(0));

    let own_token = Arc::clone(&token);
    let counter = Arc::clone(&runs);
    let registered = store
        .add_handler("/plant/reset", move |event: &ResourceEvent<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = own_token.lock().take() {
                event.store.remove_handler(token);
            }
        })
        .unwrap();
    *token.lock() = Some(registered);

    let args = ArgumentList::new();
    store.execute("/plant/reset", &args).unwrap();
    assert_eq!(
        store.execute("/plant/reset", &args),
        Err(StoreError::NoHandler("/plant/reset".into()))
    );
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────

#[test]
fn concurrent_writers_on_distinct_paths() {
    let store = Arc::new(AssetStore::new());
    for i in 0..4 {
        store
            .create(&format!("/worker/{i}"), AccessMode::Variable)
            .unwrap();
    }

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let path = format!("/worker/{i}");
                for n in 0..100 {
                    store.set_int(&path, n).unwrap();
                    assert!(store.get_int(&path).unwrap() <= n);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
    for i in 0..4 {
        assert_eq!(store.get_int(&format!("/worker/{i}")).unwrap(), 99);
    }
}

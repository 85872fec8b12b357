// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for the per-identity selection store.

mod common;

use common::{builtin_catalog, home_policy, memory_store, signed_in_store};
use coverage_engine::db::{self, StorageDb};
use coverage_engine::error::CoverageError;
use coverage_engine::models::{CategoryId, PersistedSelection, Selection, SCHEMA_VERSION};
use coverage_engine::services::{CoverageStatus, IdentityEvent, SelectionStore, StoreStatus};
use serde_json::json;

async fn sign_in(store: &SelectionStore, user_id: &str) {
    store
        .handle_event(IdentityEvent::SignedIn(user_id.to_string()))
        .await
        .unwrap();
}

fn populate(store: &SelectionStore) {
    let catalog = builtin_catalog();
    store.toggle_card("chase-sapphire-reserve").unwrap();
    store.toggle_card("amex-platinum").unwrap();
    store.add_plan("aaa-plus").unwrap();
    store.add_policy(home_policy(&catalog, "home-1")).unwrap();
}

#[tokio::test]
async fn test_round_trip_same_identity() {
    let storage = StorageDb::new_memory();
    let store = signed_in_store(storage.clone(), "alice").await;
    populate(&store);
    store.flush().await.unwrap();
    let before = store.snapshot();

    let reopened = signed_in_store(storage, "alice").await;
    assert_eq!(reopened.snapshot(), before);
    assert_eq!(reopened.counts().cards, 2);
    assert_eq!(reopened.counts().plans, 1);
    assert_eq!(reopened.counts().policies, 1);
}

fn previous_version_key(user_id: &str) -> String {
    format!("coverage-selection:v{}:{}", SCHEMA_VERSION - 1, user_id)
}

fn previous_version_record(user_id: &str) -> String {
    json!({
        "state": {
            "userId": user_id,
            "selectedCards": ["chase-sapphire-reserve"],
            "uploadedPolicies": [],
            "addedPlans": [],
            "lastUpdated": "2025-06-01T00:00:00Z"
        },
        "version": SCHEMA_VERSION - 1
    })
    .to_string()
}

#[tokio::test]
async fn test_previous_version_record_is_discarded_and_removed() {
    let storage = StorageDb::new_memory();
    let old_key = previous_version_key("alice");
    storage
        .set(&old_key, &previous_version_record("alice"))
        .await
        .unwrap();
    // Another user's old record is not touched by alice's load
    storage
        .set(&previous_version_key("bob"), &previous_version_record("bob"))
        .await
        .unwrap();

    let store = signed_in_store(storage.clone(), "alice").await;
    assert!(store.snapshot().is_empty());
    assert_eq!(storage.get(&old_key).await.unwrap(), None);
    assert!(storage
        .get(&previous_version_key("bob"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_stale_version_body_under_current_key_is_removed() {
    let storage = StorageDb::new_memory();
    let key = db::selection_key("alice");
    storage
        .set(&key, &previous_version_record("alice"))
        .await
        .unwrap();

    let store = signed_in_store(storage.clone(), "alice").await;
    assert!(store.snapshot().is_empty());
    assert_eq!(storage.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_unparseable_record_is_discarded() {
    let storage = StorageDb::new_memory();
    let key = db::selection_key("alice");
    let broken = json!({
        "state": { "userId": "alice", "selectedCards": "not-a-list", "lastUpdated": "x" },
        "version": SCHEMA_VERSION
    });
    storage.set(&key, &broken.to_string()).await.unwrap();

    let store = signed_in_store(storage.clone(), "alice").await;
    assert!(store.snapshot().is_empty());
    assert_eq!(storage.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_switch_and_back_restores_selection() {
    let store = memory_store();
    sign_in(&store, "alice").await;
    populate(&store);
    let alice = store.snapshot();

    sign_in(&store, "bob").await;
    assert_eq!(store.current_user().as_deref(), Some("bob"));
    assert!(store.snapshot().is_empty());

    sign_in(&store, "alice").await;
    assert_eq!(store.snapshot(), alice);
}

#[tokio::test]
async fn test_pending_writes_are_flushed_before_switch() {
    let storage = StorageDb::new_memory();
    let store = signed_in_store(storage.clone(), "alice").await;
    for id in ["chase-sapphire-reserve", "amex-platinum", "citi-double-cash"] {
        store.toggle_card(id).unwrap();
    }

    // No explicit flush: the switch itself must persist alice first
    store
        .handle_event(IdentityEvent::IdentifierChanged {
            old: "alice".to_string(),
            new: "bob".to_string(),
        })
        .await
        .unwrap();

    let raw = storage
        .get(&db::selection_key("alice"))
        .await
        .unwrap()
        .unwrap();
    let record: PersistedSelection = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.state.selection.selected_cards.len(), 3);
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let storage = StorageDb::new_memory();
    let alice = signed_in_store(storage.clone(), "alice").await;
    alice.toggle_card("amex-platinum").unwrap();
    alice.flush().await.unwrap();

    let bob = signed_in_store(storage.clone(), "bob").await;
    assert!(bob.snapshot().is_empty());
    bob.toggle_card("citi-double-cash").unwrap();
    bob.flush().await.unwrap();

    let alice_again = signed_in_store(storage, "alice").await;
    assert_eq!(
        alice_again.snapshot().selected_cards,
        vec!["amex-platinum".to_string()]
    );
}

#[tokio::test]
async fn test_record_under_wrong_namespace_is_purged() {
    let storage = StorageDb::new_memory();
    let mut selection = Selection::default();
    selection.toggle_card("amex-platinum");
    let foreign = PersistedSelection::new("mallory", selection, "2026-01-01T00:00:00Z");
    let key = db::selection_key("alice");
    storage
        .set(&key, &serde_json::to_string(&foreign).unwrap())
        .await
        .unwrap();

    let store = signed_in_store(storage.clone(), "alice").await;
    assert!(store.snapshot().is_empty());
    assert_eq!(storage.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_sign_out_keeps_record() {
    let storage = StorageDb::new_memory();
    let store = signed_in_store(storage.clone(), "alice").await;
    store.toggle_card("amex-platinum").unwrap();

    store
        .handle_event(IdentityEvent::SignedOut {
            delete_account: false,
        })
        .await
        .unwrap();
    assert_eq!(store.status(), StoreStatus::Uninitialized);
    assert!(store.snapshot().is_empty());
    assert!(matches!(
        store.toggle_card("amex-platinum"),
        Err(CoverageError::NotReady)
    ));

    sign_in(&store, "alice").await;
    assert_eq!(store.snapshot().selected_cards, vec!["amex-platinum"]);
}

#[tokio::test]
async fn test_account_deletion_removes_record() {
    let storage = StorageDb::new_memory();
    let store = signed_in_store(storage.clone(), "alice").await;
    populate(&store);

    store
        .handle_event(IdentityEvent::SignedOut {
            delete_account: true,
        })
        .await
        .unwrap();
    assert_eq!(storage.get(&db::selection_key("alice")).await.unwrap(), None);

    sign_in(&store, "alice").await;
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_account_deletion_removes_previous_version_records() {
    let storage = StorageDb::new_memory();
    let store = signed_in_store(storage.clone(), "alice").await;
    populate(&store);
    store.flush().await.unwrap();

    // Written by an older release after this session loaded
    let old_key = previous_version_key("alice");
    storage
        .set(&old_key, &previous_version_record("alice"))
        .await
        .unwrap();

    store
        .handle_event(IdentityEvent::SignedOut {
            delete_account: true,
        })
        .await
        .unwrap();
    assert_eq!(storage.get(&db::selection_key("alice")).await.unwrap(), None);
    assert_eq!(storage.get(&old_key).await.unwrap(), None);
    assert!(storage.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_engine_from_store_reflects_mutations() {
    let catalog = builtin_catalog();
    let store = memory_store();
    sign_in(&store, "alice").await;

    store.toggle_card("chase-sapphire-reserve").unwrap();
    assert_eq!(
        store
            .engine(&catalog)
            .coverage_status(CategoryId::PurchaseProtection),
        CoverageStatus::Partial
    );

    store.add_plan("best-buy-protection").unwrap();
    assert_eq!(
        store
            .engine(&catalog)
            .coverage_status(CategoryId::PurchaseProtection),
        CoverageStatus::Covered
    );

    store.remove_plan("best-buy-protection").unwrap();
    assert_eq!(
        store
            .engine(&catalog)
            .coverage_status(CategoryId::PurchaseProtection),
        CoverageStatus::Partial
    );

    store.clear_selection().unwrap();
    assert_eq!(store.engine(&catalog).coverage_gaps(), CategoryId::ALL.to_vec());
}

#[tokio::test]
async fn test_add_policy_replaces_same_id() {
    let catalog = builtin_catalog();
    let store = memory_store();
    sign_in(&store, "alice").await;

    store.add_policy(home_policy(&catalog, "home-1")).unwrap();
    store.add_policy(home_policy(&catalog, "home-1")).unwrap();
    assert_eq!(store.counts().policies, 1);

    assert!(store.remove_policy("home-1").unwrap());
    assert!(!store.remove_policy("home-1").unwrap());
    assert_eq!(store.counts().policies, 0);
}

#[tokio::test]
async fn test_startup_sweep_removes_stale_and_legacy_records() {
    let storage = StorageDb::new_memory();

    let alice = signed_in_store(storage.clone(), "alice").await;
    alice.toggle_card("amex-platinum").unwrap();
    alice.flush().await.unwrap();

    let old_key = format!("coverage-selection:v{}:alice", SCHEMA_VERSION - 1);
    storage.set(&old_key, "{}").await.unwrap();
    storage.set("coverage-storage", "{}").await.unwrap();
    storage.set("user-coverage-storage", "{}").await.unwrap();
    storage
        .set(&db::selection_key("broken"), "not json")
        .await
        .unwrap();
    storage.set("unrelated-app-key", "keep me").await.unwrap();

    let store = SelectionStore::new(storage.clone());
    let report = store.startup_sweep().await.unwrap();

    assert_eq!(report.removed.len(), 4);
    let remaining = storage.keys().await.unwrap();
    assert_eq!(
        remaining,
        vec![
            db::selection_key("alice"),
            "unrelated-app-key".to_string()
        ]
    );
}

#[tokio::test]
async fn test_directory_backend_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageDb::open_dir(dir.path()).await.unwrap();
    let store = signed_in_store(storage, "user|with:odd/chars").await;
    populate(&store);
    store.flush().await.unwrap();
    let before = store.snapshot();
    drop(store);

    let storage = StorageDb::open_dir(dir.path()).await.unwrap();
    let reopened = signed_in_store(storage, "user|with:odd/chars").await;
    assert_eq!(reopened.snapshot(), before);
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use coverage_engine::db::StorageDb;
use coverage_engine::models::{ExtractedPolicy, PolicyKind, PolicySource};
use coverage_engine::services::{Catalog, IdentityEvent, SelectionStore, TemplateLibrary};
use serde_json::json;

/// Built-in catalog.
#[allow(dead_code)]
pub fn builtin_catalog() -> Catalog {
    Catalog::builtin().expect("built-in catalog should load")
}

/// Catalog with two cards and nothing else:
/// `card-a` rental primary $50,000, `card-b` rental secondary $75,000.
/// Both also carry the `chase_premium` purchase protection template.
#[allow(dead_code)]
pub fn two_card_catalog() -> Catalog {
    let cards = json!([
        {
            "id": "card-a",
            "name": "Card A",
            "issuer": "Bank A",
            "network": "visa",
            "annualFee": 95,
            "rental": { "coverageType": "primary", "maxCoverage": 50000 },
            "purchaseProtection": "chase_premium"
        },
        {
            "id": "card-b",
            "name": "Card B",
            "issuer": "Bank B",
            "network": "mastercard",
            "annualFee": 0,
            "rental": { "coverageType": "secondary", "maxCoverage": 75000 }
        }
    ]);
    let templates = TemplateLibrary::builtin().expect("templates should load");
    Catalog::from_json(
        &templates,
        &cards.to_string(),
        "[]",
        include_str!("../../data/policy_types.json"),
    )
    .expect("fixture catalog should load")
}

/// A store over fresh in-memory storage.
#[allow(dead_code)]
pub fn memory_store() -> SelectionStore {
    SelectionStore::new(StorageDb::new_memory())
}

/// A store signed in as `user_id`.
#[allow(dead_code)]
pub async fn signed_in_store(storage: StorageDb, user_id: &str) -> SelectionStore {
    let store = SelectionStore::new(storage);
    store
        .handle_event(IdentityEvent::SignedIn(user_id.to_string()))
        .await
        .expect("sign in should succeed");
    store
}

/// A complete homeowners extraction.
#[allow(dead_code)]
pub fn home_extraction() -> ExtractedPolicy {
    let fields = json!({
        "carrier": "Acme Mutual",
        "policyNumber": "HO-123456",
        "effectiveDate": "2026-01-01",
        "expirationDate": "2027-01-01",
        "dwellingCoverage": "$450,000",
        "personalPropertyCoverage": 120000
    });
    ExtractedPolicy {
        policy_type: Some(PolicyKind::Home),
        document_id: Some("doc-1".to_string()),
        fields: serde_json::from_value(fields).expect("fixture fields"),
    }
}

/// An accepted homeowners policy with id `policy_id`.
#[allow(dead_code)]
pub fn home_policy(catalog: &Catalog, policy_id: &str) -> PolicySource {
    catalog
        .policy_type(PolicyKind::Home)
        .expect("home policy type")
        .accept(&home_extraction(), policy_id, "2026-02-01T00:00:00Z")
        .expect("home extraction should be accepted")
}

#[allow(dead_code)]
pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

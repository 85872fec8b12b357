// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Validation and acceptance of extracted policies.

mod common;

use common::{builtin_catalog, home_extraction};
use coverage_engine::error::CoverageError;
use coverage_engine::models::benefit::limits;
use coverage_engine::models::{CategoryId, PolicyKind, PolicyOrigin};
use coverage_engine::services::{Catalog, TemplateLibrary};

#[test]
fn test_complete_extraction_is_accepted() {
    let catalog = builtin_catalog();
    let def = catalog.policy_type(PolicyKind::Home).unwrap();
    let policy = def
        .accept(&home_extraction(), "home-1", "2026-02-01T00:00:00Z")
        .unwrap();

    assert_eq!(policy.base.id(), "home-1");
    assert_eq!(policy.policy_kind, PolicyKind::Home);
    assert_eq!(policy.carrier.as_deref(), Some("Acme Mutual"));
    assert_eq!(policy.policy_number.as_deref(), Some("HO-123456"));
    assert_eq!(policy.origin, PolicyOrigin::Document);
    assert_eq!(policy.base.provider(), "Acme Mutual");

    let home = policy.base.benefit(CategoryId::HomeInsurance).unwrap();
    assert_eq!(home.limit_amount(limits::DWELLING_COVERAGE), Some(450_000.0));
    assert_eq!(
        home.limit_amount(limits::PERSONAL_PROPERTY_COVERAGE),
        Some(120_000.0)
    );
    // Defaults for the other declared category are kept
    assert!(policy.base.covers(CategoryId::PurchaseProtection));
}

#[test]
fn test_missing_required_fields_are_listed() {
    let catalog = builtin_catalog();
    let def = catalog.policy_type(PolicyKind::Home).unwrap();
    let mut extracted = home_extraction();
    extracted.fields.remove("policyNumber");
    extracted
        .fields
        .insert("dwellingCoverage".to_string(), serde_json::Value::Null);

    let validation = def.validate(&extracted);
    assert!(!validation.valid);

    match def.accept(&extracted, "home-1", "now") {
        Err(CoverageError::InvalidPolicy {
            policy_type,
            missing_fields,
        }) => {
            assert_eq!(policy_type, "home");
            assert!(missing_fields.contains(&"policyNumber".to_string()));
            assert!(missing_fields.contains(&"dwellingCoverage".to_string()));
        }
        other => panic!("expected InvalidPolicy, got {:?}", other),
    }
}

#[test]
fn test_wrong_policy_type_is_rejected() {
    let catalog = builtin_catalog();
    let auto = catalog.policy_type(PolicyKind::Auto).unwrap();
    let err = auto
        .accept(&home_extraction(), "p", "now")
        .unwrap_err();
    assert!(matches!(err, CoverageError::InvalidPolicy { .. }));
}

#[test]
fn test_manual_entry_has_manual_origin() {
    let catalog = builtin_catalog();
    let def = catalog.policy_type(PolicyKind::Home).unwrap();
    let mut extracted = home_extraction();
    extracted.document_id = None;
    let policy = def.accept(&extracted, "home-2", "now").unwrap();
    assert_eq!(policy.origin, PolicyOrigin::Manual);
    assert!(policy.document_id.is_none());
}

#[test]
fn test_catalog_accepts_by_named_type() {
    let catalog = builtin_catalog();
    let policy = catalog
        .accept_policy(&home_extraction(), "home-2", "2026-02-01T00:00:00Z")
        .unwrap();
    assert_eq!(policy.policy_kind, PolicyKind::Home);
    assert_eq!(policy.base.id(), "home-2");
}

#[test]
fn test_catalog_rejects_extraction_without_type() {
    let catalog = builtin_catalog();
    let mut extracted = home_extraction();
    extracted.policy_type = None;
    let err = catalog
        .accept_policy(&extracted, "home-3", "2026-02-01T00:00:00Z")
        .unwrap_err();
    assert!(matches!(err, CoverageError::UnknownPolicyType(_)));
}

#[test]
fn test_catalog_rejects_type_it_does_not_define() {
    let catalog = Catalog::from_json(&TemplateLibrary::default(), "[]", "[]", "[]").unwrap();
    let err = catalog
        .accept_policy(&home_extraction(), "home-4", "2026-02-01T00:00:00Z")
        .unwrap_err();
    match err {
        CoverageError::UnknownPolicyType(kind) => assert_eq!(kind, "home"),
        other => panic!("unexpected error: {other}"),
    }
}

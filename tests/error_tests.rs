// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use coverage_engine::error::{CatalogError, CoverageError};
use coverage_engine::services::{Catalog, TemplateLibrary};

#[test]
fn test_catalog_error_converts_into_coverage_error() {
    let err = Catalog::from_json(&TemplateLibrary::default(), "not json", "[]", "[]").unwrap_err();
    let err: CoverageError = err.into();
    assert!(matches!(
        err,
        CoverageError::Catalog(CatalogError::Parse { .. })
    ));
    assert!(err.to_string().starts_with("Catalog error:"));
}

#[test]
fn test_undeclared_policy_category_is_invariant_error() {
    let policy_types = r#"[{
        "kind": "umbrella",
        "name": "Umbrella",
        "categories": ["umbrella-liability"],
        "defaultBenefits": { "home-insurance": { "coverageLevel": "full" } }
    }]"#;
    let err =
        Catalog::from_json(&TemplateLibrary::default(), "[]", "[]", policy_types).unwrap_err();
    assert!(matches!(err, CatalogError::Invariant(_)));
}

#[test]
fn test_identity_mismatch_message_names_both_users() {
    let err = CoverageError::IdentityMismatch {
        expected: "alice".to_string(),
        actual: "bob".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("alice"));
    assert!(message.contains("bob"));
}

#[test]
fn test_serde_error_converts() {
    let parse: Result<u32, _> = serde_json::from_str("\"x\"");
    let err: CoverageError = parse.unwrap_err().into();
    assert!(matches!(err, CoverageError::Serialization(_)));
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Insurance policies uploaded by the user, and the policy-type
//! definitions that describe how to accept them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{BenefitDetails, CategoryId, SourceBase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Auto,
    Home,
    Renters,
    Umbrella,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Auto => "auto",
            PolicyKind::Home => "home",
            PolicyKind::Renters => "renters",
            PolicyKind::Umbrella => "umbrella",
        }
    }
}

/// Where a policy's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyOrigin {
    /// Extracted from an uploaded document
    Document,
    /// Typed in by the user
    Manual,
}

/// An accepted insurance policy, as held in the user's selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySource {
    #[serde(flatten)]
    pub base: SourceBase,
    pub policy_kind: PolicyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    /// When the policy was added (ISO 8601)
    pub uploaded_at: String,
    /// Originating uploaded document, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub origin: PolicyOrigin,
}

/// Field names the extraction service must (or may) supply for a policy type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionSchema {
    pub required_fields: Vec<String>,
    pub optional_fields: Vec<String>,
}

/// Maps an extracted field onto a limit in one of the policy's categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub category: CategoryId,
    pub limit: String,
}

/// A policy type: its categories, default benefits and extraction schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTypeDefinition {
    pub kind: PolicyKind,
    pub name: String,
    pub description: String,
    pub categories: Vec<CategoryId>,
    pub default_benefits: BTreeMap<CategoryId, BenefitDetails>,
    pub extraction_schema: ExtractionSchema,
    pub field_mappings: BTreeMap<String, FieldMapping>,
}

/// Structured output of the benefit extraction service for one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPolicy {
    pub policy_type: Option<PolicyKind>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl ExtractedPolicy {
    /// A field counts as present when it is non-null and, for strings, non-blank.
    pub fn has_field(&self, name: &str) -> bool {
        match self.fields.get(name) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Outcome of checking an extraction against a policy type's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub missing_fields: Vec<String>,
}

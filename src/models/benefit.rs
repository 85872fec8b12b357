// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-category benefit details shared by every coverage source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::CategoryId;

/// Well-known keys in a [`Limits`] bag.
pub mod limits {
    pub const MAX_COVERAGE: &str = "maxCoverage";
    pub const MAX_PER_CLAIM: &str = "maxPerClaim";
    pub const MAX_PER_YEAR: &str = "maxPerYear";
    pub const MAX_CLAIMS_PER_YEAR: &str = "maxClaimsPerYear";
    pub const DEDUCTIBLE: &str = "deductible";
    pub const COVERAGE_PERIOD_DAYS: &str = "coveragePeriodDays";
    pub const CANCELLATION_COVERAGE: &str = "cancellationCoverage";
    pub const INTERRUPTION_COVERAGE: &str = "interruptionCoverage";
    pub const DELAY_COVERAGE: &str = "delayCoverage";
    pub const DELAY_THRESHOLD_HOURS: &str = "delayThresholdHours";
    pub const LOST_BAGGAGE_COVERAGE: &str = "lostBaggageCoverage";
    pub const DELAYED_BAGGAGE_COVERAGE: &str = "delayedBaggageCoverage";
    pub const MAX_DAYS: &str = "maxDays";
    pub const ADDITIONAL_YEARS: &str = "additionalYears";
    pub const MAX_ORIGINAL_WARRANTY_YEARS: &str = "maxOriginalWarrantyYears";
    pub const MAX_PER_ITEM: &str = "maxPerItem";
    pub const RETURN_WINDOW_DAYS: &str = "returnWindowDays";
    pub const MAX_PER_EVENT: &str = "maxPerEvent";
    pub const TRAVEL_CREDIT: &str = "travelCredit";
    pub const LIABILITY_LIMIT: &str = "liabilityLimit";
    pub const DWELLING_COVERAGE: &str = "dwellingCoverage";
    pub const PERSONAL_PROPERTY_COVERAGE: &str = "personalPropertyCoverage";
}

/// How completely a source covers a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CoverageLevel {
    Full,
    Partial,
    #[default]
    Limited,
    None,
}

/// A single limit value: numeric amounts or free text like "Unlimited".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub enum LimitValue {
    Number(f64),
    Text(String),
}

impl LimitValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LimitValue::Number(n) => Some(*n),
            LimitValue::Text(_) => None,
        }
    }
}

impl From<f64> for LimitValue {
    fn from(value: f64) -> Self {
        LimitValue::Number(value)
    }
}

impl From<u32> for LimitValue {
    fn from(value: u32) -> Self {
        LimitValue::Number(f64::from(value))
    }
}

impl From<&str> for LimitValue {
    fn from(value: &str) -> Self {
        LimitValue::Text(value.to_string())
    }
}

/// Open-ended, ordered bag of named limits.
pub type Limits = BTreeMap<String, LimitValue>;

/// Fully resolved benefit information for one category of one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BenefitDetails {
    pub category_id: CategoryId,
    pub coverage_level: CoverageLevel,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub covered: Vec<String>,
    #[serde(default)]
    pub not_covered: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BenefitDetails {
    pub fn new(category_id: CategoryId, coverage_level: CoverageLevel) -> Self {
        Self {
            category_id,
            coverage_level,
            limits: Limits::new(),
            covered: Vec::new(),
            not_covered: Vec::new(),
            conditions: None,
            claim_process: None,
            notes: None,
        }
    }

    /// Insert a numeric limit if present.
    pub fn with_amount(mut self, name: &str, value: Option<f64>) -> Self {
        if let Some(v) = value {
            self.limits.insert(name.to_string(), LimitValue::Number(v));
        }
        self
    }

    pub fn with_covered(mut self, items: Vec<String>) -> Self {
        self.covered = items;
        self
    }

    pub fn with_not_covered(mut self, items: Vec<String>) -> Self {
        self.not_covered = items;
        self
    }

    /// Numeric value of a named limit, `None` if absent or textual.
    pub fn limit_amount(&self, name: &str) -> Option<f64> {
        self.limits.get(name).and_then(LimitValue::as_number)
    }

    /// Numeric value of this category's headline limit.
    pub fn key_limit(&self) -> Option<f64> {
        self.category_id
            .key_limit_field()
            .and_then(|field| self.limit_amount(field))
    }
}

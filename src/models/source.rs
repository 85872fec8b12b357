// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The coverage source union and the fields every variant shares.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{BenefitDetails, CategoryId, CreditCardSource, PolicySource, ProtectionPlanSource};

/// Identity and benefit map shared by cards, plans and policies.
///
/// `categories` is always derived from the keys of `benefits`; the only
/// ways to build a value (constructor and deserialization) recompute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SourceBaseRecord")]
pub struct SourceBase {
    id: String,
    name: String,
    full_name: String,
    provider: String,
    categories: BTreeSet<CategoryId>,
    benefits: BTreeMap<CategoryId, BenefitDetails>,
}

/// Wire shape of [`SourceBase`]; any serialized `categories` is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceBaseRecord {
    id: String,
    name: String,
    #[serde(default)]
    full_name: Option<String>,
    provider: String,
    #[serde(default)]
    benefits: BTreeMap<CategoryId, BenefitDetails>,
}

impl From<SourceBaseRecord> for SourceBase {
    fn from(record: SourceBaseRecord) -> Self {
        let full_name = record.full_name.unwrap_or_else(|| record.name.clone());
        SourceBase::new(record.id, record.name, full_name, record.provider, record.benefits)
    }
}

impl SourceBase {
    pub fn new(
        id: String,
        name: String,
        full_name: String,
        provider: String,
        mut benefits: BTreeMap<CategoryId, BenefitDetails>,
    ) -> Self {
        // Keep each entry's own category tag consistent with its key.
        for (category, details) in benefits.iter_mut() {
            details.category_id = *category;
        }
        let categories = benefits.keys().copied().collect();
        Self {
            id,
            name,
            full_name,
            provider,
            categories,
            benefits,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn categories(&self) -> &BTreeSet<CategoryId> {
        &self.categories
    }

    pub fn benefits(&self) -> &BTreeMap<CategoryId, BenefitDetails> {
        &self.benefits
    }

    pub fn benefit(&self, category: CategoryId) -> Option<&BenefitDetails> {
        self.benefits.get(&category)
    }

    pub fn covers(&self, category: CategoryId) -> bool {
        self.categories.contains(&category)
    }
}

/// Discriminant of [`CoverageSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SourceKind {
    CreditCard,
    ProtectionPlan,
    Policy,
}

/// A borrowed view of any coverage source.
///
/// The hydrated catalog owns cards and plans; the user's selection owns
/// policies. Query results hand out this closed union so callers switch on
/// the variant instead of going through a trait object.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "sourceType", rename_all = "kebab-case")]
pub enum CoverageSource<'a> {
    CreditCard(&'a CreditCardSource),
    ProtectionPlan(&'a ProtectionPlanSource),
    Policy(&'a PolicySource),
}

impl<'a> CoverageSource<'a> {
    pub fn kind(&self) -> SourceKind {
        match self {
            CoverageSource::CreditCard(_) => SourceKind::CreditCard,
            CoverageSource::ProtectionPlan(_) => SourceKind::ProtectionPlan,
            CoverageSource::Policy(_) => SourceKind::Policy,
        }
    }

    pub fn base(&self) -> &'a SourceBase {
        match self {
            CoverageSource::CreditCard(card) => &card.base,
            CoverageSource::ProtectionPlan(plan) => &plan.base,
            CoverageSource::Policy(policy) => &policy.base,
        }
    }

    pub fn id(&self) -> &'a str {
        self.base().id()
    }

    pub fn benefit(&self, category: CategoryId) -> Option<&'a BenefitDetails> {
        self.base().benefit(category)
    }
}

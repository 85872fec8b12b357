// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The hydrated catalog of every known card, plan and policy type.
//!
//! Built once at process start and shared read-only afterwards.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{self, CatalogError, CoverageError};
use crate::models::{
    CoverageSource, CreditCardSource, ExtractedPolicy, PolicyKind, PolicySource,
    PolicyTypeDefinition, ProtectionPlanSource,
};
use crate::services::hydration::{
    hydrate_card, hydrate_plan, hydrate_policy_type, RawCardRecord, RawPlanRecord, RawPolicyType,
};
use crate::services::templates::TemplateLibrary;

const BUILTIN_CARDS: &str = include_str!("../../data/credit_cards.json");
const BUILTIN_PLANS: &str = include_str!("../../data/protection_plans.json");
const BUILTIN_POLICY_TYPES: &str = include_str!("../../data/policy_types.json");

/// File names expected by [`Catalog::load_from_dir`].
pub mod files {
    pub const TEMPLATES: &str = "benefit_templates.json";
    pub const CARDS: &str = "credit_cards.json";
    pub const PLANS: &str = "protection_plans.json";
    pub const POLICY_TYPES: &str = "policy_types.json";
}

/// Hydrated, immutable catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: TemplateLibrary,
    cards: Vec<CreditCardSource>,
    plans: Vec<ProtectionPlanSource>,
    policy_types: Vec<PolicyTypeDefinition>,
    card_index: HashMap<String, usize>,
    plan_index: HashMap<String, usize>,
}

impl Catalog {
    /// Catalog from the data files compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(
            &TemplateLibrary::builtin()?,
            BUILTIN_CARDS,
            BUILTIN_PLANS,
            BUILTIN_POLICY_TYPES,
        )
    }

    /// Catalog from a directory holding the four data files.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|e| CatalogError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        };

        let templates = TemplateLibrary::load_from_file(dir.join(files::TEMPLATES))?;
        Self::from_json(
            &templates,
            &read(files::CARDS)?,
            &read(files::PLANS)?,
            &read(files::POLICY_TYPES)?,
        )
    }

    /// Hydrate every raw record. Batch and total: any parse error or
    /// duplicate id fails the whole load.
    pub fn from_json(
        templates: &TemplateLibrary,
        cards_json: &str,
        plans_json: &str,
        policy_types_json: &str,
    ) -> Result<Self, CatalogError> {
        let raw_cards: Vec<RawCardRecord> = parse(files::CARDS, cards_json)?;
        let raw_plans: Vec<RawPlanRecord> = parse(files::PLANS, plans_json)?;
        let raw_policy_types: Vec<RawPolicyType> = parse(files::POLICY_TYPES, policy_types_json)?;

        let cards: Vec<CreditCardSource> = raw_cards
            .iter()
            .map(|raw| hydrate_card(raw, templates))
            .collect();
        let plans: Vec<ProtectionPlanSource> = raw_plans.iter().map(hydrate_plan).collect();
        let policy_types = raw_policy_types
            .iter()
            .map(hydrate_policy_type)
            .collect::<Result<Vec<_>, _>>()?;

        let card_index = build_index("card", cards.iter().map(|c| c.base.id()))?;
        let plan_index = build_index("plan", plans.iter().map(|p| p.base.id()))?;
        for (i, def) in policy_types.iter().enumerate() {
            if policy_types[..i].iter().any(|other| other.kind == def.kind) {
                return Err(CatalogError::Invariant(format!(
                    "duplicate policy type: {}",
                    def.kind.as_str()
                )));
            }
        }

        tracing::info!(
            cards = cards.len(),
            plans = plans.len(),
            policy_types = policy_types.len(),
            "Catalog hydrated"
        );

        Ok(Self {
            templates: templates.clone(),
            cards,
            plans,
            policy_types,
            card_index,
            plan_index,
        })
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    pub fn cards(&self) -> &[CreditCardSource] {
        &self.cards
    }

    pub fn plans(&self) -> &[ProtectionPlanSource] {
        &self.plans
    }

    pub fn policy_types(&self) -> &[PolicyTypeDefinition] {
        &self.policy_types
    }

    pub fn card(&self, id: &str) -> Option<&CreditCardSource> {
        self.card_index.get(id).map(|&i| &self.cards[i])
    }

    pub fn plan(&self, id: &str) -> Option<&ProtectionPlanSource> {
        self.plan_index.get(id).map(|&i| &self.plans[i])
    }

    pub fn policy_type(&self, kind: PolicyKind) -> Option<&PolicyTypeDefinition> {
        self.policy_types.iter().find(|def| def.kind == kind)
    }

    /// Accept an extraction against the policy type it names.
    ///
    /// An extraction without a type, or naming a type this catalog does not
    /// define, is rejected before any field validation.
    pub fn accept_policy(
        &self,
        extracted: &ExtractedPolicy,
        policy_id: &str,
        now: &str,
    ) -> error::Result<PolicySource> {
        let kind = extracted
            .policy_type
            .ok_or_else(|| CoverageError::UnknownPolicyType("unspecified".to_string()))?;
        let def = self
            .policy_type(kind)
            .ok_or_else(|| CoverageError::UnknownPolicyType(kind.as_str().to_string()))?;
        def.accept(extracted, policy_id, now)
    }

    /// Cards from one issuer, case-insensitive.
    pub fn cards_by_issuer(&self, issuer: &str) -> Vec<&CreditCardSource> {
        self.cards
            .iter()
            .filter(|c| c.base.provider().eq_ignore_ascii_case(issuer))
            .collect()
    }

    /// Every card and plan, cards first, in data-file order.
    pub fn sources(&self) -> Vec<CoverageSource<'_>> {
        self.cards
            .iter()
            .map(CoverageSource::CreditCard)
            .chain(self.plans.iter().map(CoverageSource::ProtectionPlan))
            .collect()
    }
}

fn parse<T: DeserializeOwned>(file: &'static str, json: &str) -> Result<T, CatalogError> {
    serde_json::from_str(json).map_err(|source| CatalogError::Parse { file, source })
}

fn build_index<'a>(
    what: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, CatalogError> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id.to_string(), i).is_some() {
            return Err(CatalogError::Invariant(format!("duplicate {} id: {}", what, id)));
        }
    }
    Ok(index)
}

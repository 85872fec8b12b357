// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flat projection of a selection for the natural-language assistant.
//!
//! Pure read-side transform: fields are renamed and flattened, no ranking
//! or filtering happens here.

use serde::Serialize;

use crate::models::{
    BenefitDetails, CategoryId, CoverageLevel, CoverageSource, Limits, SourceKind,
};
use crate::services::CoverageEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantBenefit {
    pub category: CategoryId,
    pub category_label: &'static str,
    pub coverage_level: CoverageLevel,
    pub limits: Limits,
    pub covered: Vec<String>,
    pub not_covered: Vec<String>,
    pub conditions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AssistantBenefit {
    fn from_details(details: &BenefitDetails) -> Self {
        Self {
            category: details.category_id,
            category_label: details.category_id.label(),
            coverage_level: details.coverage_level,
            limits: details.limits.clone(),
            covered: details.covered.clone(),
            not_covered: details.not_covered.clone(),
            conditions: details.conditions.clone().unwrap_or_default(),
            claim_process: details.claim_process.clone(),
            notes: details.notes.clone(),
        }
    }
}

/// One selected source with every benefit inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSource {
    pub id: String,
    pub source_type: SourceKind,
    pub name: String,
    pub full_name: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental_coverage_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_period: Option<String>,
    pub categories: Vec<CategoryId>,
    pub benefits: Vec<AssistantBenefit>,
}

/// Grounding context handed to the assistant collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantContext {
    pub cards: Vec<AssistantSource>,
    pub plans: Vec<AssistantSource>,
    pub policies: Vec<AssistantSource>,
    pub covered_categories: Vec<CategoryId>,
    pub coverage_gaps: Vec<CategoryId>,
    pub total_annual_cost: f64,
}

impl CoverageEngine<'_> {
    pub fn format_for_assistant(&self) -> AssistantContext {
        let mut context = AssistantContext {
            cards: Vec::new(),
            plans: Vec::new(),
            policies: Vec::new(),
            covered_categories: self.categories_with_coverage(),
            coverage_gaps: self.coverage_gaps(),
            total_annual_cost: self.total_annual_cost(),
        };

        for source in self.selected_sources() {
            let projected = project(source);
            match source.kind() {
                SourceKind::CreditCard => context.cards.push(projected),
                SourceKind::ProtectionPlan => context.plans.push(projected),
                SourceKind::Policy => context.policies.push(projected),
            }
        }
        context
    }
}

fn project(source: CoverageSource<'_>) -> AssistantSource {
    let base = source.base();
    let mut projected = AssistantSource {
        id: base.id().to_string(),
        source_type: source.kind(),
        name: base.name().to_string(),
        full_name: base.full_name().to_string(),
        provider: base.provider().to_string(),
        network: None,
        annual_fee: None,
        rental_coverage_type: None,
        plan_type: None,
        yearly_cost: None,
        policy_type: None,
        carrier: None,
        policy_number: None,
        coverage_period: None,
        categories: base.categories().iter().copied().collect(),
        benefits: base
            .benefits()
            .values()
            .map(AssistantBenefit::from_details)
            .collect(),
    };

    match source {
        CoverageSource::CreditCard(card) => {
            projected.network = Some(card.network.clone());
            projected.annual_fee = Some(card.annual_fee);
            projected.rental_coverage_type = card
                .rental_coverage_type()
                .map(|t| t.as_str().to_string());
        }
        CoverageSource::ProtectionPlan(plan) => {
            projected.plan_type = Some(plan.plan_kind.as_str().to_string());
            projected.yearly_cost = Some(plan.cost.yearly());
        }
        CoverageSource::Policy(policy) => {
            projected.policy_type = Some(policy.policy_kind.as_str().to_string());
            projected.carrier = policy.carrier.clone();
            projected.policy_number = policy.policy_number.clone();
            projected.coverage_period = match (&policy.effective_date, &policy.expiration_date) {
                (Some(from), Some(to)) => Some(format!("{} to {}", from, to)),
                (Some(from), None) => Some(format!("from {}", from)),
                (None, Some(to)) => Some(format!("until {}", to)),
                (None, None) => None,
            };
        }
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Catalog;

    #[test]
    fn test_projection_groups_by_kind() {
        let catalog = Catalog::builtin().unwrap();
        let engine = CoverageEngine::new(
            &catalog,
            &["chase-sapphire-reserve".to_string()],
            &["aaa-plus".to_string()],
            Vec::new(),
        );
        let context = engine.format_for_assistant();

        assert_eq!(context.cards.len(), 1);
        assert_eq!(context.plans.len(), 1);
        assert!(context.policies.is_empty());

        let card = &context.cards[0];
        assert_eq!(card.rental_coverage_type.as_deref(), Some("primary"));
        assert_eq!(card.annual_fee, Some(550.0));
        assert_eq!(card.benefits.len(), card.categories.len());

        let plan = &context.plans[0];
        assert_eq!(plan.plan_type.as_deref(), Some("service"));
        assert_eq!(plan.yearly_cost, Some(124.0));
    }

    #[test]
    fn test_limits_are_nested_under_benefit() {
        let catalog = Catalog::builtin().unwrap();
        let engine = CoverageEngine::new(
            &catalog,
            &["chase-sapphire-reserve".to_string()],
            &[],
            Vec::new(),
        );
        let json = serde_json::to_value(engine.format_for_assistant()).unwrap();
        let rental = json["cards"][0]["benefits"]
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["category"] == "travel-rental")
            .unwrap();
        assert_eq!(rental["limits"]["maxCoverage"], 75000.0);
        assert!(rental.get("maxCoverage").is_none());
        assert_eq!(rental["categoryLabel"], "Rental Car");
    }

    #[test]
    fn test_empty_selection_projection() {
        let catalog = Catalog::builtin().unwrap();
        let engine = CoverageEngine::new(&catalog, &[], &[], Vec::new());
        let context = engine.format_for_assistant();
        assert!(context.cards.is_empty());
        assert!(context.covered_categories.is_empty());
        assert_eq!(context.coverage_gaps.len(), CategoryId::ALL.len());
        assert_eq!(context.total_annual_cost, 0.0);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coverage query engine.
//!
//! Answers category-level questions over one snapshot of a user's selection:
//! which sources cover a category, the derived status, gaps, the best source,
//! side-by-side comparison and the aggregate view.

use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{
    CategoryId, CoverageLevel, CoverageSource, CreditCardSource, PolicySource,
    ProtectionPlanSource, RentalCoverageType, Selection, SourceKind,
};
use crate::services::Catalog;

/// Maximum number of highlight lines per comparison cell.
const MAX_HIGHLIGHTS: usize = 3;

/// Derived label for a category, based only on how many sources cover it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CoverageStatus {
    None,
    Partial,
    Covered,
}

impl CoverageStatus {
    /// 0 sources: none, exactly 1: partial, 2 or more: covered.
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => CoverageStatus::None,
            1 => CoverageStatus::Partial,
            _ => CoverageStatus::Covered,
        }
    }
}

/// Sources covering one category, grouped by kind in selection order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorySources<'s> {
    pub cards: Vec<&'s CreditCardSource>,
    pub plans: Vec<&'s ProtectionPlanSource>,
    pub policies: Vec<&'s PolicySource>,
}

impl<'s> CategorySources<'s> {
    pub fn total(&self) -> usize {
        self.cards.len() + self.plans.len() + self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Cards, then plans, then policies.
    pub fn in_order(&self) -> Vec<CoverageSource<'s>> {
        self.cards
            .iter()
            .copied()
            .map(CoverageSource::CreditCard)
            .chain(self.plans.iter().copied().map(CoverageSource::ProtectionPlan))
            .chain(self.policies.iter().copied().map(CoverageSource::Policy))
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.in_order().iter().map(|s| s.id().to_string()).collect()
    }
}

/// One cell of a comparison matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonCell {
    pub has_category: bool,
    pub coverage_level: CoverageLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_limit: Option<f64>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedSource {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
}

/// Source × category matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMatrix {
    pub sources: Vec<ComparedSource>,
    pub categories: Vec<CategoryId>,
    pub cells: BTreeMap<String, BTreeMap<CategoryId, ComparisonCell>>,
}

impl ComparisonMatrix {
    pub fn cell(&self, source_id: &str, category: CategoryId) -> Option<&ComparisonCell> {
        self.cells.get(source_id)?.get(&category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategoryCoverage {
    pub category: CategoryId,
    pub label: String,
    pub status: CoverageStatus,
    pub source_count: usize,
    pub source_ids: Vec<String>,
}

/// Per-category status over the whole enumeration, plus yearly cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AggregatedCoverage {
    pub categories: Vec<CategoryCoverage>,
    pub total_annual_cost: f64,
    pub summary: CoverageSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CoverageSummary {
    pub covered: usize,
    pub partial: usize,
    pub gaps: usize,
}

/// Read-only query surface over one selection snapshot.
///
/// Identifiers that no longer resolve in the catalog are dropped on
/// construction. Policies must already have been accepted through
/// [`PolicyTypeDefinition::accept`](crate::models::PolicyTypeDefinition::accept).
#[derive(Debug, Clone)]
pub struct CoverageEngine<'a> {
    catalog: &'a Catalog,
    cards: Vec<&'a CreditCardSource>,
    plans: Vec<&'a ProtectionPlanSource>,
    policies: Vec<PolicySource>,
}

impl<'a> CoverageEngine<'a> {
    pub fn new(
        catalog: &'a Catalog,
        card_ids: &[String],
        plan_ids: &[String],
        policies: Vec<PolicySource>,
    ) -> Self {
        let mut cards: Vec<&CreditCardSource> = Vec::with_capacity(card_ids.len());
        for id in card_ids {
            match catalog.card(id) {
                Some(card) if !cards.iter().any(|c| c.base.id() == id.as_str()) => cards.push(card),
                Some(_) => {}
                None => tracing::debug!(card_id = %id, "Dropping card no longer in catalog"),
            }
        }

        let mut plans: Vec<&ProtectionPlanSource> = Vec::with_capacity(plan_ids.len());
        for id in plan_ids {
            match catalog.plan(id) {
                Some(plan) if !plans.iter().any(|p| p.base.id() == id.as_str()) => plans.push(plan),
                Some(_) => {}
                None => tracing::debug!(plan_id = %id, "Dropping plan no longer in catalog"),
            }
        }

        Self {
            catalog,
            cards,
            plans,
            policies,
        }
    }

    /// Engine over a snapshot of the user's selection.
    pub fn from_selection(catalog: &'a Catalog, selection: &Selection) -> Self {
        Self::new(
            catalog,
            &selection.selected_cards,
            &selection.plan_ids(),
            selection.uploaded_policies.clone(),
        )
    }

    pub fn cards(&self) -> &[&'a CreditCardSource] {
        &self.cards
    }

    pub fn plans(&self) -> &[&'a ProtectionPlanSource] {
        &self.plans
    }

    pub fn policies(&self) -> &[PolicySource] {
        &self.policies
    }

    /// Every resolved source: cards, then plans, then policies.
    pub fn selected_sources(&self) -> Vec<CoverageSource<'_>> {
        self.cards
            .iter()
            .copied()
            .map(CoverageSource::CreditCard)
            .chain(self.plans.iter().copied().map(CoverageSource::ProtectionPlan))
            .chain(self.policies.iter().map(CoverageSource::Policy))
            .collect()
    }

    pub fn source(&self, id: &str) -> Option<CoverageSource<'_>> {
        self.selected_sources().into_iter().find(|s| s.id() == id)
    }

    /// Whether a source counts toward a category.
    ///
    /// Policies count through their policy type's declared categories; a
    /// policy whose type is not in the catalog falls back to its own.
    pub fn source_covers(&self, source: CoverageSource<'_>, category: CategoryId) -> bool {
        match source {
            CoverageSource::Policy(policy) => match self.catalog.policy_type(policy.policy_kind) {
                Some(def) => def.categories.contains(&category),
                None => policy.base.covers(category),
            },
            other => other.base().covers(category),
        }
    }

    pub fn sources_for_category(&self, category: CategoryId) -> CategorySources<'_> {
        CategorySources {
            cards: self
                .cards
                .iter()
                .copied()
                .filter(|c| c.base.covers(category))
                .collect(),
            plans: self
                .plans
                .iter()
                .copied()
                .filter(|p| p.base.covers(category))
                .collect(),
            policies: self
                .policies
                .iter()
                .filter(|p| self.source_covers(CoverageSource::Policy(p), category))
                .collect(),
        }
    }

    pub fn coverage_status(&self, category: CategoryId) -> CoverageStatus {
        CoverageStatus::from_count(self.sources_for_category(category).total())
    }

    /// Categories with zero sources, in enumeration order.
    pub fn coverage_gaps(&self) -> Vec<CategoryId> {
        CategoryId::ALL
            .into_iter()
            .filter(|c| self.sources_for_category(*c).is_empty())
            .collect()
    }

    /// Categories with at least one source, in enumeration order.
    pub fn categories_with_coverage(&self) -> Vec<CategoryId> {
        CategoryId::ALL
            .into_iter()
            .filter(|c| !self.sources_for_category(*c).is_empty())
            .collect()
    }

    /// Best single source for a category.
    ///
    /// For rental cars, cards with primary coverage win, highest max
    /// coverage first, ties by selection order. Otherwise (and when no card
    /// is primary) the first matching source in selection order.
    pub fn best_source_for_category(&self, category: CategoryId) -> Option<CoverageSource<'_>> {
        let sources = self.sources_for_category(category);

        if category == CategoryId::TravelRental {
            let mut best: Option<&CreditCardSource> = None;
            for card in sources
                .cards
                .iter()
                .copied()
                .filter(|c| c.rental_coverage_type() == Some(RentalCoverageType::Primary))
            {
                let better = match best {
                    None => true,
                    Some(current) => {
                        limit_rank(card.rental_max_coverage())
                            > limit_rank(current.rental_max_coverage())
                    }
                };
                if better {
                    best = Some(card);
                }
            }
            if let Some(card) = best {
                return Some(CoverageSource::CreditCard(card));
            }
        }

        sources.in_order().into_iter().next()
    }

    /// Build a comparison matrix for the given selected sources.
    ///
    /// Unknown ids are skipped. Without explicit categories, the columns are
    /// every category any compared source covers.
    pub fn compare_sources(
        &self,
        source_ids: &[&str],
        categories: Option<&[CategoryId]>,
    ) -> ComparisonMatrix {
        let mut compared: Vec<CoverageSource<'_>> = Vec::new();
        for id in source_ids {
            if compared.iter().any(|s| s.id() == *id) {
                continue;
            }
            match self.source(id) {
                Some(source) => compared.push(source),
                None => tracing::debug!(source_id = %id, "Skipping unknown source in comparison"),
            }
        }

        let categories: Vec<CategoryId> = match categories {
            Some(explicit) => {
                // Caller's column order, first occurrence wins
                let mut list: Vec<CategoryId> = Vec::with_capacity(explicit.len());
                for category in explicit {
                    if !list.contains(category) {
                        list.push(*category);
                    }
                }
                list
            }
            None => CategoryId::ALL
                .into_iter()
                .filter(|c| compared.iter().any(|s| self.source_covers(*s, *c)))
                .collect(),
        };

        let mut cells = BTreeMap::new();
        for source in &compared {
            let row: BTreeMap<CategoryId, ComparisonCell> = categories
                .iter()
                .map(|c| (*c, self.comparison_cell(*source, *c)))
                .collect();
            cells.insert(source.id().to_string(), row);
        }

        ComparisonMatrix {
            sources: compared
                .iter()
                .map(|s| ComparedSource {
                    id: s.id().to_string(),
                    name: s.base().name().to_string(),
                    kind: s.kind(),
                })
                .collect(),
            categories,
            cells,
        }
    }

    fn comparison_cell(&self, source: CoverageSource<'_>, category: CategoryId) -> ComparisonCell {
        let has_category = self.source_covers(source, category);
        let details = source.benefit(category);

        let coverage_level = match (has_category, details) {
            (false, _) => CoverageLevel::None,
            (true, Some(d)) => d.coverage_level,
            (true, None) => CoverageLevel::Limited,
        };
        let key_limit = if has_category {
            match (source, category) {
                (CoverageSource::CreditCard(card), CategoryId::TravelRental) => {
                    card.rental_max_coverage()
                }
                _ => details.and_then(|d| d.key_limit()),
            }
        } else {
            None
        };
        let highlights = if has_category {
            details
                .map(|d| d.covered.iter().take(MAX_HIGHLIGHTS).cloned().collect())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        ComparisonCell {
            has_category,
            coverage_level,
            key_limit,
            highlights,
        }
    }

    /// Card annual fees plus plan costs normalised to a year.
    pub fn total_annual_cost(&self) -> f64 {
        let fees: f64 = self.cards.iter().map(|c| c.annual_fee).sum();
        let plans: f64 = self.plans.iter().map(|p| p.cost.yearly()).sum();
        fees + plans
    }

    pub fn aggregated_coverage(&self) -> AggregatedCoverage {
        let categories: Vec<CategoryCoverage> = CategoryId::ALL
            .into_iter()
            .map(|category| {
                let sources = self.sources_for_category(category);
                CategoryCoverage {
                    category,
                    label: category.label().to_string(),
                    status: CoverageStatus::from_count(sources.total()),
                    source_count: sources.total(),
                    source_ids: sources.ids(),
                }
            })
            .collect();

        let mut summary = CoverageSummary::default();
        for entry in &categories {
            match entry.status {
                CoverageStatus::Covered => summary.covered += 1,
                CoverageStatus::Partial => summary.partial += 1,
                CoverageStatus::None => summary.gaps += 1,
            }
        }

        AggregatedCoverage {
            categories,
            total_annual_cost: self.total_annual_cost(),
            summary,
        }
    }

    pub fn coverage_summary(&self) -> CoverageSummary {
        self.aggregated_coverage().summary
    }
}

/// Orders optional limits with "no stated limit" lowest.
fn limit_rank(limit: Option<f64>) -> f64 {
    limit.unwrap_or(f64::NEG_INFINITY)
}

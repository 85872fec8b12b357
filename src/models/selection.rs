// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! A user's coverage selection and its durable record layout.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{PlanRef, PolicySource};

/// Schema version of [`PersistedSelection`]. Records with any other
/// version are discarded whole.
pub const SCHEMA_VERSION: u32 = 3;

/// What the user has chosen: cards, plans and uploaded policies.
///
/// Order is selection order and is preserved through persistence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub selected_cards: Vec<String>,
    #[serde(default)]
    pub uploaded_policies: Vec<PolicySource>,
    #[serde(default)]
    pub added_plans: Vec<PlanRef>,
}

/// Per-kind counts for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SelectionCounts {
    pub cards: usize,
    pub plans: usize,
    pub policies: usize,
}

impl Selection {
    pub fn counts(&self) -> SelectionCounts {
        SelectionCounts {
            cards: self.selected_cards.len(),
            plans: self.added_plans.len(),
            policies: self.uploaded_policies.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_cards.is_empty()
            && self.added_plans.is_empty()
            && self.uploaded_policies.is_empty()
    }

    pub fn plan_ids(&self) -> Vec<String> {
        self.added_plans.iter().map(|p| p.plan_id.clone()).collect()
    }

    /// Select the card if absent, deselect it if present.
    ///
    /// Returns `true` if the card is selected afterwards.
    pub fn toggle_card(&mut self, card_id: &str) -> bool {
        if let Some(pos) = self.selected_cards.iter().position(|c| c == card_id) {
            self.selected_cards.remove(pos);
            false
        } else {
            self.selected_cards.push(card_id.to_string());
            true
        }
    }

    /// Replace the card list, dropping duplicates but keeping first-seen order.
    pub fn set_cards(&mut self, card_ids: &[String]) {
        self.selected_cards.clear();
        for id in card_ids {
            if !self.selected_cards.contains(id) {
                self.selected_cards.push(id.clone());
            }
        }
    }

    /// Returns `false` if the plan was already added.
    pub fn add_plan(&mut self, plan_id: &str, now: &str) -> bool {
        if self.added_plans.iter().any(|p| p.plan_id == plan_id) {
            return false;
        }
        self.added_plans.push(PlanRef {
            plan_id: plan_id.to_string(),
            added_at: now.to_string(),
        });
        true
    }

    /// Returns `false` if the plan was not present.
    pub fn remove_plan(&mut self, plan_id: &str) -> bool {
        let before = self.added_plans.len();
        self.added_plans.retain(|p| p.plan_id != plan_id);
        self.added_plans.len() != before
    }

    /// Add a policy, replacing one with the same id in place.
    pub fn add_policy(&mut self, policy: PolicySource) {
        match self
            .uploaded_policies
            .iter_mut()
            .find(|p| p.base.id() == policy.base.id())
        {
            Some(existing) => *existing = policy,
            None => self.uploaded_policies.push(policy),
        }
    }

    /// Returns `false` if the policy was not present.
    pub fn remove_policy(&mut self, policy_id: &str) -> bool {
        let before = self.uploaded_policies.len();
        self.uploaded_policies.retain(|p| p.base.id() != policy_id);
        self.uploaded_policies.len() != before
    }
}

/// The `state` half of a durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub user_id: String,
    #[serde(flatten)]
    pub selection: Selection,
    pub last_updated: String,
}

/// Durable record: `{ state: {...}, version }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSelection {
    pub state: PersistedState,
    pub version: u32,
}

impl PersistedSelection {
    pub fn new(user_id: &str, selection: Selection, now: &str) -> Self {
        Self {
            state: PersistedState {
                user_id: user_id.to_string(),
                selection,
                last_updated: now.to_string(),
            },
            version: SCHEMA_VERSION,
        }
    }
}

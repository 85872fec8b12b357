// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vendor protection plans (device, purchase, subscription, service).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::SourceBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Device,
    Purchase,
    Subscription,
    Service,
}

impl PlanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::Device => "device",
            PlanKind::Purchase => "purchase",
            PlanKind::Subscription => "subscription",
            PlanKind::Service => "service",
        }
    }
}

/// How often a plan is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub enum BillingCadence {
    Monthly,
    Annual,
    OneTime,
    Variable,
    /// Bundled with another purchase at no separate charge
    Included,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanCost {
    pub billing: BillingCadence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PlanCost {
    /// Cost normalised to a year. One-time, variable and included plans
    /// contribute nothing.
    pub fn yearly(&self) -> f64 {
        match (self.billing, self.amount) {
            (BillingCadence::Monthly, Some(amount)) => amount * 12.0,
            (BillingCadence::Annual, Some(amount)) => amount,
            _ => 0.0,
        }
    }
}

/// A hydrated protection plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionPlanSource {
    #[serde(flatten)]
    pub base: SourceBase,
    pub plan_kind: PlanKind,
    pub cost: PlanCost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_requirements: Option<Vec<String>>,
}

/// Reference to a plan the user added, as persisted in the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRef {
    pub plan_id: String,
    pub added_at: String,
}

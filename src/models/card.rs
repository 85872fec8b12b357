// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credit card sources and their typed benefit blocks.
//!
//! The block types double as benefit template payloads: a template is a
//! reusable block addressed by key, spliced into a card at hydration.

use serde::{Deserialize, Serialize};

use crate::models::SourceBase;

/// Whether card rental coverage pays before or after personal auto insurance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalCoverageType {
    Primary,
    Secondary,
}

impl RentalCoverageType {
    pub fn as_str(self) -> &'static str {
        match self {
            RentalCoverageType::Primary => "primary",
            RentalCoverageType::Secondary => "secondary",
        }
    }
}

/// Shared exclusion terms for rental car coverage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentalExclusions {
    pub excluded_vehicles: Vec<String>,
    pub excluded_countries: Vec<String>,
    pub exclusions: Vec<String>,
}

/// Auto rental collision damage waiver.
///
/// Limits are card-specific and stay inline; exclusion text is template-resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalBenefit {
    pub coverage_type: RentalCoverageType,
    pub max_coverage: Option<f64>,
    pub max_days: Option<u32>,
    #[serde(flatten)]
    pub exclusions: RentalExclusions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripProtectionBenefit {
    pub cancellation_coverage: Option<f64>,
    pub interruption_coverage: Option<f64>,
    pub delay_coverage: Option<f64>,
    pub delay_threshold_hours: Option<u32>,
    pub covered_reasons: Vec<String>,
    pub exclusions: Vec<String>,
    pub claim_process: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaggageBenefit {
    pub lost_baggage_coverage: Option<f64>,
    pub delayed_baggage_coverage: Option<f64>,
    pub delay_threshold_hours: Option<u32>,
    pub covered: Vec<String>,
    pub exclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurchaseProtectionBenefit {
    pub max_per_claim: Option<f64>,
    pub max_per_year: Option<f64>,
    pub coverage_days: Option<u32>,
    pub covered: Vec<String>,
    pub exclusions: Vec<String>,
    pub claim_process: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtendedWarrantyBenefit {
    pub additional_years: Option<u32>,
    pub max_original_warranty_years: Option<u32>,
    pub max_per_claim: Option<f64>,
    pub exclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TravelPerksBenefit {
    pub lounge_access: Vec<String>,
    pub travel_credit: Option<f64>,
    pub global_entry_credit: Option<f64>,
    pub perks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellPhoneBenefit {
    pub max_per_claim: Option<f64>,
    pub max_claims_per_year: Option<u32>,
    pub deductible: Option<f64>,
    pub requirements: Vec<String>,
    pub exclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoadsideBenefit {
    pub provider: Option<String>,
    pub services: Vec<String>,
    pub max_per_event: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyAssistanceBenefit {
    pub services: Vec<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReturnProtectionBenefit {
    pub max_per_item: Option<f64>,
    pub max_per_year: Option<f64>,
    pub return_window_days: Option<u32>,
    pub exclusions: Vec<String>,
}

/// The ten optional benefit slots a card can carry.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBenefits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental: Option<RentalBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_protection: Option<TripProtectionBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baggage: Option<BaggageBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_protection: Option<PurchaseProtectionBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_warranty: Option<ExtendedWarrantyBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_perks: Option<TravelPerksBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_phone: Option<CellPhoneBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadside: Option<RoadsideBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_assistance: Option<EmergencyAssistanceBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_protection: Option<ReturnProtectionBenefit>,
}

/// A hydrated credit card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardSource {
    #[serde(flatten)]
    pub base: SourceBase,
    /// Card network (visa, mastercard, amex, discover)
    pub network: String,
    /// Annual fee in dollars
    pub annual_fee: f64,
    /// Product tier (e.g. "premium", "mid", "no-fee")
    pub tier: String,
    #[serde(flatten)]
    pub benefits: CardBenefits,
}

impl CreditCardSource {
    pub fn rental_coverage_type(&self) -> Option<RentalCoverageType> {
        self.benefits.rental.as_ref().map(|r| r.coverage_type)
    }

    pub fn rental_max_coverage(&self) -> Option<f64> {
        self.benefits.rental.as_ref().and_then(|r| r.max_coverage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rental_coverage_type_str_matches_wire_name() {
        for kind in [RentalCoverageType::Primary, RentalCoverageType::Secondary] {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::from(kind.as_str())
            );
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Source hydration: compact data records to self-contained sources.
//!
//! - Cards reference benefit templates by key; slots are resolved here.
//! - Plans carry inline benefits; only cost and category typing are normalised.
//! - Policy types supply default benefits and the extraction schema used to
//!   accept an uploaded policy.
//!
//! All "absent benefit" defaulting happens here so query code never has to
//! know which raw fields were optional.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{CatalogError, CoverageError, Result};
use crate::models::benefit::limits;
use crate::models::card::{
    BaggageBenefit, CellPhoneBenefit, EmergencyAssistanceBenefit, ExtendedWarrantyBenefit,
    PurchaseProtectionBenefit, RentalExclusions, ReturnProtectionBenefit, RoadsideBenefit,
    TravelPerksBenefit, TripProtectionBenefit,
};
use crate::models::{
    BenefitDetails, BillingCadence, CardBenefits, CategoryId, CoverageLevel, CreditCardSource,
    ExtractedPolicy, ExtractionSchema, FieldMapping, LimitValue, Limits, PlanCost, PlanKind,
    PolicyKind, PolicyOrigin, PolicySource, PolicyTypeDefinition, ProtectionPlanSource,
    RentalBenefit, RentalCoverageType, SourceBase, ValidationResult,
};
use crate::services::templates::{BenefitKind, BenefitTemplate, TemplateLibrary};

// ─── Raw Records ─────────────────────────────────────────────────

/// Rental slot: limits inline, exclusion text by template key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRentalSlot {
    pub coverage_type: RentalCoverageType,
    #[serde(default)]
    pub max_coverage: Option<f64>,
    #[serde(default)]
    pub max_days: Option<u32>,
    #[serde(default)]
    pub exclusions: Option<String>,
}

/// Compact credit card record as stored in `credit_cards.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCardRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub issuer: String,
    pub network: String,
    #[serde(default)]
    pub annual_fee: f64,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub rental: Option<RawRentalSlot>,
    #[serde(default)]
    pub trip_protection: Option<String>,
    #[serde(default)]
    pub baggage: Option<String>,
    #[serde(default)]
    pub purchase_protection: Option<String>,
    #[serde(default)]
    pub extended_warranty: Option<String>,
    #[serde(default)]
    pub travel_perks: Option<String>,
    #[serde(default)]
    pub cell_phone: Option<String>,
    #[serde(default)]
    pub roadside: Option<String>,
    #[serde(default)]
    pub emergency_assistance: Option<String>,
    #[serde(default)]
    pub return_protection: Option<String>,
}

/// Inline benefit data; the category comes from the enclosing map key.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBenefit {
    pub coverage_level: CoverageLevel,
    pub limits: Limits,
    pub covered: Vec<String>,
    pub not_covered: Vec<String>,
    pub conditions: Option<Vec<String>>,
    pub claim_process: Option<String>,
    pub notes: Option<String>,
}

impl RawBenefit {
    fn into_details(self, category: CategoryId) -> BenefitDetails {
        BenefitDetails {
            category_id: category,
            coverage_level: self.coverage_level,
            limits: self.limits,
            covered: self.covered,
            not_covered: self.not_covered,
            conditions: self.conditions,
            claim_process: self.claim_process,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlanCost {
    pub billing: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Protection plan record as stored in `protection_plans.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlanRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub provider: String,
    pub plan_kind: PlanKind,
    pub cost: RawPlanCost,
    #[serde(default)]
    pub eligibility: Option<Vec<String>>,
    #[serde(default)]
    pub purchase_requirements: Option<Vec<String>>,
    #[serde(default)]
    pub benefits: BTreeMap<String, RawBenefit>,
}

/// Policy type record as stored in `policy_types.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPolicyType {
    pub kind: PolicyKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub default_benefits: BTreeMap<CategoryId, RawBenefit>,
    #[serde(default)]
    pub extraction_schema: ExtractionSchema,
    #[serde(default)]
    pub field_mappings: BTreeMap<String, FieldMapping>,
}

// ─── Credit Cards ────────────────────────────────────────────────

/// Resolve a card's template references into a self-contained source.
///
/// A slot absent from the record, or whose key does not resolve, is absent
/// on the hydrated card.
pub fn hydrate_card(raw: &RawCardRecord, templates: &TemplateLibrary) -> CreditCardSource {
    let slot = |kind: BenefitKind, key: &Option<String>| resolve(templates, &raw.id, kind, key);

    let rental = raw.rental.as_ref().map(|r| {
        let exclusions = match slot(BenefitKind::RentalExclusions, &r.exclusions) {
            Some(BenefitTemplate::RentalExclusions(e)) => e.clone(),
            _ => RentalExclusions::default(),
        };
        RentalBenefit {
            coverage_type: r.coverage_type,
            max_coverage: r.max_coverage,
            max_days: r.max_days,
            exclusions,
        }
    });

    let benefits = CardBenefits {
        rental,
        trip_protection: match slot(BenefitKind::TripProtection, &raw.trip_protection) {
            Some(BenefitTemplate::TripProtection(t)) => Some(t.clone()),
            _ => None,
        },
        baggage: match slot(BenefitKind::Baggage, &raw.baggage) {
            Some(BenefitTemplate::Baggage(t)) => Some(t.clone()),
            _ => None,
        },
        purchase_protection: match slot(BenefitKind::PurchaseProtection, &raw.purchase_protection)
        {
            Some(BenefitTemplate::PurchaseProtection(t)) => Some(t.clone()),
            _ => None,
        },
        extended_warranty: match slot(BenefitKind::ExtendedWarranty, &raw.extended_warranty) {
            Some(BenefitTemplate::ExtendedWarranty(t)) => Some(t.clone()),
            _ => None,
        },
        travel_perks: match slot(BenefitKind::TravelPerks, &raw.travel_perks) {
            Some(BenefitTemplate::TravelPerks(t)) => Some(t.clone()),
            _ => None,
        },
        cell_phone: match slot(BenefitKind::CellPhone, &raw.cell_phone) {
            Some(BenefitTemplate::CellPhone(t)) => Some(t.clone()),
            _ => None,
        },
        roadside: match slot(BenefitKind::Roadside, &raw.roadside) {
            Some(BenefitTemplate::Roadside(t)) => Some(t.clone()),
            _ => None,
        },
        emergency_assistance: match slot(
            BenefitKind::EmergencyAssistance,
            &raw.emergency_assistance,
        ) {
            Some(BenefitTemplate::EmergencyAssistance(t)) => Some(t.clone()),
            _ => None,
        },
        return_protection: match slot(BenefitKind::ReturnProtection, &raw.return_protection) {
            Some(BenefitTemplate::ReturnProtection(t)) => Some(t.clone()),
            _ => None,
        },
    };

    let base = SourceBase::new(
        raw.id.clone(),
        raw.name.clone(),
        raw.full_name.clone().unwrap_or_else(|| raw.name.clone()),
        raw.issuer.clone(),
        card_benefit_map(&benefits),
    );

    CreditCardSource {
        base,
        network: raw.network.to_lowercase(),
        annual_fee: raw.annual_fee.max(0.0),
        tier: raw.tier.clone(),
        benefits,
    }
}

fn resolve<'a>(
    templates: &'a TemplateLibrary,
    card_id: &str,
    kind: BenefitKind,
    key: &Option<String>,
) -> Option<BenefitTemplate<'a>> {
    let key = key.as_deref()?;
    let resolved = templates.get_template(kind, key);
    if resolved.is_none() {
        tracing::warn!(card = card_id, ?kind, key, "Unresolved benefit template");
    }
    resolved
}

/// One `BenefitDetails` per present benefit block.
fn card_benefit_map(benefits: &CardBenefits) -> BTreeMap<CategoryId, BenefitDetails> {
    let mut map = BTreeMap::new();
    if let Some(r) = &benefits.rental {
        map.insert(CategoryId::TravelRental, rental_details(r));
    }
    if let Some(t) = &benefits.trip_protection {
        map.insert(CategoryId::TravelTrip, trip_details(t));
    }
    if let Some(b) = &benefits.baggage {
        map.insert(CategoryId::TravelBaggage, baggage_details(b));
    }
    if let Some(p) = &benefits.purchase_protection {
        map.insert(CategoryId::PurchaseProtection, purchase_details(p));
    }
    if let Some(w) = &benefits.extended_warranty {
        map.insert(CategoryId::ExtendedWarranty, warranty_details(w));
    }
    if let Some(p) = &benefits.travel_perks {
        map.insert(CategoryId::TravelPerks, perks_details(p));
    }
    if let Some(c) = &benefits.cell_phone {
        map.insert(CategoryId::CellPhone, cell_phone_details(c));
    }
    if let Some(r) = &benefits.roadside {
        map.insert(CategoryId::Roadside, roadside_details(r));
    }
    if let Some(e) = &benefits.emergency_assistance {
        map.insert(CategoryId::TravelEmergency, emergency_details(e));
    }
    if let Some(r) = &benefits.return_protection {
        map.insert(CategoryId::ReturnProtection, return_details(r));
    }
    map
}

fn rental_details(rental: &RentalBenefit) -> BenefitDetails {
    let (level, label) = match rental.coverage_type {
        RentalCoverageType::Primary => (CoverageLevel::Full, "Primary coverage"),
        RentalCoverageType::Secondary => (CoverageLevel::Partial, "Secondary coverage"),
    };

    let mut not_covered = rental.exclusions.excluded_vehicles.clone();
    not_covered.extend(rental.exclusions.exclusions.iter().cloned());

    let mut conditions = vec![
        "Decline the rental company's collision damage waiver".to_string(),
        "Pay for the entire rental with the card".to_string(),
    ];
    if !rental.exclusions.excluded_countries.is_empty() {
        conditions.push(format!(
            "Not valid in: {}",
            rental.exclusions.excluded_countries.join(", ")
        ));
    }

    let mut details = BenefitDetails::new(CategoryId::TravelRental, level)
        .with_amount(limits::MAX_COVERAGE, rental.max_coverage)
        .with_amount(limits::MAX_DAYS, rental.max_days.map(f64::from))
        .with_covered(vec![
            label.to_string(),
            "Collision damage".to_string(),
            "Theft of the rental vehicle".to_string(),
        ])
        .with_not_covered(not_covered);
    details.conditions = Some(conditions);
    details
}

fn trip_details(trip: &TripProtectionBenefit) -> BenefitDetails {
    let mut details = BenefitDetails::new(CategoryId::TravelTrip, CoverageLevel::Full)
        .with_amount(limits::CANCELLATION_COVERAGE, trip.cancellation_coverage)
        .with_amount(limits::INTERRUPTION_COVERAGE, trip.interruption_coverage)
        .with_amount(limits::DELAY_COVERAGE, trip.delay_coverage)
        .with_amount(
            limits::DELAY_THRESHOLD_HOURS,
            trip.delay_threshold_hours.map(f64::from),
        )
        .with_covered(trip.covered_reasons.clone())
        .with_not_covered(trip.exclusions.clone());
    details.claim_process = trip.claim_process.clone();
    details
}

fn baggage_details(baggage: &BaggageBenefit) -> BenefitDetails {
    BenefitDetails::new(CategoryId::TravelBaggage, CoverageLevel::Partial)
        .with_amount(limits::LOST_BAGGAGE_COVERAGE, baggage.lost_baggage_coverage)
        .with_amount(
            limits::DELAYED_BAGGAGE_COVERAGE,
            baggage.delayed_baggage_coverage,
        )
        .with_amount(
            limits::DELAY_THRESHOLD_HOURS,
            baggage.delay_threshold_hours.map(f64::from),
        )
        .with_covered(baggage.covered.clone())
        .with_not_covered(baggage.exclusions.clone())
}

fn purchase_details(purchase: &PurchaseProtectionBenefit) -> BenefitDetails {
    let mut details = BenefitDetails::new(CategoryId::PurchaseProtection, CoverageLevel::Full)
        .with_amount(limits::MAX_PER_CLAIM, purchase.max_per_claim)
        .with_amount(limits::MAX_PER_YEAR, purchase.max_per_year)
        .with_amount(
            limits::COVERAGE_PERIOD_DAYS,
            purchase.coverage_days.map(f64::from),
        )
        .with_covered(purchase.covered.clone())
        .with_not_covered(purchase.exclusions.clone());
    details.claim_process = purchase.claim_process.clone();
    details
}

fn warranty_details(warranty: &ExtendedWarrantyBenefit) -> BenefitDetails {
    let covered = warranty
        .additional_years
        .map(|years| {
            vec![format!(
                "Extends eligible manufacturer warranties by {} year{}",
                years,
                if years == 1 { "" } else { "s" }
            )]
        })
        .unwrap_or_default();

    BenefitDetails::new(CategoryId::ExtendedWarranty, CoverageLevel::Partial)
        .with_amount(
            limits::ADDITIONAL_YEARS,
            warranty.additional_years.map(f64::from),
        )
        .with_amount(
            limits::MAX_ORIGINAL_WARRANTY_YEARS,
            warranty.max_original_warranty_years.map(f64::from),
        )
        .with_amount(limits::MAX_PER_CLAIM, warranty.max_per_claim)
        .with_covered(covered)
        .with_not_covered(warranty.exclusions.clone())
}

fn perks_details(perks: &TravelPerksBenefit) -> BenefitDetails {
    let mut covered: Vec<String> = perks
        .lounge_access
        .iter()
        .map(|l| format!("Lounge access: {}", l))
        .collect();
    if let Some(credit) = perks.global_entry_credit {
        covered.push(format!("Global Entry/TSA PreCheck credit up to ${:.0}", credit));
    }
    covered.extend(perks.perks.iter().cloned());

    BenefitDetails::new(CategoryId::TravelPerks, CoverageLevel::Partial)
        .with_amount(limits::TRAVEL_CREDIT, perks.travel_credit)
        .with_covered(covered)
}

fn cell_phone_details(phone: &CellPhoneBenefit) -> BenefitDetails {
    let mut details = BenefitDetails::new(CategoryId::CellPhone, CoverageLevel::Partial)
        .with_amount(limits::MAX_PER_CLAIM, phone.max_per_claim)
        .with_amount(
            limits::MAX_CLAIMS_PER_YEAR,
            phone.max_claims_per_year.map(f64::from),
        )
        .with_amount(limits::DEDUCTIBLE, phone.deductible)
        .with_covered(vec!["Damage".to_string(), "Theft".to_string()])
        .with_not_covered(phone.exclusions.clone());
    if !phone.requirements.is_empty() {
        details.conditions = Some(phone.requirements.clone());
    }
    details
}

fn roadside_details(roadside: &RoadsideBenefit) -> BenefitDetails {
    let level = if roadside.max_per_event.is_some() {
        CoverageLevel::Partial
    } else {
        CoverageLevel::Limited
    };
    let mut details = BenefitDetails::new(CategoryId::Roadside, level)
        .with_amount(limits::MAX_PER_EVENT, roadside.max_per_event)
        .with_covered(roadside.services.clone());
    details.notes = match (&roadside.provider, &roadside.notes) {
        (Some(provider), Some(notes)) => Some(format!("{}: {}", provider, notes)),
        (Some(provider), None) => Some(provider.clone()),
        (None, notes) => notes.clone(),
    };
    details
}

fn emergency_details(emergency: &EmergencyAssistanceBenefit) -> BenefitDetails {
    let mut details = BenefitDetails::new(CategoryId::TravelEmergency, CoverageLevel::Limited)
        .with_covered(emergency.services.clone());
    details.claim_process = emergency.phone.as_ref().map(|p| format!("Call {}", p));
    details.notes = emergency.notes.clone();
    details
}

fn return_details(ret: &ReturnProtectionBenefit) -> BenefitDetails {
    BenefitDetails::new(CategoryId::ReturnProtection, CoverageLevel::Partial)
        .with_amount(limits::MAX_PER_ITEM, ret.max_per_item)
        .with_amount(limits::MAX_PER_YEAR, ret.max_per_year)
        .with_amount(
            limits::RETURN_WINDOW_DAYS,
            ret.return_window_days.map(f64::from),
        )
        .with_not_covered(ret.exclusions.clone())
}

// ─── Protection Plans ────────────────────────────────────────────

/// Normalise a plan record. Unknown category names are dropped.
pub fn hydrate_plan(raw: &RawPlanRecord) -> ProtectionPlanSource {
    let mut benefits = BTreeMap::new();
    for (name, benefit) in &raw.benefits {
        match name.parse::<CategoryId>() {
            Ok(category) => {
                benefits.insert(category, benefit.clone().into_details(category));
            }
            Err(e) => {
                tracing::warn!(plan = %raw.id, error = %e, "Dropping plan benefit");
            }
        }
    }

    let base = SourceBase::new(
        raw.id.clone(),
        raw.name.clone(),
        raw.full_name.clone().unwrap_or_else(|| raw.name.clone()),
        raw.provider.clone(),
        benefits,
    );

    ProtectionPlanSource {
        base,
        plan_kind: raw.plan_kind,
        cost: normalize_cost(&raw.id, &raw.cost),
        eligibility: raw.eligibility.clone(),
        purchase_requirements: raw.purchase_requirements.clone(),
    }
}

fn normalize_cost(plan_id: &str, raw: &RawPlanCost) -> PlanCost {
    let billing = parse_billing(&raw.billing).unwrap_or_else(|| {
        tracing::warn!(plan = plan_id, billing = %raw.billing, "Unknown billing cadence");
        BillingCadence::Variable
    });
    let amount = raw.amount.filter(|a| a.is_finite() && *a >= 0.0);
    PlanCost {
        billing,
        amount,
        note: raw.note.clone(),
    }
}

/// Parse the loose billing spellings used in plan data.
pub fn parse_billing(value: &str) -> Option<BillingCadence> {
    match value.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
        "monthly" | "month" | "mo" | "per-month" => Some(BillingCadence::Monthly),
        "annual" | "annually" | "yearly" | "year" | "yr" | "per-year" => {
            Some(BillingCadence::Annual)
        }
        "one-time" | "onetime" | "once" | "upfront" => Some(BillingCadence::OneTime),
        "variable" | "varies" => Some(BillingCadence::Variable),
        "included" | "free" | "bundled" => Some(BillingCadence::Included),
        _ => None,
    }
}

// ─── Policy Types ────────────────────────────────────────────────

/// Build a policy type definition, checking that every default benefit and
/// field mapping targets one of its declared categories.
pub fn hydrate_policy_type(
    raw: &RawPolicyType,
) -> std::result::Result<PolicyTypeDefinition, CatalogError> {
    for category in raw.default_benefits.keys() {
        if !raw.categories.contains(category) {
            return Err(CatalogError::Invariant(format!(
                "policy type {} has default benefit for undeclared category {}",
                raw.kind.as_str(),
                category
            )));
        }
    }
    for (field, mapping) in &raw.field_mappings {
        if !raw.categories.contains(&mapping.category) {
            return Err(CatalogError::Invariant(format!(
                "policy type {} maps field {} to undeclared category {}",
                raw.kind.as_str(),
                field,
                mapping.category
            )));
        }
    }

    let mut categories = raw.categories.clone();
    categories.sort();
    categories.dedup();

    let default_benefits = categories
        .iter()
        .map(|category| {
            let details = raw
                .default_benefits
                .get(category)
                .cloned()
                .map(|b| b.into_details(*category))
                .unwrap_or_else(|| BenefitDetails::new(*category, CoverageLevel::Limited));
            (*category, details)
        })
        .collect();

    Ok(PolicyTypeDefinition {
        kind: raw.kind,
        name: raw.name.clone(),
        description: raw.description.clone(),
        categories,
        default_benefits,
        extraction_schema: raw.extraction_schema.clone(),
        field_mappings: raw.field_mappings.clone(),
    })
}

impl PolicyTypeDefinition {
    /// Check an extraction against this type's required fields.
    pub fn validate(&self, extracted: &ExtractedPolicy) -> ValidationResult {
        let mut missing_fields: Vec<String> = Vec::new();
        if extracted.policy_type.is_some_and(|kind| kind != self.kind) {
            missing_fields.push("policyType".to_string());
        }
        missing_fields.extend(
            self.extraction_schema
                .required_fields
                .iter()
                .filter(|field| !extracted.has_field(field))
                .cloned(),
        );
        ValidationResult {
            valid: missing_fields.is_empty(),
            missing_fields,
        }
    }

    /// Validate an extraction and build the policy the store will hold.
    ///
    /// Benefits start from this type's defaults; mapped numeric fields are
    /// written into the matching category's limits. Nothing is accepted if
    /// validation fails.
    pub fn accept(
        &self,
        extracted: &ExtractedPolicy,
        policy_id: &str,
        now: &str,
    ) -> Result<PolicySource> {
        let validation = self.validate(extracted);
        if !validation.valid {
            return Err(CoverageError::invalid_policy(
                self.kind,
                validation.missing_fields,
            ));
        }

        let mut benefits = self.default_benefits.clone();
        for (field, mapping) in &self.field_mappings {
            let Some(amount) = extracted.fields.get(field).and_then(parse_amount) else {
                continue;
            };
            if let Some(details) = benefits.get_mut(&mapping.category) {
                details
                    .limits
                    .insert(mapping.limit.clone(), LimitValue::Number(amount));
            }
        }

        let carrier = extracted.text("carrier");
        let full_name = match &carrier {
            Some(c) => format!("{} {}", c, self.name),
            None => self.name.clone(),
        };
        let origin = if extracted.document_id.is_some() {
            PolicyOrigin::Document
        } else {
            PolicyOrigin::Manual
        };

        Ok(PolicySource {
            base: SourceBase::new(
                policy_id.to_string(),
                self.name.clone(),
                full_name,
                carrier.clone().unwrap_or_default(),
                benefits,
            ),
            policy_kind: self.kind,
            policy_number: extracted.text("policyNumber"),
            carrier,
            effective_date: extracted.text("effectiveDate"),
            expiration_date: extracted.text("expirationDate"),
            uploaded_at: now.to_string(),
            document_id: extracted.document_id.clone(),
            origin,
        })
    }
}

/// Parse a coverage amount: numbers, or strings like "$100,000".
fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    amount.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn templates() -> TemplateLibrary {
        TemplateLibrary::builtin().unwrap()
    }

    fn raw_card(json: serde_json::Value) -> RawCardRecord {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_card_slots_resolve_from_templates() {
        let raw = raw_card(json!({
            "id": "test-card",
            "name": "Test",
            "issuer": "Bank",
            "network": "VISA",
            "annualFee": 95,
            "tripProtection": "chase_preferred",
            "baggage": "chase_premium"
        }));
        let card = hydrate_card(&raw, &templates());

        assert_eq!(card.network, "visa");
        assert_eq!(card.base.full_name(), "Test");
        let trip = card.benefits.trip_protection.as_ref().unwrap();
        assert_eq!(trip.delay_threshold_hours, Some(12));
        assert!(card.base.covers(CategoryId::TravelTrip));
        assert!(card.base.covers(CategoryId::TravelBaggage));
        assert_eq!(card.base.categories().len(), 2);
    }

    #[test]
    fn test_absent_slot_yields_absent_block() {
        let raw = raw_card(json!({
            "id": "bare", "name": "Bare", "issuer": "Bank", "network": "visa"
        }));
        let card = hydrate_card(&raw, &templates());
        assert_eq!(card.benefits, CardBenefits::default());
        assert!(card.base.categories().is_empty());
    }

    #[test]
    fn test_unknown_template_key_is_treated_as_absent() {
        let raw = raw_card(json!({
            "id": "typo", "name": "Typo", "issuer": "Bank", "network": "visa",
            "cellPhone": "no_such_template"
        }));
        let card = hydrate_card(&raw, &templates());
        assert!(card.benefits.cell_phone.is_none());
        assert!(!card.base.covers(CategoryId::CellPhone));
    }

    #[test]
    fn test_rental_limits_inline_exclusions_from_template() {
        let raw = raw_card(json!({
            "id": "r", "name": "R", "issuer": "Bank", "network": "visa",
            "rental": {"coverageType": "primary", "maxCoverage": 50000, "maxDays": 31, "exclusions": "standard"}
        }));
        let card = hydrate_card(&raw, &templates());
        let rental = card.benefits.rental.as_ref().unwrap();

        assert_eq!(rental.coverage_type, RentalCoverageType::Primary);
        assert_eq!(rental.max_coverage, Some(50_000.0));
        assert!(rental
            .exclusions
            .excluded_countries
            .contains(&"Israel".to_string()));

        let details = card.base.benefit(CategoryId::TravelRental).unwrap();
        assert_eq!(details.coverage_level, CoverageLevel::Full);
        assert_eq!(details.key_limit(), Some(50_000.0));
    }

    #[test]
    fn test_rental_with_unknown_exclusions_keeps_limits() {
        let raw = raw_card(json!({
            "id": "r", "name": "R", "issuer": "Bank", "network": "visa",
            "rental": {"coverageType": "secondary", "maxCoverage": 40000, "exclusions": "missing"}
        }));
        let card = hydrate_card(&raw, &templates());
        let rental = card.benefits.rental.as_ref().unwrap();
        assert_eq!(rental.exclusions, RentalExclusions::default());
        assert_eq!(card.rental_max_coverage(), Some(40_000.0));
    }

    #[test]
    fn test_invalid_rental_coverage_type_rejected() {
        let result: std::result::Result<RawCardRecord, _> = serde_json::from_value(json!({
            "id": "r", "name": "R", "issuer": "Bank", "network": "visa",
            "rental": {"coverageType": "tertiary"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_hydrate_card_is_idempotent() {
        let raw = raw_card(json!({
            "id": "csr", "name": "CSR", "issuer": "Chase", "network": "visa",
            "rental": {"coverageType": "primary", "maxCoverage": 75000, "exclusions": "premium"},
            "tripProtection": "chase_reserve",
            "travelPerks": "chase_reserve"
        }));
        let library = templates();
        assert_eq!(hydrate_card(&raw, &library), hydrate_card(&raw, &library));
    }

    #[test]
    fn test_parse_billing_spellings() {
        assert_eq!(parse_billing("Month"), Some(BillingCadence::Monthly));
        assert_eq!(parse_billing("yearly"), Some(BillingCadence::Annual));
        assert_eq!(parse_billing("one_time"), Some(BillingCadence::OneTime));
        assert_eq!(parse_billing("free"), Some(BillingCadence::Included));
        assert_eq!(parse_billing("fortnightly"), None);
    }

    #[test]
    fn test_plan_drops_unknown_categories_and_normalises_cost() {
        let raw: RawPlanRecord = serde_json::from_value(json!({
            "id": "p", "name": "P", "provider": "Vendor", "planKind": "device",
            "cost": {"billing": "fortnightly", "amount": -5},
            "benefits": {
                "device-protection": {"coverageLevel": "full"},
                "pet-insurance": {"coverageLevel": "full"}
            }
        }))
        .unwrap();
        let plan = hydrate_plan(&raw);

        assert_eq!(plan.cost.billing, BillingCadence::Variable);
        assert_eq!(plan.cost.amount, None);
        assert_eq!(plan.base.categories().len(), 1);
        assert_eq!(
            plan.base
                .benefit(CategoryId::DeviceProtection)
                .unwrap()
                .category_id,
            CategoryId::DeviceProtection
        );
    }

    fn auto_type() -> PolicyTypeDefinition {
        let raw: RawPolicyType = serde_json::from_value(json!({
            "kind": "auto",
            "name": "Auto Insurance",
            "categories": ["auto-insurance", "travel-rental"],
            "defaultBenefits": {"auto-insurance": {"coverageLevel": "full"}},
            "extractionSchema": {"requiredFields": ["carrier", "policyNumber", "liabilityLimit"]},
            "fieldMappings": {
                "liabilityLimit": {"category": "auto-insurance", "limit": "liabilityLimit"}
            }
        }))
        .unwrap();
        hydrate_policy_type(&raw).unwrap()
    }

    #[test]
    fn test_policy_type_fills_missing_defaults() {
        let def = auto_type();
        assert_eq!(
            def.default_benefits[&CategoryId::TravelRental].coverage_level,
            CoverageLevel::Limited
        );
        assert_eq!(def.default_benefits.len(), def.categories.len());
    }

    #[test]
    fn test_policy_type_rejects_undeclared_mapping() {
        let raw: RawPolicyType = serde_json::from_value(json!({
            "kind": "home",
            "name": "Home",
            "categories": ["home-insurance"],
            "fieldMappings": {"x": {"category": "roadside", "limit": "maxPerEvent"}}
        }))
        .unwrap();
        assert!(matches!(
            hydrate_policy_type(&raw),
            Err(CatalogError::Invariant(_))
        ));
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let def = auto_type();
        let mut extracted = ExtractedPolicy::default();
        extracted.fields.insert("carrier".into(), json!("Geico"));

        let result = def.validate(&extracted);
        assert!(!result.valid);
        assert_eq!(result.missing_fields, vec!["policyNumber", "liabilityLimit"]);
    }

    #[test]
    fn test_validate_rejects_wrong_policy_type() {
        let def = auto_type();
        let extracted = ExtractedPolicy {
            policy_type: Some(PolicyKind::Home),
            document_id: None,
            fields: [
                ("carrier".to_string(), json!("Geico")),
                ("policyNumber".to_string(), json!("A1")),
                ("liabilityLimit".to_string(), json!(100000)),
            ]
            .into(),
        };
        let result = def.validate(&extracted);
        assert_eq!(result.missing_fields, vec!["policyType"]);
    }

    #[test]
    fn test_accept_overlays_mapped_fields() {
        let def = auto_type();
        let extracted = ExtractedPolicy {
            policy_type: Some(PolicyKind::Auto),
            document_id: Some("doc-7".to_string()),
            fields: [
                ("carrier".to_string(), json!("Geico")),
                ("policyNumber".to_string(), json!("A1")),
                ("liabilityLimit".to_string(), json!("$250,000")),
            ]
            .into(),
        };
        let policy = def
            .accept(&extracted, "policy-1", "2026-03-01T00:00:00Z")
            .unwrap();

        assert_eq!(policy.base.id(), "policy-1");
        assert_eq!(policy.base.full_name(), "Geico Auto Insurance");
        assert_eq!(policy.origin, PolicyOrigin::Document);
        assert_eq!(policy.policy_number.as_deref(), Some("A1"));
        assert_eq!(
            policy
                .base
                .benefit(CategoryId::AutoInsurance)
                .unwrap()
                .key_limit(),
            Some(250_000.0)
        );
        assert!(policy.base.covers(CategoryId::TravelRental));
    }

    #[test]
    fn test_accept_rejects_invalid_extraction() {
        let def = auto_type();
        let err = def
            .accept(&ExtractedPolicy::default(), "p", "now")
            .unwrap_err();
        match err {
            CoverageError::InvalidPolicy { missing_fields, .. } => {
                assert_eq!(missing_fields.len(), 3)
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

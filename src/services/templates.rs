// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Benefit template library.
//!
//! Reusable benefit definitions addressed by `(kind, key)`. Cards reference
//! templates by key instead of repeating the same terms.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::CatalogError;
use crate::models::card::{
    BaggageBenefit, CellPhoneBenefit, EmergencyAssistanceBenefit, ExtendedWarrantyBenefit,
    PurchaseProtectionBenefit, RentalExclusions, ReturnProtectionBenefit, RoadsideBenefit,
    TravelPerksBenefit, TripProtectionBenefit,
};

const BUILTIN_TEMPLATES: &str = include_str!("../../data/benefit_templates.json");

/// Template groups, one per card benefit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenefitKind {
    RentalExclusions,
    TripProtection,
    Baggage,
    PurchaseProtection,
    ExtendedWarranty,
    CellPhone,
    Roadside,
    EmergencyAssistance,
    ReturnProtection,
    TravelPerks,
}

impl BenefitKind {
    pub const ALL: [BenefitKind; 10] = [
        BenefitKind::RentalExclusions,
        BenefitKind::TripProtection,
        BenefitKind::Baggage,
        BenefitKind::PurchaseProtection,
        BenefitKind::ExtendedWarranty,
        BenefitKind::CellPhone,
        BenefitKind::Roadside,
        BenefitKind::EmergencyAssistance,
        BenefitKind::ReturnProtection,
        BenefitKind::TravelPerks,
    ];
}

/// A resolved template, borrowed from the library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BenefitTemplate<'a> {
    RentalExclusions(&'a RentalExclusions),
    TripProtection(&'a TripProtectionBenefit),
    Baggage(&'a BaggageBenefit),
    PurchaseProtection(&'a PurchaseProtectionBenefit),
    ExtendedWarranty(&'a ExtendedWarrantyBenefit),
    CellPhone(&'a CellPhoneBenefit),
    Roadside(&'a RoadsideBenefit),
    EmergencyAssistance(&'a EmergencyAssistanceBenefit),
    ReturnProtection(&'a ReturnProtectionBenefit),
    TravelPerks(&'a TravelPerksBenefit),
}

/// Read-only catalog of benefit templates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateLibrary {
    rental_exclusions: HashMap<String, RentalExclusions>,
    trip_protection: HashMap<String, TripProtectionBenefit>,
    baggage: HashMap<String, BaggageBenefit>,
    purchase_protection: HashMap<String, PurchaseProtectionBenefit>,
    extended_warranty: HashMap<String, ExtendedWarrantyBenefit>,
    cell_phone: HashMap<String, CellPhoneBenefit>,
    roadside: HashMap<String, RoadsideBenefit>,
    emergency_assistance: HashMap<String, EmergencyAssistanceBenefit>,
    return_protection: HashMap<String, ReturnProtectionBenefit>,
    travel_perks: HashMap<String, TravelPerksBenefit>,
}

impl TemplateLibrary {
    /// The templates compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::load_from_json(BUILTIN_TEMPLATES)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data = fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;
        Self::load_from_json(&json_data)
    }

    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let library: Self =
            serde_json::from_str(json_data).map_err(|source| CatalogError::Parse {
                file: "benefit_templates.json",
                source,
            })?;
        tracing::info!(count = library.len(), "Loaded benefit templates");
        Ok(library)
    }

    /// Look up a template. An unknown key is `None`, never a fault.
    pub fn get_template(&self, kind: BenefitKind, key: &str) -> Option<BenefitTemplate<'_>> {
        let template = match kind {
            BenefitKind::RentalExclusions => {
                BenefitTemplate::RentalExclusions(self.rental_exclusions.get(key)?)
            }
            BenefitKind::TripProtection => {
                BenefitTemplate::TripProtection(self.trip_protection.get(key)?)
            }
            BenefitKind::Baggage => BenefitTemplate::Baggage(self.baggage.get(key)?),
            BenefitKind::PurchaseProtection => {
                BenefitTemplate::PurchaseProtection(self.purchase_protection.get(key)?)
            }
            BenefitKind::ExtendedWarranty => {
                BenefitTemplate::ExtendedWarranty(self.extended_warranty.get(key)?)
            }
            BenefitKind::CellPhone => BenefitTemplate::CellPhone(self.cell_phone.get(key)?),
            BenefitKind::Roadside => BenefitTemplate::Roadside(self.roadside.get(key)?),
            BenefitKind::EmergencyAssistance => {
                BenefitTemplate::EmergencyAssistance(self.emergency_assistance.get(key)?)
            }
            BenefitKind::ReturnProtection => {
                BenefitTemplate::ReturnProtection(self.return_protection.get(key)?)
            }
            BenefitKind::TravelPerks => BenefitTemplate::TravelPerks(self.travel_perks.get(key)?),
        };
        Some(template)
    }

    /// Sorted keys available for a kind.
    pub fn keys(&self, kind: BenefitKind) -> Vec<&str> {
        let mut keys: Vec<&str> = match kind {
            BenefitKind::RentalExclusions => key_list(&self.rental_exclusions),
            BenefitKind::TripProtection => key_list(&self.trip_protection),
            BenefitKind::Baggage => key_list(&self.baggage),
            BenefitKind::PurchaseProtection => key_list(&self.purchase_protection),
            BenefitKind::ExtendedWarranty => key_list(&self.extended_warranty),
            BenefitKind::CellPhone => key_list(&self.cell_phone),
            BenefitKind::Roadside => key_list(&self.roadside),
            BenefitKind::EmergencyAssistance => key_list(&self.emergency_assistance),
            BenefitKind::ReturnProtection => key_list(&self.return_protection),
            BenefitKind::TravelPerks => key_list(&self.travel_perks),
        };
        keys.sort_unstable();
        keys
    }

    /// Total number of templates across all kinds.
    pub fn len(&self) -> usize {
        BenefitKind::ALL.iter().map(|k| self.keys(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key_list<T>(map: &HashMap<String, T>) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

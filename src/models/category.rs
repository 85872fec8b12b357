// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coverage category taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A closed set of coverage buckets used to group and compare benefits.
///
/// Variant order is the enumeration order used for every sweep
/// (gaps, aggregation, comparison columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CategoryId {
    TravelRental,
    TravelTrip,
    TravelBaggage,
    TravelPerks,
    TravelEmergency,
    PurchaseProtection,
    ExtendedWarranty,
    ReturnProtection,
    CellPhone,
    Roadside,
    DeviceProtection,
    AutoInsurance,
    HomeInsurance,
    RentersInsurance,
    UmbrellaLiability,
}

impl CategoryId {
    pub const ALL: [CategoryId; 15] = [
        CategoryId::TravelRental,
        CategoryId::TravelTrip,
        CategoryId::TravelBaggage,
        CategoryId::TravelPerks,
        CategoryId::TravelEmergency,
        CategoryId::PurchaseProtection,
        CategoryId::ExtendedWarranty,
        CategoryId::ReturnProtection,
        CategoryId::CellPhone,
        CategoryId::Roadside,
        CategoryId::DeviceProtection,
        CategoryId::AutoInsurance,
        CategoryId::HomeInsurance,
        CategoryId::RentersInsurance,
        CategoryId::UmbrellaLiability,
    ];

    /// Wire name (kebab-case), identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryId::TravelRental => "travel-rental",
            CategoryId::TravelTrip => "travel-trip",
            CategoryId::TravelBaggage => "travel-baggage",
            CategoryId::TravelPerks => "travel-perks",
            CategoryId::TravelEmergency => "travel-emergency",
            CategoryId::PurchaseProtection => "purchase-protection",
            CategoryId::ExtendedWarranty => "extended-warranty",
            CategoryId::ReturnProtection => "return-protection",
            CategoryId::CellPhone => "cell-phone",
            CategoryId::Roadside => "roadside",
            CategoryId::DeviceProtection => "device-protection",
            CategoryId::AutoInsurance => "auto-insurance",
            CategoryId::HomeInsurance => "home-insurance",
            CategoryId::RentersInsurance => "renters-insurance",
            CategoryId::UmbrellaLiability => "umbrella-liability",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            CategoryId::TravelRental => "Rental Car",
            CategoryId::TravelTrip => "Trip Protection",
            CategoryId::TravelBaggage => "Baggage",
            CategoryId::TravelPerks => "Travel Perks",
            CategoryId::TravelEmergency => "Emergency Assistance",
            CategoryId::PurchaseProtection => "Purchase Protection",
            CategoryId::ExtendedWarranty => "Extended Warranty",
            CategoryId::ReturnProtection => "Return Protection",
            CategoryId::CellPhone => "Cell Phone Protection",
            CategoryId::Roadside => "Roadside Assistance",
            CategoryId::DeviceProtection => "Device Protection",
            CategoryId::AutoInsurance => "Auto Insurance",
            CategoryId::HomeInsurance => "Home Insurance",
            CategoryId::RentersInsurance => "Renters Insurance",
            CategoryId::UmbrellaLiability => "Umbrella Liability",
        }
    }

    /// The limit name that best summarises coverage in this category.
    ///
    /// `None` for categories without a well-known numeric headline.
    pub fn key_limit_field(self) -> Option<&'static str> {
        use crate::models::benefit::limits;
        match self {
            CategoryId::TravelRental => Some(limits::MAX_COVERAGE),
            CategoryId::TravelTrip => Some(limits::CANCELLATION_COVERAGE),
            CategoryId::TravelBaggage => Some(limits::LOST_BAGGAGE_COVERAGE),
            CategoryId::PurchaseProtection => Some(limits::MAX_PER_CLAIM),
            CategoryId::CellPhone => Some(limits::MAX_PER_CLAIM),
            CategoryId::ReturnProtection => Some(limits::MAX_PER_ITEM),
            CategoryId::DeviceProtection => Some(limits::MAX_PER_CLAIM),
            CategoryId::AutoInsurance => Some(limits::LIABILITY_LIMIT),
            CategoryId::HomeInsurance => Some(limits::DWELLING_COVERAGE),
            CategoryId::RentersInsurance => Some(limits::PERSONAL_PROPERTY_COVERAGE),
            CategoryId::UmbrellaLiability => Some(limits::LIABILITY_LIMIT),
            CategoryId::TravelPerks
            | CategoryId::TravelEmergency
            | CategoryId::ExtendedWarranty
            | CategoryId::Roadside => None,
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown coverage category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for CategoryId {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryId::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

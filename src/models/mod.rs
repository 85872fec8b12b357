// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for coverage sources and user selections.

pub mod benefit;
pub mod card;
pub mod category;
pub mod plan;
pub mod policy;
pub mod selection;
pub mod source;

pub use benefit::{BenefitDetails, CoverageLevel, LimitValue, Limits};
pub use card::{CardBenefits, CreditCardSource, RentalBenefit, RentalCoverageType};
pub use category::CategoryId;
pub use plan::{BillingCadence, PlanCost, PlanKind, PlanRef, ProtectionPlanSource};
pub use policy::{
    ExtractedPolicy, ExtractionSchema, FieldMapping, PolicyKind, PolicyOrigin, PolicySource,
    PolicyTypeDefinition, ValidationResult,
};
pub use selection::{PersistedSelection, Selection, SelectionCounts, SCHEMA_VERSION};
pub use source::{CoverageSource, SourceBase, SourceKind};

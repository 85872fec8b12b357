// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod assistant;
pub mod catalog;
pub mod coverage;
pub mod hydration;
pub mod selection;
pub mod templates;

pub use assistant::{AssistantBenefit, AssistantContext, AssistantSource};
pub use catalog::Catalog;
pub use coverage::{
    AggregatedCoverage, CategoryCoverage, CategorySources, ComparedSource, ComparisonCell,
    ComparisonMatrix, CoverageEngine, CoverageStatus, CoverageSummary,
};
pub use selection::{IdentityEvent, SelectionStore, StoreStatus, SweepReport};
pub use templates::{BenefitKind, BenefitTemplate, TemplateLibrary};

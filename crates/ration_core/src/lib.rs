//! `ration_core`: NRC requirement, supply and balance calculations.
//!
//! No IO, no logging. Reference data and ingredients come in through the
//! provider traits in [`table`] and [`ingredients`].

mod balance;
mod contribution;
mod error;
pub mod ingredients;
pub mod interpolate;
mod ration;
mod requirements;
pub mod table;
mod types;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use balance::{coverage_pct, BalanceEvaluator};
pub use contribution::{line_supply, NutrientContributionCalculator};
pub use error::CalcError;
pub use ingredients::{average_analyses, IngredientCatalog, IngredientSource};
pub use interpolate::{lookup, lookup_band, resolve};
pub use ration::RationEngine;
pub use requirements::RequirementCalculator;
pub use table::{
    BandedRows, GrowingTable, KeyedRow, KeyedRows, ReferenceSource, ReferenceTable,
    ReferenceTables,
};
pub use types::*;

//! Nutrients supplied by a ration.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::{
    AverageProfile, CalcError, ContributionTotals, IngredientId, IngredientSource,
    LineContribution, MissingAnalysis, Nutrient, NutrientSet, RationLine,
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub struct NutrientContributionCalculator<'a, I: IngredientSource + ?Sized> {
    ingredients: &'a I,
}

impl<'a, I: IngredientSource + ?Sized> NutrientContributionCalculator<'a, I> {
    pub fn new(ingredients: &'a I) -> Self {
        Self { ingredients }
    }

    /// Sums per-line supply. Lines must already be validated; an unknown
    /// ingredient is still rejected here.
    pub fn calculate(&self, lines: &[RationLine]) -> Result<ContributionTotals, CalcError> {
        let mut totals = ContributionTotals {
            supplied: NutrientSet::ZERO,
            lines: Vec::with_capacity(lines.len()),
            warnings: Vec::new(),
            reported: BTreeSet::new(),
            unreported: BTreeMap::new(),
            fed_kg: Decimal::ZERO,
            cost_total: Decimal::ZERO,
        };

        for (i, line) in lines.iter().enumerate() {
            if self.ingredients.ingredient(&line.ingredient_id).is_none() {
                return Err(CalcError::invalid(
                    format!("lines[{i}].ingredient_id"),
                    format!("unknown ingredient '{}'", line.ingredient_id),
                ));
            }
            let cost_overflow = || overflow(format!("lines[{i}].cost_per_kg"));
            let supply_overflow = || overflow(format!("lines[{i}].quantity_kg"));
            let cost = line
                .quantity_kg
                .checked_mul(line.cost_per_kg.unwrap_or(Decimal::ZERO))
                .ok_or_else(cost_overflow)?;
            totals.cost_total = totals.cost_total.checked_add(cost).ok_or_else(cost_overflow)?;
            totals.fed_kg = totals
                .fed_kg
                .checked_add(line.quantity_kg)
                .ok_or_else(supply_overflow)?;

            let supplied = match self.ingredients.average_profile(&line.ingredient_id) {
                Some(avg) => {
                    let (set, reported) =
                        line_supply(line.quantity_kg, &avg).ok_or_else(supply_overflow)?;
                    totals.supplied = totals
                        .supplied
                        .checked_add(&set)
                        .ok_or_else(supply_overflow)?;
                    record_reporting(&mut totals, &line.ingredient_id, &reported);
                    Some(set)
                }
                None => {
                    totals.warnings.push(MissingAnalysis {
                        line_index: i,
                        ingredient_id: line.ingredient_id.clone(),
                    });
                    None
                }
            };

            totals.lines.push(LineContribution {
                ingredient_id: line.ingredient_id.clone(),
                quantity_kg: line.quantity_kg,
                supplied,
                cost,
            });
        }
        Ok(totals)
    }
}

fn overflow(field: String) -> CalcError {
    CalcError::invalid(field, "supply exceeds the representable range")
}

fn record_reporting(totals: &mut ContributionTotals, id: &IngredientId, reported: &[Nutrient]) {
    for nutrient in Nutrient::ALL {
        if reported.contains(&nutrient) {
            totals.reported.insert(nutrient);
        } else {
            totals.unreported.entry(nutrient).or_default().push(id.clone());
        }
    }
}

/// Supply of one line and the nutrients its analyses actually report, or
/// `None` if a product overflows.
///
/// Dry matter is `quantity * dm% / 100`. Percentage nutrients are a share of
/// that dry matter; energies are Mcal per kg of it.
pub fn line_supply(
    quantity_kg: Decimal,
    avg: &AverageProfile,
) -> Option<(NutrientSet, Vec<Nutrient>)> {
    let dm = quantity_kg.checked_mul(avg.dry_matter_pct)? / HUNDRED;
    let mut set = NutrientSet {
        dry_matter_kg: dm,
        protein_total_kg: dm.checked_mul(avg.crude_protein_pct)? / HUNDRED,
        ..NutrientSet::ZERO
    };
    let mut reported = vec![Nutrient::DryMatter, Nutrient::ProteinTotal];

    let pct = [
        (Nutrient::ProteinDigestible, avg.digestible_protein_pct),
        (Nutrient::Tdn, avg.tdn_pct),
        (Nutrient::Calcium, avg.calcium_pct),
        (Nutrient::Phosphorus, avg.phosphorus_pct),
    ];
    for (nutrient, value) in pct {
        if let Some(p) = value {
            *set.get_mut(nutrient) = dm.checked_mul(p)? / HUNDRED;
            reported.push(nutrient);
        }
    }

    let energy = [
        (Nutrient::NetEnergy, avg.net_energy_lactation_mcal_kg),
        (Nutrient::DigestibleEnergy, avg.digestible_energy_mcal_kg),
        (Nutrient::MetabolizableEnergy, avg.metabolizable_energy_mcal_kg),
    ];
    for (nutrient, value) in energy {
        if let Some(mcal) = value {
            *set.get_mut(nutrient) = dm.checked_mul(mcal)?;
            reported.push(nutrient);
        }
    }

    Some((set, reported))
}

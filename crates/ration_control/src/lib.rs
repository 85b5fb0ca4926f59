use ration_core::{
    Constants, IngredientCatalog, IngredientCategory, IngredientId, IngredientProfile,
    IngredientSource, RationLine,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub trait LineSource {
    fn propose_lines(
        &mut self,
        catalog: &IngredientCatalog,
        constants: &Constants,
        total_kg: Decimal,
    ) -> Vec<RationLine>;
}

/// Splits a ration mass across one ingredient per category:
/// 1. Forage gets `forage_share_pct`.
/// 2. Concentrate gets `concentrate_share_pct`.
/// 3. Mineral gets `mineral_share_pct`.
///
/// The candidate for each category is the first available ingredient, by id,
/// with an active analysis. A category without a candidate gives its share to
/// the others in proportion. This is a starting point, not an optimiser.
pub struct FixedShareFormulator;

/// One category's slot in a fixed-share plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub category: IngredientCategory,
    /// `None` when the catalog has no usable ingredient for the category.
    pub ingredient_id: Option<IngredientId>,
    pub nominal_share_pct: Decimal,
    pub share_pct: Decimal,
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn candidate<'a>(
    catalog: &'a IngredientCatalog,
    category: IngredientCategory,
) -> Option<&'a IngredientProfile> {
    let mut usable: Vec<&IngredientProfile> = catalog
        .profiles()
        .iter()
        .filter(|p| {
            p.category == category && p.available && catalog.average_profile(&p.id).is_some()
        })
        .collect();
    usable.sort_by(|a, b| a.id.cmp(&b.id));
    usable.first().copied()
}

impl FixedShareFormulator {
    /// Category slots with their nominal and redistributed shares. The
    /// redistributed shares of filled slots sum to exactly 100.
    pub fn allocations(catalog: &IngredientCatalog, constants: &Constants) -> Vec<Allocation> {
        let nominal = [
            (IngredientCategory::Forage, constants.forage_share_pct),
            (IngredientCategory::Concentrate, constants.concentrate_share_pct),
            (IngredientCategory::Mineral, constants.mineral_share_pct),
        ];
        let mut slots: Vec<Allocation> = nominal
            .into_iter()
            .map(|(category, share)| Allocation {
                category,
                ingredient_id: candidate(catalog, category).map(|p| p.id.clone()),
                nominal_share_pct: share,
                share_pct: Decimal::ZERO,
            })
            .collect();

        let filled_total: Decimal = slots
            .iter()
            .filter(|s| s.ingredient_id.is_some())
            .map(|s| s.nominal_share_pct)
            .sum();
        if filled_total <= Decimal::ZERO {
            return slots;
        }

        let last_filled = slots.iter().rposition(|s| s.ingredient_id.is_some());
        let mut assigned = Decimal::ZERO;
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.ingredient_id.is_none() {
                continue;
            }
            // Last filled slot absorbs rounding so the plan sums to 100.
            slot.share_pct = if Some(i) == last_filled {
                Decimal::ONE_HUNDRED - assigned
            } else {
                (slot.nominal_share_pct / filled_total * Decimal::ONE_HUNDRED).round_dp(2)
            };
            assigned += slot.share_pct;
        }
        slots
    }
}

impl LineSource for FixedShareFormulator {
    fn propose_lines(
        &mut self,
        catalog: &IngredientCatalog,
        constants: &Constants,
        total_kg: Decimal,
    ) -> Vec<RationLine> {
        if total_kg <= Decimal::ZERO {
            return Vec::new();
        }
        Self::allocations(catalog, constants)
            .into_iter()
            .filter_map(|slot| {
                let ingredient_id = slot.ingredient_id?;
                Some(RationLine {
                    ingredient_id,
                    quantity_kg: (total_kg * slot.share_pct / Decimal::ONE_HUNDRED).round_dp(3),
                    percentage: slot.share_pct,
                    cost_per_kg: None,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ration_core::test_fixtures::{analysis, base_constants, profile, sample_catalog};
    use rust_decimal_macros::dec;

    #[test]
    fn full_catalog_uses_nominal_shares() {
        let lines = FixedShareFormulator.propose_lines(&sample_catalog(), &base_constants(), dec!(20));
        let summary: Vec<(&str, Decimal, Decimal)> = lines
            .iter()
            .map(|l| (l.ingredient_id.0.as_str(), l.quantity_kg, l.percentage))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("alfalfa_hay", dec!(12), dec!(60)),
                ("corn", dec!(7), dec!(35)),
                ("mineral_premix", dec!(1), dec!(5)),
            ]
        );
    }

    #[test]
    fn missing_mineral_share_is_redistributed() {
        let catalog = IngredientCatalog::new(vec![
            profile(
                "hay",
                IngredientCategory::Forage,
                vec![analysis("h1", dec!(85), dec!(10))],
            ),
            profile(
                "corn",
                IngredientCategory::Concentrate,
                vec![analysis("c1", dec!(88), dec!(9))],
            ),
            profile("salt", IngredientCategory::Mineral, vec![]),
        ]);
        let lines = FixedShareFormulator.propose_lines(&catalog, &base_constants(), dec!(20));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].percentage, dec!(63.16));
        assert_eq!(lines[1].percentage, dec!(36.84));
        let sum: Decimal = lines.iter().map(|l| l.percentage).sum();
        assert_eq!(sum, dec!(100));
    }

    #[test]
    fn picks_lowest_id_among_usable_candidates() {
        let mut unavailable = profile(
            "a_silage",
            IngredientCategory::Forage,
            vec![analysis("s1", dec!(35), dec!(8))],
        );
        unavailable.available = false;
        let catalog = IngredientCatalog::new(vec![
            profile(
                "z_hay",
                IngredientCategory::Forage,
                vec![analysis("h1", dec!(85), dec!(10))],
            ),
            unavailable,
            profile(
                "m_straw",
                IngredientCategory::Forage,
                vec![analysis("w1", dec!(90), dec!(4))],
            ),
        ]);
        let slots = FixedShareFormulator::allocations(&catalog, &base_constants());
        assert_eq!(slots[0].ingredient_id, Some(IngredientId("m_straw".into())));
        assert_eq!(slots[0].share_pct, dec!(100));
        assert_eq!(slots[1].ingredient_id, None);
    }

    #[test]
    fn empty_catalog_or_zero_mass_proposes_nothing() {
        let constants = base_constants();
        assert!(FixedShareFormulator
            .propose_lines(&IngredientCatalog::default(), &constants, dec!(20))
            .is_empty());
        assert!(FixedShareFormulator
            .propose_lines(&sample_catalog(), &constants, Decimal::ZERO)
            .is_empty());
    }
}

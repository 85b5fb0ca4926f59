//! Ingredient catalog and laboratory-analysis averaging.

use ahash::AHashMap;
use rust_decimal::Decimal;

use crate::{AverageProfile, IngredientId, IngredientProfile, NutrientAnalysis};

/// Read access to ingredient profiles.
pub trait IngredientSource {
    fn ingredient(&self, id: &IngredientId) -> Option<&IngredientProfile>;

    /// Mean of the ingredient's active analyses; `None` when it has none.
    fn average_profile(&self, id: &IngredientId) -> Option<AverageProfile> {
        self.ingredient(id).and_then(average_analyses)
    }
}

/// In-memory catalog. Profiles keep their load order; lookups go through an index.
#[derive(Debug, Clone, Default)]
pub struct IngredientCatalog {
    profiles: Vec<IngredientProfile>,
    index: AHashMap<IngredientId, usize>,
}

impl IngredientCatalog {
    /// Later profiles with an already-seen id replace the earlier one.
    pub fn new(profiles: Vec<IngredientProfile>) -> Self {
        let mut catalog = Self::default();
        for profile in profiles {
            catalog.insert(profile);
        }
        catalog
    }

    pub fn insert(&mut self, profile: IngredientProfile) {
        if let Some(&i) = self.index.get(&profile.id) {
            self.profiles[i] = profile;
        } else {
            self.index.insert(profile.id.clone(), self.profiles.len());
            self.profiles.push(profile);
        }
    }

    pub fn profiles(&self) -> &[IngredientProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl IngredientSource for IngredientCatalog {
    fn ingredient(&self, id: &IngredientId) -> Option<&IngredientProfile> {
        self.index.get(id).map(|&i| &self.profiles[i])
    }
}

/// Averages the active analyses of a profile.
///
/// Required fields average over every active analysis. Each optional field
/// averages over the analyses that report it and stays `None` otherwise.
pub fn average_analyses(profile: &IngredientProfile) -> Option<AverageProfile> {
    let active: Vec<&NutrientAnalysis> = profile.analyses.iter().filter(|a| a.active).collect();
    if active.is_empty() {
        return None;
    }
    let count = Decimal::from(active.len());
    let required = |f: fn(&NutrientAnalysis) -> Decimal| -> Decimal {
        active.iter().map(|a| f(a)).sum::<Decimal>() / count
    };
    let optional = |f: fn(&NutrientAnalysis) -> Option<Decimal>| -> Option<Decimal> {
        let values: Vec<Decimal> = active.iter().filter_map(|a| f(a)).collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<Decimal>() / Decimal::from(values.len()))
    };

    Some(AverageProfile {
        analyses_count: active.len(),
        dry_matter_pct: required(|a| a.dry_matter_pct),
        crude_protein_pct: required(|a| a.crude_protein_pct),
        digestible_protein_pct: optional(|a| a.digestible_protein_pct),
        ash_pct: optional(|a| a.ash_pct),
        ether_extract_pct: optional(|a| a.ether_extract_pct),
        ndf_pct: optional(|a| a.ndf_pct),
        adf_pct: optional(|a| a.adf_pct),
        tdn_pct: optional(|a| a.tdn_pct),
        calcium_pct: optional(|a| a.calcium_pct),
        phosphorus_pct: optional(|a| a.phosphorus_pct),
        digestible_energy_mcal_kg: optional(|a| a.digestible_energy_mcal_kg),
        metabolizable_energy_mcal_kg: optional(|a| a.metabolizable_energy_mcal_kg),
        net_energy_lactation_mcal_kg: optional(|a| a.net_energy_lactation_mcal_kg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{analysis, profile};
    use crate::IngredientCategory;
    use rust_decimal_macros::dec;

    #[test]
    fn averages_only_active_analyses() {
        let mut withdrawn = analysis("b3", dec!(50), dec!(30));
        withdrawn.active = false;
        let corn = profile(
            "corn",
            IngredientCategory::Concentrate,
            vec![
                analysis("b1", dec!(88), dec!(8)),
                analysis("b2", dec!(88), dec!(10)),
                withdrawn,
            ],
        );
        let avg = average_analyses(&corn).unwrap();
        assert_eq!(avg.analyses_count, 2);
        assert_eq!(avg.dry_matter_pct, dec!(88));
        assert_eq!(avg.crude_protein_pct, dec!(9));
    }

    #[test]
    fn optional_fields_average_over_reporters_only() {
        let mut with_ca = analysis("b1", dec!(90), dec!(12));
        with_ca.calcium_pct = Some(dec!(0.4));
        let corn = profile(
            "bran",
            IngredientCategory::Concentrate,
            vec![with_ca, analysis("b2", dec!(90), dec!(14))],
        );
        let avg = average_analyses(&corn).unwrap();
        assert_eq!(avg.calcium_pct, Some(dec!(0.4)));
        assert_eq!(avg.phosphorus_pct, None);
    }

    #[test]
    fn no_active_analysis_has_no_average() {
        let empty = profile("salt", IngredientCategory::Mineral, vec![]);
        assert!(average_analyses(&empty).is_none());
    }

    #[test]
    fn catalog_lookup_and_replace() {
        let mut catalog = IngredientCatalog::new(vec![
            profile("hay", IngredientCategory::Forage, vec![]),
            profile("corn", IngredientCategory::Concentrate, vec![]),
        ]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.average_profile(&IngredientId("hay".into())).is_none());

        catalog.insert(profile(
            "hay",
            IngredientCategory::Forage,
            vec![analysis("b1", dec!(85), dec!(9))],
        ));
        assert_eq!(catalog.len(), 2);
        let avg = catalog.average_profile(&IngredientId("hay".into())).unwrap();
        assert_eq!(avg.crude_protein_pct, dec!(9));
        assert!(catalog.ingredient(&IngredientId("oats".into())).is_none());
    }
}

//! Shared test fixtures for ration_core and downstream crates.
//!
//! `base_constants()` mirrors the seeded `content/constants.json`.
//! `sample_tables()` is a small NRC-shaped table set with round numbers so
//! expected values can be worked out by hand.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{
    Constants, GestationRow, GrowingRow, GrowingTable, IngredientCatalog, IngredientCategory,
    IngredientId, IngredientProfile, MaintenanceRow, NutrientAnalysis, NutrientSet, ProductionRow,
    RationLine, ReferenceTable, ReferenceTables,
};

pub fn base_constants() -> Constants {
    Constants {
        deficient_below_pct: dec!(90),
        excess_above_pct: dec!(120),
        fair_max_deficiencies: 2,
        gestation_threshold_days: 210,
        percentage_sum_tolerance: dec!(0.1),
        max_body_weight_kg: dec!(1000),
        max_milk_yield_kg: dec!(80),
        max_fat_pct: dec!(10),
        max_gestation_days: 285,
        max_daily_gain_kg: dec!(3),
        max_line_quantity_kg: dec!(200),
        forage_share_pct: dec!(60),
        concentrate_share_pct: dec!(35),
        mineral_share_pct: dec!(5),
        default_ration_kg: dec!(20),
    }
}

/// A nutrient set with every field set to `value`.
pub fn uniform(value: Decimal) -> NutrientSet {
    NutrientSet::ZERO.zip_with(&NutrientSet::ZERO, |_, _| value)
}

fn maintenance(weight: Decimal, dm: Decimal, scale: Decimal) -> MaintenanceRow {
    MaintenanceRow {
        weight_kg: weight,
        nutrients: NutrientSet {
            dry_matter_kg: dm,
            ..uniform(scale)
        },
    }
}

fn production(fat: Decimal, protein: Decimal) -> ProductionRow {
    ProductionRow {
        fat_pct: fat,
        nutrients: NutrientSet {
            dry_matter_kg: Decimal::ZERO,
            protein_total_kg: protein,
            protein_digestible_kg: protein * dec!(0.6),
            net_energy_mcal: dec!(0.7),
            digestible_energy_mcal: dec!(1.4),
            metabolizable_energy_mcal: dec!(1.2),
            tdn_kg: dec!(0.3),
            calcium_kg: dec!(0.003),
            phosphorus_kg: dec!(0.002),
        },
    }
}

fn gestation(weight: Decimal, calcium: Decimal) -> GestationRow {
    GestationRow {
        weight_kg: weight,
        nutrients: NutrientSet {
            dry_matter_kg: dec!(2),
            protein_total_kg: dec!(0.35),
            protein_digestible_kg: dec!(0.2),
            net_energy_mcal: dec!(2.5),
            digestible_energy_mcal: dec!(4.6),
            metabolizable_energy_mcal: dec!(3.8),
            tdn_kg: dec!(1.0),
            calcium_kg: calcium,
            phosphorus_kg: dec!(0.009),
        },
    }
}

pub fn growing_row(
    weight: (Decimal, Decimal),
    gain: (Decimal, Decimal),
    crude_protein_g: Decimal,
) -> GrowingRow {
    GrowingRow {
        weight_min_kg: weight.0,
        weight_max_kg: weight.1,
        gain_min_kg: gain.0,
        gain_max_kg: gain.1,
        crude_protein_g,
        digestible_protein_g: crude_protein_g * dec!(0.6),
        metabolizable_energy_mcal: dec!(18),
        calcium_g: dec!(30),
        phosphorus_g: dec!(20),
        dry_matter_kg: dec!(8),
    }
}

/// Maintenance 400/500 kg, production 3.5/4.0 % fat, gestation 400/500 kg,
/// and two growing bands at 300–350 kg.
pub fn sample_tables() -> ReferenceTables {
    ReferenceTables {
        maintenance: ReferenceTable::new(vec![
            maintenance(dec!(400), dec!(8.0), dec!(0.5)),
            maintenance(dec!(500), dec!(9.5), dec!(0.6)),
        ])
        .expect("unique maintenance keys"),
        production: ReferenceTable::new(vec![
            production(dec!(3.5), dec!(0.090)),
            production(dec!(4.0), dec!(0.095)),
        ])
        .expect("unique production keys"),
        gestation: ReferenceTable::new(vec![
            gestation(dec!(400), dec!(0.013)),
            gestation(dec!(500), dec!(0.015)),
        ])
        .expect("unique gestation keys"),
        growing: GrowingTable::new(vec![
            growing_row((dec!(300), dec!(350)), (dec!(0.8), dec!(1.2)), dec!(850)),
            growing_row((dec!(300), dec!(350)), (dec!(1.2), dec!(1.5)), dec!(950)),
        ]),
    }
}

pub fn analysis(batch: &str, dry_matter_pct: Decimal, crude_protein_pct: Decimal) -> NutrientAnalysis {
    NutrientAnalysis {
        batch_id: batch.to_string(),
        active: true,
        dry_matter_pct,
        crude_protein_pct,
        digestible_protein_pct: None,
        ash_pct: None,
        ether_extract_pct: None,
        ndf_pct: None,
        adf_pct: None,
        tdn_pct: None,
        calcium_pct: None,
        phosphorus_pct: None,
        digestible_energy_mcal_kg: None,
        metabolizable_energy_mcal_kg: None,
        net_energy_lactation_mcal_kg: None,
    }
}

/// An analysis reporting every optional field.
pub fn full_analysis(batch: &str, dry_matter_pct: Decimal, crude_protein_pct: Decimal) -> NutrientAnalysis {
    NutrientAnalysis {
        digestible_protein_pct: Some(crude_protein_pct * dec!(0.7)),
        ash_pct: Some(dec!(2)),
        ether_extract_pct: Some(dec!(3)),
        ndf_pct: Some(dec!(20)),
        adf_pct: Some(dec!(5)),
        tdn_pct: Some(dec!(80)),
        calcium_pct: Some(dec!(0.5)),
        phosphorus_pct: Some(dec!(0.3)),
        digestible_energy_mcal_kg: Some(dec!(3.5)),
        metabolizable_energy_mcal_kg: Some(dec!(3.0)),
        net_energy_lactation_mcal_kg: Some(dec!(1.8)),
        ..analysis(batch, dry_matter_pct, crude_protein_pct)
    }
}

pub fn profile(id: &str, category: IngredientCategory, analyses: Vec<NutrientAnalysis>) -> IngredientProfile {
    IngredientProfile {
        id: IngredientId(id.to_string()),
        name: id.to_string(),
        category,
        available: true,
        analyses,
    }
}

/// corn (two analyses, CP 8 and 10), alfalfa hay, a mineral premix, and an
/// unanalysed supplement.
pub fn sample_catalog() -> IngredientCatalog {
    IngredientCatalog::new(vec![
        profile(
            "corn",
            IngredientCategory::Concentrate,
            vec![analysis("c1", dec!(88), dec!(8)), analysis("c2", dec!(88), dec!(10))],
        ),
        profile(
            "alfalfa_hay",
            IngredientCategory::Forage,
            vec![full_analysis("a1", dec!(90), dec!(18))],
        ),
        profile(
            "mineral_premix",
            IngredientCategory::Mineral,
            vec![NutrientAnalysis {
                calcium_pct: Some(dec!(20)),
                phosphorus_pct: Some(dec!(10)),
                ..analysis("m1", dec!(98), dec!(0))
            }],
        ),
        profile("urea_block", IngredientCategory::Supplement, vec![]),
    ])
}

pub fn line(id: &str, quantity_kg: Decimal, percentage: Decimal) -> RationLine {
    RationLine {
        ingredient_id: IngredientId(id.to_string()),
        quantity_kg,
        percentage,
        cost_per_kg: None,
    }
}

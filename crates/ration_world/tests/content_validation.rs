//! Validation tests for the seeded `content/*.json` data.
//!
//! These load the real content directory and check:
//! 1. Schema validity: every file deserializes and builds its table
//! 2. Coverage: the tables span the weights and fat levels a dairy herd needs
//! 3. Shape: requirements grow with body weight and milk fat
//! 4. Catalog: every category the formulator draws from has a usable ingredient

use ration_core::{
    IngredientCategory, IngredientSource, KeyedRows, RequirementCalculator, TableKind,
};
use ration_world::{load_content, RationContent};
use rust_decimal_macros::dec;
use std::sync::OnceLock;

fn content_dir() -> String {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    format!("{manifest}/../../content")
}

fn load_test_content() -> &'static RationContent {
    static CONTENT: OnceLock<RationContent> = OnceLock::new();
    CONTENT.get_or_init(|| {
        load_content(&content_dir()).expect("load_content should succeed for seeded content")
    })
}

// =========================================================================
// 1. Schema
// =========================================================================

#[test]
fn content_loads_successfully() {
    let content = load_test_content();
    assert!(!content.content_version.is_empty());
    for (kind, n) in content.tables.row_counts() {
        assert!(n > 0, "table {kind} is empty");
    }
}

// =========================================================================
// 2. Coverage
// =========================================================================

#[test]
fn maintenance_spans_typical_dairy_weights() {
    let (lo, hi) = load_test_content().tables.maintenance.key_range().unwrap();
    assert!(lo <= dec!(400), "lightest maintenance row {lo}");
    assert!(hi >= dec!(700), "heaviest maintenance row {hi}");
}

#[test]
fn production_spans_common_fat_levels() {
    let (lo, hi) = load_test_content().tables.production.key_range().unwrap();
    assert!(lo <= dec!(3.0));
    assert!(hi >= dec!(5.0));
}

#[test]
fn growing_bands_cover_300_to_350_at_one_kg() {
    let content = load_test_content();
    let (row, _) = content
        .tables
        .lookup(TableKind::Growing, dec!(320), Some(dec!(1.0)))
        .unwrap();
    let ration_core::ReferenceRow::Growing(row) = row else {
        panic!("expected a growing row");
    };
    assert_eq!(row.crude_protein_g, dec!(850));
}

#[test]
fn seeded_growing_bands_do_not_overlap() {
    assert!(load_test_content()
        .tables
        .growing
        .overlapping_pairs()
        .is_empty());
}

// =========================================================================
// 3. Shape
// =========================================================================

#[test]
fn maintenance_energy_rises_with_weight() {
    let rows = load_test_content().tables.maintenance.rows();
    for pair in rows.windows(2) {
        assert!(
            pair[1].nutrients.net_energy_mcal > pair[0].nutrients.net_energy_mcal,
            "NEl does not rise between {} and {} kg",
            pair[0].weight_kg,
            pair[1].weight_kg
        );
    }
}

#[test]
fn production_protein_rises_with_fat() {
    let table = &load_test_content().tables.production;
    let low = table.find_exact(dec!(3.0)).unwrap();
    let high = table.find_exact(dec!(5.0)).unwrap();
    assert!(high.nutrients.protein_total_kg > low.nutrients.protein_total_kg);
}

#[test]
fn typical_cow_requirements_are_plausible() {
    let content = load_test_content();
    let req = RequirementCalculator::new(&content.tables, &content.constants)
        .calculate_lactation(dec!(600), dec!(30), dec!(3.8), 230)
        .unwrap();
    assert!(req.gestation_applied);
    assert!(req.totals.dry_matter_kg > dec!(10) && req.totals.dry_matter_kg < dec!(30));
    assert!(req.totals.net_energy_mcal > dec!(25) && req.totals.net_energy_mcal < dec!(45));
}

// =========================================================================
// 4. Catalog
// =========================================================================

#[test]
fn formulator_categories_have_usable_ingredients() {
    let content = load_test_content();
    for category in [
        IngredientCategory::Forage,
        IngredientCategory::Concentrate,
        IngredientCategory::Mineral,
    ] {
        let usable = content.ingredients.profiles().iter().any(|p| {
            p.category == category
                && p.available
                && content.ingredients.average_profile(&p.id).is_some()
        });
        assert!(usable, "no usable {category:?} ingredient");
    }
}

#[test]
fn ingredient_ids_are_non_empty_and_named() {
    for profile in load_test_content().ingredients.profiles() {
        assert!(!profile.id.0.is_empty());
        assert!(!profile.name.is_empty(), "ingredient '{}' has no name", profile.id);
    }
}

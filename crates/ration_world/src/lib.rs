//! Content loading shared between ration_cli and ration_daemon.

mod overrides;

pub use overrides::{apply_overrides, load_overrides};

use anyhow::{bail, Context, Result};
use ration_core::{
    Constants, GestationRow, GrowingRow, GrowingTable, IngredientCatalog, IngredientProfile,
    KeyedRow, MaintenanceRow, NutrientAnalysis, NutrientSet, ProductionRow, ReferenceTable,
    ReferenceTables,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Everything the engine needs, loaded from a content directory.
#[derive(Debug, Clone)]
pub struct RationContent {
    pub content_version: String,
    pub tables: ReferenceTables,
    pub ingredients: IngredientCatalog,
    pub constants: Constants,
}

#[derive(Deserialize)]
struct MaintenanceFile {
    content_version: String,
    rows: Vec<MaintenanceRow>,
}

#[derive(Deserialize)]
struct RowsFile<R> {
    rows: Vec<R>,
}

#[derive(Deserialize)]
struct IngredientsFile {
    ingredients: Vec<IngredientProfile>,
}

fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let text =
        std::fs::read_to_string(dir.join(name)).with_context(|| format!("reading {name}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {name}"))
}

pub fn load_content(content_dir: &str) -> Result<RationContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = read_json(dir, "constants.json")?;
    let maintenance: MaintenanceFile = read_json(dir, "maintenance.json")?;
    let production: RowsFile<ProductionRow> = read_json(dir, "production.json")?;
    let gestation: RowsFile<GestationRow> = read_json(dir, "gestation.json")?;
    let growing: RowsFile<GrowingRow> = read_json(dir, "growing.json")?;
    let ingredients: IngredientsFile = read_json(dir, "ingredients.json")?;

    validate_keyed_rows(&maintenance.rows)?;
    validate_keyed_rows(&production.rows)?;
    validate_keyed_rows(&gestation.rows)?;
    validate_growing_rows(&growing.rows)?;
    validate_ingredients(&ingredients.ingredients)?;
    validate_constants(&constants)?;

    let tables = ReferenceTables {
        maintenance: ReferenceTable::new(maintenance.rows).context("building maintenance table")?,
        production: ReferenceTable::new(production.rows).context("building production table")?,
        gestation: ReferenceTable::new(gestation.rows).context("building gestation table")?,
        growing: GrowingTable::new(growing.rows),
    };
    let content = RationContent {
        content_version: maintenance.content_version,
        tables,
        ingredients: IngredientCatalog::new(ingredients.ingredients),
        constants,
    };
    validate_content(&content);

    let counts: Vec<String> = content
        .tables
        .row_counts()
        .iter()
        .map(|(kind, n)| format!("{kind}={n}"))
        .collect();
    tracing::info!(
        version = %content.content_version,
        tables = %counts.join(" "),
        ingredients = content.ingredients.len(),
        "content loaded"
    );
    Ok(content)
}

/// Logs data-quality issues the engine tolerates: overlapping growing bands,
/// empty tables and ingredients no ration line could draw nutrients from.
pub fn validate_content(content: &RationContent) {
    for (kind, n) in content.tables.row_counts() {
        if n == 0 {
            tracing::warn!(table = %kind, "reference table is empty; lookups will fail");
        }
    }

    let rows = content.tables.growing.rows();
    for (i, j) in content.tables.growing.overlapping_pairs() {
        tracing::warn!(
            first = i,
            second = j,
            "growing bands overlap ({}–{} kg, {}–{} kg/d) and ({}–{} kg, {}–{} kg/d); first match wins",
            rows[i].weight_min_kg,
            rows[i].weight_max_kg,
            rows[i].gain_min_kg,
            rows[i].gain_max_kg,
            rows[j].weight_min_kg,
            rows[j].weight_max_kg,
            rows[j].gain_min_kg,
            rows[j].gain_max_kg,
        );
    }

    for profile in content.ingredients.profiles() {
        if !profile.analyses.iter().any(|a| a.active) {
            tracing::warn!(ingredient = %profile.id, "ingredient has no active analysis");
        }
    }
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

fn check_nutrients(nutrients: &NutrientSet, what: &str) -> Result<()> {
    for (nutrient, value) in nutrients.iter() {
        if value < Decimal::ZERO {
            bail!("{what}: {nutrient} must not be negative, got {value}");
        }
    }
    Ok(())
}

trait NutrientRow: KeyedRow {
    fn nutrients(&self) -> &NutrientSet;
}

impl NutrientRow for MaintenanceRow {
    fn nutrients(&self) -> &NutrientSet {
        &self.nutrients
    }
}

impl NutrientRow for ProductionRow {
    fn nutrients(&self) -> &NutrientSet {
        &self.nutrients
    }
}

impl NutrientRow for GestationRow {
    fn nutrients(&self) -> &NutrientSet {
        &self.nutrients
    }
}

fn validate_keyed_rows<R: NutrientRow>(rows: &[R]) -> Result<()> {
    for row in rows {
        let what = format!("{} row {}", R::TABLE, row.key());
        if row.key() <= Decimal::ZERO {
            bail!("{what}: key must be positive");
        }
        check_nutrients(row.nutrients(), &what)?;
    }
    Ok(())
}

fn validate_growing_rows(rows: &[GrowingRow]) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        let what = format!("growing row {i}");
        if row.weight_min_kg > row.weight_max_kg {
            bail!(
                "{what}: weight band {}–{} is inverted",
                row.weight_min_kg,
                row.weight_max_kg
            );
        }
        if row.gain_min_kg > row.gain_max_kg {
            bail!(
                "{what}: gain band {}–{} is inverted",
                row.gain_min_kg,
                row.gain_max_kg
            );
        }
        if row.weight_min_kg < Decimal::ZERO || row.gain_min_kg < Decimal::ZERO {
            bail!("{what}: band bounds must not be negative");
        }
        check_nutrients(&row.as_nutrient_set(), &what)?;
    }
    Ok(())
}

fn percentages(analysis: &NutrientAnalysis) -> [(&'static str, Option<Decimal>); 10] {
    [
        ("dry_matter_pct", Some(analysis.dry_matter_pct)),
        ("crude_protein_pct", Some(analysis.crude_protein_pct)),
        ("digestible_protein_pct", analysis.digestible_protein_pct),
        ("ash_pct", analysis.ash_pct),
        ("ether_extract_pct", analysis.ether_extract_pct),
        ("ndf_pct", analysis.ndf_pct),
        ("adf_pct", analysis.adf_pct),
        ("tdn_pct", analysis.tdn_pct),
        ("calcium_pct", analysis.calcium_pct),
        ("phosphorus_pct", analysis.phosphorus_pct),
    ]
}

fn validate_ingredients(profiles: &[IngredientProfile]) -> Result<()> {
    let mut seen = HashSet::new();
    for profile in profiles {
        if profile.id.0.is_empty() {
            bail!("ingredient '{}' has an empty id", profile.name);
        }
        if !seen.insert(&profile.id) {
            bail!("duplicate ingredient id '{}'", profile.id);
        }
        for analysis in &profile.analyses {
            for (field, value) in percentages(analysis) {
                if let Some(v) = value.filter(|v| *v < Decimal::ZERO || *v > Decimal::ONE_HUNDRED) {
                    bail!(
                        "ingredient '{}' analysis '{}': {field} must be within 0–100, got {v}",
                        profile.id,
                        analysis.batch_id
                    );
                }
            }
            let energies = [
                analysis.digestible_energy_mcal_kg,
                analysis.metabolizable_energy_mcal_kg,
                analysis.net_energy_lactation_mcal_kg,
            ];
            if energies.iter().flatten().any(|e| *e < Decimal::ZERO) {
                bail!(
                    "ingredient '{}' analysis '{}': energy density must not be negative",
                    profile.id,
                    analysis.batch_id
                );
            }
        }
    }
    Ok(())
}

fn validate_constants(c: &Constants) -> Result<()> {
    if c.deficient_below_pct >= c.excess_above_pct {
        bail!(
            "constants: deficient_below_pct ({}) must be below excess_above_pct ({})",
            c.deficient_below_pct,
            c.excess_above_pct
        );
    }
    let shares = c.forage_share_pct + c.concentrate_share_pct + c.mineral_share_pct;
    if shares != Decimal::ONE_HUNDRED {
        bail!("constants: formulation shares must sum to 100, got {shares}");
    }
    let limits = [
        ("max_body_weight_kg", c.max_body_weight_kg),
        ("max_milk_yield_kg", c.max_milk_yield_kg),
        ("max_fat_pct", c.max_fat_pct),
        ("max_daily_gain_kg", c.max_daily_gain_kg),
        ("max_line_quantity_kg", c.max_line_quantity_kg),
        ("default_ration_kg", c.default_ration_kg),
    ];
    for (name, value) in limits {
        if value <= Decimal::ZERO {
            bail!("constants: {name} must be positive, got {value}");
        }
    }
    if c.percentage_sum_tolerance < Decimal::ZERO {
        bail!("constants: percentage_sum_tolerance must not be negative");
    }
    Ok(())
}

/// Loads content and applies the overrides file, if any.
pub fn load_content_with_overrides(
    content_dir: &str,
    overrides_path: Option<&str>,
) -> Result<RationContent> {
    let mut content = load_content(content_dir)?;
    if let Some(path) = overrides_path {
        let overrides = load_overrides(path)?;
        apply_overrides(&mut content.constants, &overrides)?;
        validate_constants(&content.constants).context("constants after overrides")?;
        tracing::info!(path, keys = overrides.len(), "constant overrides applied");
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ration_core::test_fixtures::base_constants;
    use rust_decimal_macros::dec;
    use std::fs;

    fn write_content(dir: &Path) {
        let constants = serde_json::to_string(&base_constants()).unwrap();
        fs::write(dir.join("constants.json"), constants).unwrap();
        fs::write(
            dir.join("maintenance.json"),
            r#"{"content_version":"test","rows":[
                {"weight_kg":500,"nutrients":{"dry_matter_kg":9.5,"protein_total_kg":0.364,"protein_digestible_kg":0.22,
                 "net_energy_mcal":8.46,"digestible_energy_mcal":16.32,"metabolizable_energy_mcal":14.2,
                 "tdn_kg":3.7,"calcium_kg":0.02,"phosphorus_kg":0.014}},
                {"weight_kg":400,"nutrients":{"dry_matter_kg":8,"protein_total_kg":0.318,"protein_digestible_kg":0.19,
                 "net_energy_mcal":7.16,"digestible_energy_mcal":13.8,"metabolizable_energy_mcal":12.01,
                 "tdn_kg":3.13,"calcium_kg":0.016,"phosphorus_kg":0.011}}
            ]}"#,
        )
        .unwrap();
        fs::write(dir.join("production.json"), r#"{"rows":[]}"#).unwrap();
        fs::write(dir.join("gestation.json"), r#"{"rows":[]}"#).unwrap();
        fs::write(
            dir.join("growing.json"),
            r#"{"rows":[
                {"weight_min_kg":300,"weight_max_kg":350,"gain_min_kg":0.8,"gain_max_kg":1.2,
                 "crude_protein_g":850,"digestible_protein_g":550,"metabolizable_energy_mcal":17,
                 "calcium_g":28,"phosphorus_g":19,"dry_matter_kg":7.5}
            ]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("ingredients.json"),
            r#"{"ingredients":[
                {"id":"corn","name":"Corn","category":"Concentrate","analyses":[
                    {"batch_id":"c1","dry_matter_pct":88,"crude_protein_pct":9}
                ]}
            ]}"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_a_minimal_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path());
        let content = load_content(dir.path().to_str().unwrap()).unwrap();

        assert_eq!(content.content_version, "test");
        assert_eq!(content.tables.maintenance.key_range(), Some((dec!(400), dec!(500))));
        assert!(content.tables.production.is_empty());
        assert_eq!(content.ingredients.len(), 1);
        assert!(content.ingredients.profiles()[0].available);
        assert!(content.ingredients.profiles()[0].analyses[0].active);
    }

    #[test]
    fn missing_file_names_it() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path());
        fs::remove_file(dir.path().join("growing.json")).unwrap();
        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("reading growing.json"));
    }

    #[test]
    fn duplicate_maintenance_weight_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path());
        fs::write(
            dir.path().join("gestation.json"),
            r#"{"rows":[
                {"weight_kg":500,"nutrients":{"dry_matter_kg":2,"protein_total_kg":0.6,"protein_digestible_kg":0.3,
                 "net_energy_mcal":2.5,"digestible_energy_mcal":4.9,"metabolizable_energy_mcal":4.3,
                 "tdn_kg":1.1,"calcium_kg":0.012,"phosphorus_kg":0.006}},
                {"weight_kg":500,"nutrients":{"dry_matter_kg":2,"protein_total_kg":0.6,"protein_digestible_kg":0.3,
                 "net_energy_mcal":2.5,"digestible_energy_mcal":4.9,"metabolizable_energy_mcal":4.3,
                 "tdn_kg":1.1,"calcium_kg":0.012,"phosphorus_kg":0.006}}
            ]}"#,
        )
        .unwrap();
        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("building gestation table"), "{msg}");
        assert!(msg.contains("duplicate key 500"), "{msg}");
    }

    #[test]
    fn inverted_band_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path());
        fs::write(
            dir.path().join("growing.json"),
            r#"{"rows":[
                {"weight_min_kg":350,"weight_max_kg":300,"gain_min_kg":0.8,"gain_max_kg":1.2,
                 "crude_protein_g":850,"digestible_protein_g":550,"metabolizable_energy_mcal":17,
                 "calcium_g":28,"phosphorus_g":19,"dry_matter_kg":7.5}
            ]}"#,
        )
        .unwrap();
        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("weight band 350–300 is inverted"));
    }

    #[test]
    fn analysis_percentage_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path());
        fs::write(
            dir.path().join("ingredients.json"),
            r#"{"ingredients":[
                {"id":"corn","name":"Corn","category":"Concentrate","analyses":[
                    {"batch_id":"c1","dry_matter_pct":188,"crude_protein_pct":9}
                ]}
            ]}"#,
        )
        .unwrap();
        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("dry_matter_pct must be within 0–100"));
    }

    #[test]
    fn duplicate_ingredient_id_is_rejected() {
        let profiles: Vec<IngredientProfile> = serde_json::from_str(
            r#"[
                {"id":"corn","name":"Corn","category":"Concentrate"},
                {"id":"corn","name":"Corn again","category":"Concentrate"}
            ]"#,
        )
        .unwrap();
        let err = validate_ingredients(&profiles).unwrap_err();
        assert!(err.to_string().contains("duplicate ingredient id 'corn'"));
    }

    #[test]
    fn constants_sanity() {
        let mut c = base_constants();
        validate_constants(&c).unwrap();

        c.mineral_share_pct = dec!(10);
        assert!(validate_constants(&c).is_err());

        let mut c = base_constants();
        c.deficient_below_pct = dec!(130);
        assert!(validate_constants(&c).is_err());
    }

    #[test]
    fn overrides_file_is_applied_and_checked() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path());
        let overrides = dir.path().join("overrides.json");
        fs::write(&overrides, r#"{"deficient_below_pct": 85}"#).unwrap();
        let content = load_content_with_overrides(
            dir.path().to_str().unwrap(),
            Some(overrides.to_str().unwrap()),
        )
        .unwrap();
        assert_eq!(content.constants.deficient_below_pct, dec!(85));

        fs::write(&overrides, r#"{"excess_above_pct": 80}"#).unwrap();
        assert!(load_content_with_overrides(
            dir.path().to_str().unwrap(),
            Some(overrides.to_str().unwrap()),
        )
        .is_err());
    }
}

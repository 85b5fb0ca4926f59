use anyhow::{anyhow, bail, Context, Result};
use ration_core::Constants;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

const VALID_KEYS: &[&str] = &[
    "deficient_below_pct",
    "excess_above_pct",
    "fair_max_deficiencies",
    "gestation_threshold_days",
    "percentage_sum_tolerance",
    "max_body_weight_kg",
    "max_milk_yield_kg",
    "max_fat_pct",
    "max_gestation_days",
    "max_daily_gain_kg",
    "max_line_quantity_kg",
    "forage_share_pct",
    "concentrate_share_pct",
    "mineral_share_pct",
    "default_ration_kg",
];

/// Reads a flat JSON object of constant overrides.
pub fn load_overrides(path: &str) -> Result<HashMap<String, serde_json::Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

pub fn apply_overrides(
    constants: &mut Constants,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    for (key, value) in overrides {
        match key.as_str() {
            "deficient_below_pct" => constants.deficient_below_pct = as_decimal(key, value)?,
            "excess_above_pct" => constants.excess_above_pct = as_decimal(key, value)?,
            "fair_max_deficiencies" => {
                constants.fair_max_deficiencies = as_usize(key, value)?;
            }
            "gestation_threshold_days" => {
                constants.gestation_threshold_days = as_u32(key, value)?;
            }
            "percentage_sum_tolerance" => {
                constants.percentage_sum_tolerance = as_decimal(key, value)?;
            }
            "max_body_weight_kg" => constants.max_body_weight_kg = as_decimal(key, value)?,
            "max_milk_yield_kg" => constants.max_milk_yield_kg = as_decimal(key, value)?,
            "max_fat_pct" => constants.max_fat_pct = as_decimal(key, value)?,
            "max_gestation_days" => constants.max_gestation_days = as_u32(key, value)?,
            "max_daily_gain_kg" => constants.max_daily_gain_kg = as_decimal(key, value)?,
            "max_line_quantity_kg" => {
                constants.max_line_quantity_kg = as_decimal(key, value)?;
            }
            "forage_share_pct" => constants.forage_share_pct = as_decimal(key, value)?,
            "concentrate_share_pct" => {
                constants.concentrate_share_pct = as_decimal(key, value)?;
            }
            "mineral_share_pct" => constants.mineral_share_pct = as_decimal(key, value)?,
            "default_ration_kg" => constants.default_ration_kg = as_decimal(key, value)?,
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    Ok(())
}

/// Numbers go through their JSON text so `0.1` stays exactly `0.1`.
fn as_decimal(key: &str, value: &serde_json::Value) -> Result<Decimal> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => bail!("override '{key}': expected a number, got {value}"),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| anyhow!("override '{key}': expected a number, got {value}"))
}

fn as_u64(key: &str, value: &serde_json::Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| anyhow!("override '{key}': expected a positive integer, got {value}"))
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = as_u64(key, value)?;
    u32::try_from(val).map_err(|_| anyhow!("override '{key}': value {val} exceeds u32 range"))
}

fn as_usize(key: &str, value: &serde_json::Value) -> Result<usize> {
    let val = as_u64(key, value)?;
    usize::try_from(val).map_err(|_| anyhow!("override '{key}': value {val} exceeds usize range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_constants() -> Constants {
        serde_json::from_str(include_str!("../../../content/constants.json")).unwrap()
    }

    #[test]
    fn decimal_override_keeps_exact_value() {
        let mut constants = default_constants();
        let overrides = HashMap::from([(
            "percentage_sum_tolerance".to_string(),
            serde_json::json!(0.2),
        )]);
        apply_overrides(&mut constants, &overrides).unwrap();
        assert_eq!(constants.percentage_sum_tolerance, dec!(0.2));
    }

    #[test]
    fn decimal_override_accepts_strings() {
        let mut constants = default_constants();
        let overrides = HashMap::from([(
            "excess_above_pct".to_string(),
            serde_json::json!("115.5"),
        )]);
        apply_overrides(&mut constants, &overrides).unwrap();
        assert_eq!(constants.excess_above_pct, dec!(115.5));
    }

    #[test]
    fn integer_overrides() {
        let mut constants = default_constants();
        let overrides = HashMap::from([
            ("gestation_threshold_days".to_string(), serde_json::json!(200)),
            ("fair_max_deficiencies".to_string(), serde_json::json!(1)),
        ]);
        apply_overrides(&mut constants, &overrides).unwrap();
        assert_eq!(constants.gestation_threshold_days, 200);
        assert_eq!(constants.fair_max_deficiencies, 1);
    }

    #[test]
    fn line_quantity_cap_override() {
        let mut constants = default_constants();
        assert_eq!(constants.max_line_quantity_kg, dec!(200));
        let overrides = HashMap::from([(
            "max_line_quantity_kg".to_string(),
            serde_json::json!(150),
        )]);
        apply_overrides(&mut constants, &overrides).unwrap();
        assert_eq!(constants.max_line_quantity_kg, dec!(150));
    }

    #[test]
    fn unknown_key_errors() {
        let mut constants = default_constants();
        let overrides = HashMap::from([("nonexistent_field".to_string(), serde_json::json!(1.0))]);
        let err = apply_overrides(&mut constants, &overrides)
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown override key"));
        assert!(err.contains("nonexistent_field"));
    }

    #[test]
    fn type_mismatch_errors() {
        let mut constants = default_constants();
        let overrides = HashMap::from([(
            "max_gestation_days".to_string(),
            serde_json::json!("not_a_number"),
        )]);
        assert!(apply_overrides(&mut constants, &overrides).is_err());

        let overrides = HashMap::from([("max_fat_pct".to_string(), serde_json::json!([1]))]);
        assert!(apply_overrides(&mut constants, &overrides).is_err());
    }
}

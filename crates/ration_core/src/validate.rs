//! Input checks run before any table lookup.

use rust_decimal::Decimal;

use crate::{CalcError, Constants, GrowingParams, LactationParams, RationLine};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn positive_at_most(field: &str, value: Decimal, max: Decimal) -> Result<(), CalcError> {
    if value <= Decimal::ZERO {
        return Err(CalcError::invalid(field, format!("must be greater than 0, got {value}")));
    }
    if value > max {
        return Err(CalcError::invalid(field, format!("must be at most {max}, got {value}")));
    }
    Ok(())
}

pub fn validate_lactation(params: &LactationParams, constants: &Constants) -> Result<(), CalcError> {
    positive_at_most("weight_kg", params.weight_kg, constants.max_body_weight_kg)?;
    // A dry cow has no milk yield.
    if params.milk_yield_kg < Decimal::ZERO || params.milk_yield_kg > constants.max_milk_yield_kg {
        return Err(CalcError::invalid(
            "milk_yield_kg",
            format!(
                "must be between 0 and {}, got {}",
                constants.max_milk_yield_kg, params.milk_yield_kg
            ),
        ));
    }
    positive_at_most("fat_pct", params.fat_pct, constants.max_fat_pct)?;
    if params.gestation_days > constants.max_gestation_days {
        return Err(CalcError::invalid(
            "gestation_days",
            format!(
                "must be at most {}, got {}",
                constants.max_gestation_days, params.gestation_days
            ),
        ));
    }
    Ok(())
}

pub fn validate_growing(params: &GrowingParams, constants: &Constants) -> Result<(), CalcError> {
    positive_at_most("weight_kg", params.weight_kg, constants.max_body_weight_kg)?;
    if let Some(gain) = params.target_daily_gain_kg {
        positive_at_most("target_daily_gain_kg", gain, constants.max_daily_gain_kg)?;
    }
    Ok(())
}

/// Per-line bounds, then the sum of percentages against 100. An empty ration
/// skips the sum check.
pub fn validate_lines(lines: &[RationLine], constants: &Constants) -> Result<(), CalcError> {
    for (i, line) in lines.iter().enumerate() {
        if line.quantity_kg < Decimal::ZERO || line.quantity_kg > constants.max_line_quantity_kg {
            return Err(CalcError::invalid(
                format!("lines[{i}].quantity_kg"),
                format!(
                    "must be between 0 and {}, got {}",
                    constants.max_line_quantity_kg, line.quantity_kg
                ),
            ));
        }
        if line.percentage < Decimal::ZERO || line.percentage > HUNDRED {
            return Err(CalcError::invalid(
                format!("lines[{i}].percentage"),
                format!("must be between 0 and 100, got {}", line.percentage),
            ));
        }
        if let Some(cost) = line.cost_per_kg.filter(|c| *c < Decimal::ZERO) {
            return Err(CalcError::invalid(
                format!("lines[{i}].cost_per_kg"),
                format!("must not be negative, got {cost}"),
            ));
        }
    }

    if lines.is_empty() {
        return Ok(());
    }
    let sum: Decimal = lines.iter().map(|l| l.percentage).sum();
    if (sum - HUNDRED).abs() > constants.percentage_sum_tolerance {
        return Err(CalcError::invalid(
            "lines.percentage",
            format!(
                "percentages must sum to 100 (±{}), got {sum}",
                constants.percentage_sum_tolerance
            ),
        ));
    }
    Ok(())
}

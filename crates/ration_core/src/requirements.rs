//! Daily nutrient requirements from the NRC tables.
//!
//! Lactation order of operations:
//! 1. Validate inputs against `Constants` limits.
//! 2. Maintenance row for body weight.
//! 3. Production row for milk fat, scaled by milk yield.
//! 4. Gestation row for body weight, only from `gestation_threshold_days` on.
//! 5. Sum the three components.

use rust_decimal::Decimal;

use crate::interpolate::{lookup, lookup_band};
use crate::validate::{validate_growing, validate_lactation};
use crate::{
    CalcError, Constants, GrowingParams, GrowingRow, LactationParams, LactationRequirements,
    NutrientSet, ReferenceSource,
};

pub struct RequirementCalculator<'a, S: ReferenceSource + ?Sized> {
    tables: &'a S,
    constants: &'a Constants,
}

impl<'a, S: ReferenceSource + ?Sized> RequirementCalculator<'a, S> {
    pub fn new(tables: &'a S, constants: &'a Constants) -> Self {
        Self { tables, constants }
    }

    pub fn calculate_lactation(
        &self,
        weight_kg: Decimal,
        milk_yield_kg: Decimal,
        fat_pct: Decimal,
        gestation_days: u32,
    ) -> Result<LactationRequirements, CalcError> {
        self.lactation(LactationParams {
            weight_kg,
            milk_yield_kg,
            fat_pct,
            gestation_days,
        })
    }

    pub fn lactation(&self, params: LactationParams) -> Result<LactationRequirements, CalcError> {
        validate_lactation(&params, self.constants)?;

        let base = lookup(self.tables.maintenance(), params.weight_kg)?.nutrients;
        let production = lookup(self.tables.production(), params.fat_pct)?.nutrients
            * params.milk_yield_kg;

        let gestation_applied = params.gestation_days >= self.constants.gestation_threshold_days;
        let gestation = if gestation_applied {
            lookup(self.tables.gestation(), params.weight_kg)?.nutrients
        } else {
            NutrientSet::ZERO
        };

        Ok(LactationRequirements {
            params,
            base,
            production,
            gestation,
            gestation_applied,
            totals: base + production + gestation,
        })
    }

    pub fn calculate_growing(
        &self,
        weight_kg: Decimal,
        target_daily_gain_kg: Option<Decimal>,
    ) -> Result<GrowingRow, CalcError> {
        self.growing(GrowingParams {
            weight_kg,
            target_daily_gain_kg,
        })
    }

    pub fn growing(&self, params: GrowingParams) -> Result<GrowingRow, CalcError> {
        validate_growing(&params, self.constants)?;
        lookup_band(
            self.tables.growing(),
            params.weight_kg,
            params.target_daily_gain_kg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_constants, sample_tables};
    use crate::{GrowingTable, ReferenceTables, TableKind};
    use rust_decimal_macros::dec;

    #[test]
    fn totals_are_sum_of_components() {
        let tables = sample_tables();
        let constants = base_constants();
        let calc = RequirementCalculator::new(&tables, &constants);
        let req = calc
            .calculate_lactation(dec!(450), dec!(20), dec!(3.5), 240)
            .unwrap();

        assert!(req.gestation_applied);
        assert_eq!(req.totals, req.base + req.production + req.gestation);
        assert_eq!(req.base.dry_matter_kg, dec!(8.75));
        assert_eq!(req.production.protein_total_kg, dec!(1.8));
    }

    #[test]
    fn gestation_below_threshold_is_zero() {
        let tables = sample_tables();
        let constants = base_constants();
        let calc = RequirementCalculator::new(&tables, &constants);

        let early = calc
            .calculate_lactation(dec!(500), dec!(20), dec!(3.5), 209)
            .unwrap();
        assert!(!early.gestation_applied);
        assert_eq!(early.gestation, NutrientSet::ZERO);
        assert_eq!(early.totals, early.base + early.production);

        let late = calc
            .calculate_lactation(dec!(500), dec!(20), dec!(3.5), 210)
            .unwrap();
        assert_eq!(late.gestation.calcium_kg, dec!(0.015));
        assert_eq!(
            late.totals.calcium_kg,
            early.totals.calcium_kg + dec!(0.015)
        );
    }

    #[test]
    fn dry_cow_has_no_production_component() {
        let tables = sample_tables();
        let constants = base_constants();
        let calc = RequirementCalculator::new(&tables, &constants);
        let req = calc
            .calculate_lactation(dec!(500), dec!(0), dec!(4.0), 0)
            .unwrap();
        assert_eq!(req.production, NutrientSet::ZERO);
        assert_eq!(req.totals, req.base);
    }

    #[test]
    fn missing_table_propagates_with_its_name() {
        let tables = ReferenceTables {
            production: crate::ReferenceTable::default(),
            ..sample_tables()
        };
        let constants = base_constants();
        let calc = RequirementCalculator::new(&tables, &constants);
        let err = calc
            .calculate_lactation(dec!(450), dec!(20), dec!(3.5), 0)
            .unwrap_err();
        assert_eq!(
            err,
            CalcError::ReferenceDataMissing {
                table: TableKind::Production
            }
        );
    }

    #[test]
    fn gestation_table_only_needed_when_applied() {
        let tables = ReferenceTables {
            gestation: crate::ReferenceTable::default(),
            ..sample_tables()
        };
        let constants = base_constants();
        let calc = RequirementCalculator::new(&tables, &constants);
        calc.calculate_lactation(dec!(450), dec!(20), dec!(3.5), 100)
            .unwrap();
        assert!(calc
            .calculate_lactation(dec!(450), dec!(20), dec!(3.5), 250)
            .is_err());
    }

    #[test]
    fn growing_band_match_and_miss() {
        let tables = sample_tables();
        let constants = base_constants();
        let calc = RequirementCalculator::new(&tables, &constants);

        let row = calc.calculate_growing(dec!(320), Some(dec!(1.0))).unwrap();
        assert_eq!(row.crude_protein_g, dec!(850));

        let err = calc.calculate_growing(dec!(320), Some(dec!(2.0))).unwrap_err();
        assert!(matches!(err, CalcError::OutOfRange { .. }));

        let empty = ReferenceTables {
            growing: GrowingTable::default(),
            ..sample_tables()
        };
        let calc = RequirementCalculator::new(&empty, &constants);
        assert_eq!(
            calc.calculate_growing(dec!(320), None).unwrap_err(),
            CalcError::ReferenceDataMissing {
                table: TableKind::Growing
            }
        );
    }

    #[test]
    fn invalid_input_short_circuits_lookups() {
        let empty = ReferenceTables::default();
        let constants = base_constants();
        let calc = RequirementCalculator::new(&empty, &constants);
        let err = calc
            .calculate_lactation(dec!(-5), dec!(20), dec!(3.5), 0)
            .unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "weight_kg"));
    }
}

//! End-to-end ration evaluation: requirements, supply and balance in one record.

use crate::validate::validate_lines;
use crate::{
    AnimalId, BalanceEvaluator, CalcError, Constants, ContributionTotals, GrowingParams,
    IngredientSource, LactationParams, NutrientContributionCalculator, RationLine,
    RationRecord, RationRequirements, ReferenceSource, RequirementCalculator,
};

pub struct RationEngine<'a, S: ReferenceSource + ?Sized, I: IngredientSource + ?Sized> {
    tables: &'a S,
    ingredients: &'a I,
    constants: &'a Constants,
}

impl<'a, S, I> RationEngine<'a, S, I>
where
    S: ReferenceSource + ?Sized,
    I: IngredientSource + ?Sized,
{
    pub fn new(tables: &'a S, ingredients: &'a I, constants: &'a Constants) -> Self {
        Self {
            tables,
            ingredients,
            constants,
        }
    }

    pub fn requirements(&self) -> RequirementCalculator<'a, S> {
        RequirementCalculator::new(self.tables, self.constants)
    }

    /// Validates the lines, then sums their supply.
    pub fn contributions(&self, lines: &[RationLine]) -> Result<ContributionTotals, CalcError> {
        validate_lines(lines, self.constants)?;
        NutrientContributionCalculator::new(self.ingredients).calculate(lines)
    }

    /// A ration without lines records requirements only.
    pub fn lactation_ration(
        &self,
        animal_id: Option<AnimalId>,
        params: LactationParams,
        lines: Vec<RationLine>,
    ) -> Result<RationRecord, CalcError> {
        let requirements = self.requirements().lactation(params)?;
        let (contributions, balance) = if lines.is_empty() {
            (None, None)
        } else {
            let totals = self.contributions(&lines)?;
            let report = BalanceEvaluator::new(self.constants).evaluate(&requirements, &totals);
            (Some(totals), Some(report))
        };
        Ok(RationRecord {
            animal_id,
            requirements: RationRequirements::Lactation(Box::new(requirements)),
            lines,
            contributions,
            balance,
        })
    }

    pub fn growing_ration(
        &self,
        animal_id: Option<AnimalId>,
        params: GrowingParams,
        lines: Vec<RationLine>,
    ) -> Result<RationRecord, CalcError> {
        let row = self.requirements().growing(params)?;
        let (contributions, balance) = if lines.is_empty() {
            (None, None)
        } else {
            let totals = self.contributions(&lines)?;
            let report = BalanceEvaluator::new(self.constants).evaluate_growing(&row, &totals);
            (Some(totals), Some(report))
        };
        Ok(RationRecord {
            animal_id,
            requirements: RationRequirements::Growing { params, row },
            lines,
            contributions,
            balance,
        })
    }
}

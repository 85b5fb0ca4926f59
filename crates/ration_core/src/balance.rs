//! Requirement vs. supply comparison.

use rust_decimal::Decimal;

use crate::{
    Advice, BalanceReport, BalanceStatus, Constants, ContributionTotals, GrowingRow,
    LactationRequirements, Nutrient, NutrientBalance, NutrientSet, Rating,
};

pub struct BalanceEvaluator<'a> {
    constants: &'a Constants,
}

impl<'a> BalanceEvaluator<'a> {
    pub fn new(constants: &'a Constants) -> Self {
        Self { constants }
    }

    /// Compares every nutrient of the lactation totals.
    pub fn evaluate(
        &self,
        requirements: &LactationRequirements,
        contributions: &ContributionTotals,
    ) -> BalanceReport {
        self.compare(&requirements.totals, contributions, &Nutrient::ALL)
    }

    /// Compares the nutrients the growing table carries.
    pub fn evaluate_growing(
        &self,
        row: &GrowingRow,
        contributions: &ContributionTotals,
    ) -> BalanceReport {
        self.compare(&row.as_nutrient_set(), contributions, &GrowingRow::NUTRIENTS)
    }

    fn compare(
        &self,
        required: &NutrientSet,
        contributions: &ContributionTotals,
        nutrients: &[Nutrient],
    ) -> BalanceReport {
        let balances: Vec<NutrientBalance> = nutrients
            .iter()
            .map(|&n| self.nutrient_balance(n, required.get(n), contributions))
            .collect();

        let deficient_count = balances
            .iter()
            .filter(|b| b.status == BalanceStatus::Deficient)
            .count();
        let excess_count = balances
            .iter()
            .filter(|b| b.status == BalanceStatus::Excess)
            .count();
        let lower_bound = balances.iter().any(|b| b.lower_bound);

        BalanceReport {
            nutrients: balances,
            deficient_count,
            excess_count,
            rating: self.rate(deficient_count),
            lower_bound,
        }
    }

    fn nutrient_balance(
        &self,
        nutrient: Nutrient,
        required: Decimal,
        contributions: &ContributionTotals,
    ) -> NutrientBalance {
        let supplied = contributions.supplied.get(nutrient);
        let coverage_pct = coverage_pct(supplied, required);
        let status = if required <= Decimal::ZERO {
            BalanceStatus::NoRequirement
        } else if !contributions.has_data(nutrient) {
            BalanceStatus::NoData
        } else {
            self.classify(coverage_pct)
        };
        NutrientBalance {
            nutrient,
            required,
            supplied,
            difference: supplied - required,
            coverage_pct,
            status,
            lower_bound: contributions.is_lower_bound(nutrient),
        }
    }

    pub fn classify(&self, coverage_pct: Decimal) -> BalanceStatus {
        if coverage_pct < self.constants.deficient_below_pct {
            BalanceStatus::Deficient
        } else if coverage_pct > self.constants.excess_above_pct {
            BalanceStatus::Excess
        } else {
            BalanceStatus::Adequate
        }
    }

    pub fn rate(&self, deficient_count: usize) -> Rating {
        if deficient_count > self.constants.fair_max_deficiencies {
            Rating::Poor
        } else if deficient_count > 0 {
            Rating::Fair
        } else {
            Rating::Good
        }
    }
}

/// `supplied / required * 100`, or 0 when nothing is required. Saturates at
/// `Decimal::MAX` when the ratio is not representable.
pub fn coverage_pct(supplied: Decimal, required: Decimal) -> Decimal {
    if required <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    supplied
        .checked_div(required)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
}

impl BalanceReport {
    /// Deficit alerts followed by excess recommendations, in nutrient order.
    pub fn advice(&self) -> Vec<Advice> {
        let deficits = self
            .nutrients
            .iter()
            .filter(|b| b.status == BalanceStatus::Deficient)
            .map(|b| Advice::Deficit {
                nutrient: b.nutrient,
                coverage_pct: b.coverage_pct,
            });
        let excesses = self
            .nutrients
            .iter()
            .filter(|b| b.status == BalanceStatus::Excess)
            .map(|b| Advice::Excess {
                nutrient: b.nutrient,
                coverage_pct: b.coverage_pct,
            });
        deficits.chain(excesses).collect()
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<&NutrientBalance> {
        self.nutrients.iter().find(|b| b.nutrient == nutrient)
    }
}

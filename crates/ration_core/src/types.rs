//! Type definitions for `ration_core`.
//!
//! Reference rows, ingredient profiles, ration lines, computed totals and the
//! policy constants that drive classification.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(IngredientId);
string_id!(AnimalId);

// ---------------------------------------------------------------------------
// Nutrients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    DryMatter,
    ProteinTotal,
    ProteinDigestible,
    NetEnergy,
    DigestibleEnergy,
    MetabolizableEnergy,
    Tdn,
    Calcium,
    Phosphorus,
}

impl Nutrient {
    pub const ALL: [Nutrient; 9] = [
        Nutrient::DryMatter,
        Nutrient::ProteinTotal,
        Nutrient::ProteinDigestible,
        Nutrient::NetEnergy,
        Nutrient::DigestibleEnergy,
        Nutrient::MetabolizableEnergy,
        Nutrient::Tdn,
        Nutrient::Calcium,
        Nutrient::Phosphorus,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Nutrient::DryMatter => "dry matter",
            Nutrient::ProteinTotal => "total protein",
            Nutrient::ProteinDigestible => "digestible protein",
            Nutrient::NetEnergy => "net energy",
            Nutrient::DigestibleEnergy => "digestible energy",
            Nutrient::MetabolizableEnergy => "metabolizable energy",
            Nutrient::Tdn => "TDN",
            Nutrient::Calcium => "calcium",
            Nutrient::Phosphorus => "phosphorus",
        }
    }

    /// Unit of the daily amount: Mcal for energies, kg for everything else.
    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::NetEnergy | Nutrient::DigestibleEnergy | Nutrient::MetabolizableEnergy => {
                "Mcal"
            }
            _ => "kg",
        }
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Daily nutrient amounts. Masses in kg, energies in Mcal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NutrientSet {
    pub dry_matter_kg: Decimal,
    pub protein_total_kg: Decimal,
    pub protein_digestible_kg: Decimal,
    pub net_energy_mcal: Decimal,
    pub digestible_energy_mcal: Decimal,
    pub metabolizable_energy_mcal: Decimal,
    pub tdn_kg: Decimal,
    pub calcium_kg: Decimal,
    pub phosphorus_kg: Decimal,
}

impl NutrientSet {
    pub const ZERO: NutrientSet = NutrientSet {
        dry_matter_kg: Decimal::ZERO,
        protein_total_kg: Decimal::ZERO,
        protein_digestible_kg: Decimal::ZERO,
        net_energy_mcal: Decimal::ZERO,
        digestible_energy_mcal: Decimal::ZERO,
        metabolizable_energy_mcal: Decimal::ZERO,
        tdn_kg: Decimal::ZERO,
        calcium_kg: Decimal::ZERO,
        phosphorus_kg: Decimal::ZERO,
    };

    pub fn get(&self, nutrient: Nutrient) -> Decimal {
        match nutrient {
            Nutrient::DryMatter => self.dry_matter_kg,
            Nutrient::ProteinTotal => self.protein_total_kg,
            Nutrient::ProteinDigestible => self.protein_digestible_kg,
            Nutrient::NetEnergy => self.net_energy_mcal,
            Nutrient::DigestibleEnergy => self.digestible_energy_mcal,
            Nutrient::MetabolizableEnergy => self.metabolizable_energy_mcal,
            Nutrient::Tdn => self.tdn_kg,
            Nutrient::Calcium => self.calcium_kg,
            Nutrient::Phosphorus => self.phosphorus_kg,
        }
    }

    pub fn get_mut(&mut self, nutrient: Nutrient) -> &mut Decimal {
        match nutrient {
            Nutrient::DryMatter => &mut self.dry_matter_kg,
            Nutrient::ProteinTotal => &mut self.protein_total_kg,
            Nutrient::ProteinDigestible => &mut self.protein_digestible_kg,
            Nutrient::NetEnergy => &mut self.net_energy_mcal,
            Nutrient::DigestibleEnergy => &mut self.digestible_energy_mcal,
            Nutrient::MetabolizableEnergy => &mut self.metabolizable_energy_mcal,
            Nutrient::Tdn => &mut self.tdn_kg,
            Nutrient::Calcium => &mut self.calcium_kg,
            Nutrient::Phosphorus => &mut self.phosphorus_kg,
        }
    }

    /// Applies `f` to every field pair, building a new set.
    pub fn zip_with(&self, other: &NutrientSet, f: impl Fn(Decimal, Decimal) -> Decimal) -> Self {
        let mut out = NutrientSet::ZERO;
        for nutrient in Nutrient::ALL {
            *out.get_mut(nutrient) = f(self.get(nutrient), other.get(nutrient));
        }
        out
    }

    /// Field-wise sum, `None` if any field overflows.
    pub fn checked_add(&self, other: &NutrientSet) -> Option<Self> {
        let mut out = NutrientSet::ZERO;
        for nutrient in Nutrient::ALL {
            *out.get_mut(nutrient) = self.get(nutrient).checked_add(other.get(nutrient))?;
        }
        Some(out)
    }

    /// Linear interpolation: `self + factor * (upper - self)` per field.
    pub fn lerp(&self, upper: &NutrientSet, factor: Decimal) -> Self {
        self.zip_with(upper, |lo, hi| lo + factor * (hi - lo))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, Decimal)> + '_ {
        Nutrient::ALL.into_iter().map(|n| (n, self.get(n)))
    }
}

impl Add for NutrientSet {
    type Output = NutrientSet;

    fn add(self, rhs: NutrientSet) -> NutrientSet {
        self.zip_with(&rhs, |a, b| a + b)
    }
}

impl Mul<Decimal> for NutrientSet {
    type Output = NutrientSet;

    fn mul(self, factor: Decimal) -> NutrientSet {
        self.zip_with(&NutrientSet::ZERO, |a, _| a * factor)
    }
}

// ---------------------------------------------------------------------------
// Reference rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Maintenance,
    Production,
    Gestation,
    Growing,
}

impl TableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TableKind::Maintenance => "maintenance",
            TableKind::Production => "production",
            TableKind::Gestation => "gestation",
            TableKind::Growing => "growing",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maintenance" => Ok(TableKind::Maintenance),
            "production" => Ok(TableKind::Production),
            "gestation" => Ok(TableKind::Gestation),
            "growing" | "ceba" => Ok(TableKind::Growing),
            other => Err(format!("unknown reference table '{other}'")),
        }
    }
}

/// Maintenance requirement of a lactating cow, per animal per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRow {
    pub weight_kg: Decimal,
    pub nutrients: NutrientSet,
}

/// Requirement per kg of milk at a given fat percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRow {
    pub fat_pct: Decimal,
    pub nutrients: NutrientSet,
}

/// Additional requirement during the last ~75 days of gestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestationRow {
    pub weight_kg: Decimal,
    pub nutrients: NutrientSet,
}

/// Growing/finishing (ceba) requirement for a weight band and daily-gain band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowingRow {
    pub weight_min_kg: Decimal,
    pub weight_max_kg: Decimal,
    pub gain_min_kg: Decimal,
    pub gain_max_kg: Decimal,
    pub crude_protein_g: Decimal,
    pub digestible_protein_g: Decimal,
    pub metabolizable_energy_mcal: Decimal,
    pub calcium_g: Decimal,
    pub phosphorus_g: Decimal,
    pub dry_matter_kg: Decimal,
}

impl GrowingRow {
    /// Nutrients this table carries; the rest are not part of a growing balance.
    pub const NUTRIENTS: [Nutrient; 6] = [
        Nutrient::DryMatter,
        Nutrient::ProteinTotal,
        Nutrient::ProteinDigestible,
        Nutrient::MetabolizableEnergy,
        Nutrient::Calcium,
        Nutrient::Phosphorus,
    ];

    pub fn contains_weight(&self, weight_kg: Decimal) -> bool {
        self.weight_min_kg <= weight_kg && weight_kg <= self.weight_max_kg
    }

    pub fn contains_gain(&self, gain_kg: Decimal) -> bool {
        self.gain_min_kg <= gain_kg && gain_kg <= self.gain_max_kg
    }

    /// Bands that only share an edge do not overlap; first match settles the edge.
    pub fn overlaps(&self, other: &GrowingRow) -> bool {
        self.weight_min_kg < other.weight_max_kg
            && other.weight_min_kg < self.weight_max_kg
            && self.gain_min_kg < other.gain_max_kg
            && other.gain_min_kg < self.gain_max_kg
    }

    /// Converts gram columns to kg. Fields outside `NUTRIENTS` stay zero.
    pub fn as_nutrient_set(&self) -> NutrientSet {
        let grams = Decimal::ONE_THOUSAND;
        NutrientSet {
            dry_matter_kg: self.dry_matter_kg,
            protein_total_kg: self.crude_protein_g / grams,
            protein_digestible_kg: self.digestible_protein_g / grams,
            metabolizable_energy_mcal: self.metabolizable_energy_mcal,
            calcium_kg: self.calcium_g / grams,
            phosphorus_kg: self.phosphorus_g / grams,
            ..NutrientSet::ZERO
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ReferenceRow {
    Maintenance(MaintenanceRow),
    Production(ProductionRow),
    Gestation(GestationRow),
    Growing(GrowingRow),
}

/// How a keyed lookup produced its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Exact,
    Interpolated { lower_key: Decimal, upper_key: Decimal },
    /// Query below the smallest key; the smallest row was returned.
    ClampedLow,
    /// Query above the largest key; the largest row was returned.
    ClampedHigh,
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngredientCategory {
    Forage,
    Concentrate,
    Supplement,
    Mineral,
}

/// One laboratory analysis of an ingredient. Percentages are on a dry-matter
/// basis except `dry_matter_pct` itself; energies are Mcal per kg of dry matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutrientAnalysis {
    pub batch_id: String,
    /// Analyses from a withdrawn lab batch are kept but not averaged.
    #[serde(default = "default_true")]
    pub active: bool,
    pub dry_matter_pct: Decimal,
    pub crude_protein_pct: Decimal,
    #[serde(default)]
    pub digestible_protein_pct: Option<Decimal>,
    #[serde(default)]
    pub ash_pct: Option<Decimal>,
    #[serde(default)]
    pub ether_extract_pct: Option<Decimal>,
    #[serde(default)]
    pub ndf_pct: Option<Decimal>,
    #[serde(default)]
    pub adf_pct: Option<Decimal>,
    #[serde(default)]
    pub tdn_pct: Option<Decimal>,
    #[serde(default)]
    pub calcium_pct: Option<Decimal>,
    #[serde(default)]
    pub phosphorus_pct: Option<Decimal>,
    #[serde(default)]
    pub digestible_energy_mcal_kg: Option<Decimal>,
    #[serde(default)]
    pub metabolizable_energy_mcal_kg: Option<Decimal>,
    #[serde(default)]
    pub net_energy_lactation_mcal_kg: Option<Decimal>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientProfile {
    pub id: IngredientId,
    pub name: String,
    pub category: IngredientCategory,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub analyses: Vec<NutrientAnalysis>,
}

/// Mean of an ingredient's active analyses. An optional field is `None` when
/// no active analysis reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageProfile {
    pub analyses_count: usize,
    pub dry_matter_pct: Decimal,
    pub crude_protein_pct: Decimal,
    pub digestible_protein_pct: Option<Decimal>,
    pub ash_pct: Option<Decimal>,
    pub ether_extract_pct: Option<Decimal>,
    pub ndf_pct: Option<Decimal>,
    pub adf_pct: Option<Decimal>,
    pub tdn_pct: Option<Decimal>,
    pub calcium_pct: Option<Decimal>,
    pub phosphorus_pct: Option<Decimal>,
    pub digestible_energy_mcal_kg: Option<Decimal>,
    pub metabolizable_energy_mcal_kg: Option<Decimal>,
    pub net_energy_lactation_mcal_kg: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationLine {
    pub ingredient_id: IngredientId,
    pub quantity_kg: Decimal,
    /// Share of the whole mix, 0–100.
    pub percentage: Decimal,
    #[serde(default)]
    pub cost_per_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LactationParams {
    pub weight_kg: Decimal,
    pub milk_yield_kg: Decimal,
    pub fat_pct: Decimal,
    #[serde(default)]
    pub gestation_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowingParams {
    pub weight_kg: Decimal,
    #[serde(default)]
    pub target_daily_gain_kg: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Lactation requirements with the per-component breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LactationRequirements {
    pub params: LactationParams,
    pub base: NutrientSet,
    /// Per-kg production requirement already scaled by the milk yield.
    pub production: NutrientSet,
    /// `NutrientSet::ZERO` outside the late-gestation window.
    pub gestation: NutrientSet,
    pub gestation_applied: bool,
    pub totals: NutrientSet,
}

/// An ingredient referenced by a ration line had no active analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAnalysis {
    pub line_index: usize,
    pub ingredient_id: IngredientId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineContribution {
    pub ingredient_id: IngredientId,
    pub quantity_kg: Decimal,
    /// `None` when the ingredient has no analysis to compute from.
    pub supplied: Option<NutrientSet>,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionTotals {
    pub supplied: NutrientSet,
    pub lines: Vec<LineContribution>,
    pub warnings: Vec<MissingAnalysis>,
    /// Nutrients reported by at least one analysed line.
    pub reported: BTreeSet<Nutrient>,
    /// Nutrients an analysed line could not supply, with the ingredients lacking them.
    pub unreported: BTreeMap<Nutrient, Vec<IngredientId>>,
    pub fed_kg: Decimal,
    pub cost_total: Decimal,
}

impl ContributionTotals {
    pub fn has_data(&self, nutrient: Nutrient) -> bool {
        self.reported.contains(&nutrient)
    }

    /// True when the supplied amount may understate the real supply.
    pub fn is_lower_bound(&self, nutrient: Nutrient) -> bool {
        !self.warnings.is_empty() || self.unreported.contains_key(&nutrient)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Deficient,
    Adequate,
    Excess,
    /// Requirement is zero; coverage is reported as 0.
    NoRequirement,
    /// No analysed ingredient reported this nutrient.
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutrientBalance {
    pub nutrient: Nutrient,
    pub required: Decimal,
    pub supplied: Decimal,
    pub difference: Decimal,
    pub coverage_pct: Decimal,
    pub status: BalanceStatus,
    pub lower_bound: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub nutrients: Vec<NutrientBalance>,
    pub deficient_count: usize,
    pub excess_count: usize,
    pub rating: Rating,
    pub lower_bound: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advice {
    Deficit { nutrient: Nutrient, coverage_pct: Decimal },
    Excess { nutrient: Nutrient, coverage_pct: Decimal },
}

impl std::fmt::Display for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advice::Deficit {
                nutrient,
                coverage_pct,
            } => write!(f, "Deficit in {nutrient}: {:.1}% coverage", coverage_pct),
            Advice::Excess {
                nutrient,
                coverage_pct,
            } => write!(
                f,
                "Excess in {nutrient}: {:.1}% coverage, consider reducing",
                coverage_pct
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RationRequirements {
    Lactation(Box<LactationRequirements>),
    Growing { params: GrowingParams, row: GrowingRow },
}

/// A computed ration, ready for the caller to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationRecord {
    #[serde(default)]
    pub animal_id: Option<AnimalId>,
    pub requirements: RationRequirements,
    pub lines: Vec<RationLine>,
    pub contributions: Option<ContributionTotals>,
    pub balance: Option<BalanceReport>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Nutritional policy and input limits. Loaded from `constants.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constants {
    /// Coverage strictly below this percentage is deficient.
    pub deficient_below_pct: Decimal,
    /// Coverage strictly above this percentage is excess.
    pub excess_above_pct: Decimal,
    /// More deficient nutrients than this rates the ration poor.
    pub fair_max_deficiencies: usize,
    pub gestation_threshold_days: u32,
    pub percentage_sum_tolerance: Decimal,
    pub max_body_weight_kg: Decimal,
    pub max_milk_yield_kg: Decimal,
    pub max_fat_pct: Decimal,
    pub max_gestation_days: u32,
    pub max_daily_gain_kg: Decimal,
    /// Largest quantity a single ration line may carry.
    pub max_line_quantity_kg: Decimal,
    pub forage_share_pct: Decimal,
    pub concentrate_share_pct: Decimal,
    pub mineral_share_pct: Decimal,
    pub default_ration_kg: Decimal,
}

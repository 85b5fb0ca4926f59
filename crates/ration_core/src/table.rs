//! Reference tables and the provider traits the calculators read through.

use rust_decimal::Decimal;

use crate::{
    interpolate, CalcError, GestationRow, GrowingRow, MaintenanceRow, ProductionRow, ReferenceRow,
    Resolution, TableKind,
};

// ---------------------------------------------------------------------------
// Row traits
// ---------------------------------------------------------------------------

/// A row of a table keyed by a single ordered value (body weight or fat %).
pub trait KeyedRow: Copy {
    const TABLE: TableKind;

    fn key(&self) -> Decimal;

    /// Builds the synthetic row for `key` between `lower` and `upper`.
    fn interpolate(lower: &Self, upper: &Self, key: Decimal, factor: Decimal) -> Self;

    fn into_reference(self) -> ReferenceRow;
}

impl KeyedRow for MaintenanceRow {
    const TABLE: TableKind = TableKind::Maintenance;

    fn key(&self) -> Decimal {
        self.weight_kg
    }

    fn interpolate(lower: &Self, upper: &Self, key: Decimal, factor: Decimal) -> Self {
        MaintenanceRow {
            weight_kg: key,
            nutrients: lower.nutrients.lerp(&upper.nutrients, factor),
        }
    }

    fn into_reference(self) -> ReferenceRow {
        ReferenceRow::Maintenance(self)
    }
}

impl KeyedRow for ProductionRow {
    const TABLE: TableKind = TableKind::Production;

    fn key(&self) -> Decimal {
        self.fat_pct
    }

    fn interpolate(lower: &Self, upper: &Self, key: Decimal, factor: Decimal) -> Self {
        ProductionRow {
            fat_pct: key,
            nutrients: lower.nutrients.lerp(&upper.nutrients, factor),
        }
    }

    fn into_reference(self) -> ReferenceRow {
        ReferenceRow::Production(self)
    }
}

impl KeyedRow for GestationRow {
    const TABLE: TableKind = TableKind::Gestation;

    fn key(&self) -> Decimal {
        self.weight_kg
    }

    fn interpolate(lower: &Self, upper: &Self, key: Decimal, factor: Decimal) -> Self {
        GestationRow {
            weight_kg: key,
            nutrients: lower.nutrients.lerp(&upper.nutrients, factor),
        }
    }

    fn into_reference(self) -> ReferenceRow {
        ReferenceRow::Gestation(self)
    }
}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Read access to a keyed reference table.
pub trait KeyedRows {
    type Row: KeyedRow;

    fn find_exact(&self, key: Decimal) -> Option<Self::Row>;
    /// Row with the greatest key `<= key`.
    fn find_less_or_equal(&self, key: Decimal) -> Option<Self::Row>;
    /// Row with the smallest key `> key`.
    fn find_greater(&self, key: Decimal) -> Option<Self::Row>;
}

/// Read access to the growing (ceba) band table.
pub trait BandedRows {
    /// First row, in table order, whose bands contain the query.
    fn find_by_band(&self, weight_kg: Decimal, daily_gain_kg: Option<Decimal>)
        -> Option<GrowingRow>;
    fn is_empty(&self) -> bool;
}

/// Bundles the four reference tables the requirement calculator needs.
pub trait ReferenceSource {
    fn maintenance(&self) -> &dyn KeyedRows<Row = MaintenanceRow>;
    fn production(&self) -> &dyn KeyedRows<Row = ProductionRow>;
    fn gestation(&self) -> &dyn KeyedRows<Row = GestationRow>;
    fn growing(&self) -> &dyn BandedRows;
}

// ---------------------------------------------------------------------------
// In-memory tables
// ---------------------------------------------------------------------------

/// Keyed rows sorted ascending by key, keys unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable<R: KeyedRow> {
    rows: Vec<R>,
}

impl<R: KeyedRow> ReferenceTable<R> {
    pub fn new(mut rows: Vec<R>) -> Result<Self, CalcError> {
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        if let Some(pair) = rows.windows(2).find(|w| w[0].key() == w[1].key()) {
            return Err(CalcError::DuplicateKey {
                table: R::TABLE,
                key: pair[0].key(),
            });
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Smallest and largest key, if any.
    pub fn key_range(&self) -> Option<(Decimal, Decimal)> {
        Some((self.rows.first()?.key(), self.rows.last()?.key()))
    }
}

impl<R: KeyedRow> Default for ReferenceTable<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R: KeyedRow> KeyedRows for ReferenceTable<R> {
    type Row = R;

    fn find_exact(&self, key: Decimal) -> Option<R> {
        self.rows
            .binary_search_by(|row| row.key().cmp(&key))
            .ok()
            .map(|i| self.rows[i])
    }

    fn find_less_or_equal(&self, key: Decimal) -> Option<R> {
        let idx = self.rows.partition_point(|row| row.key() <= key);
        idx.checked_sub(1).map(|i| self.rows[i])
    }

    fn find_greater(&self, key: Decimal) -> Option<R> {
        let idx = self.rows.partition_point(|row| row.key() <= key);
        self.rows.get(idx).copied()
    }
}

/// Growing bands in insertion order. Overlaps are allowed; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrowingTable {
    rows: Vec<GrowingRow>,
}

impl GrowingTable {
    pub fn new(rows: Vec<GrowingRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[GrowingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Index pairs `(i, j)`, `i < j`, of rows whose bands overlap.
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.rows.iter().enumerate() {
            for (j, b) in self.rows.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

impl BandedRows for GrowingTable {
    fn find_by_band(
        &self,
        weight_kg: Decimal,
        daily_gain_kg: Option<Decimal>,
    ) -> Option<GrowingRow> {
        self.rows
            .iter()
            .find(|row| {
                row.contains_weight(weight_kg) && daily_gain_kg.is_none_or(|g| row.contains_gain(g))
            })
            .copied()
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The four NRC tables held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTables {
    pub maintenance: ReferenceTable<MaintenanceRow>,
    pub production: ReferenceTable<ProductionRow>,
    pub gestation: ReferenceTable<GestationRow>,
    pub growing: GrowingTable,
}

impl ReferenceTables {
    /// Looks up any table by kind. Keyed tables interpolate on `key`; the
    /// growing table matches `key` as body weight and `gain` as daily gain.
    pub fn lookup(
        &self,
        kind: TableKind,
        key: Decimal,
        gain: Option<Decimal>,
    ) -> Result<(ReferenceRow, Resolution), CalcError> {
        match kind {
            TableKind::Maintenance => resolve_reference(&self.maintenance, key),
            TableKind::Production => resolve_reference(&self.production, key),
            TableKind::Gestation => resolve_reference(&self.gestation, key),
            TableKind::Growing => interpolate::lookup_band(&self.growing, key, gain)
                .map(|row| (ReferenceRow::Growing(row), Resolution::Exact)),
        }
    }

    pub fn row_counts(&self) -> [(TableKind, usize); 4] {
        [
            (TableKind::Maintenance, self.maintenance.len()),
            (TableKind::Production, self.production.len()),
            (TableKind::Gestation, self.gestation.len()),
            (TableKind::Growing, self.growing.len()),
        ]
    }
}

fn resolve_reference<T>(table: &T, key: Decimal) -> Result<(ReferenceRow, Resolution), CalcError>
where
    T: KeyedRows + ?Sized,
{
    interpolate::resolve(table, key).map(|(row, res)| (row.into_reference(), res))
}

impl ReferenceSource for ReferenceTables {
    fn maintenance(&self) -> &dyn KeyedRows<Row = MaintenanceRow> {
        &self.maintenance
    }

    fn production(&self) -> &dyn KeyedRows<Row = ProductionRow> {
        &self.production
    }

    fn gestation(&self) -> &dyn KeyedRows<Row = GestationRow> {
        &self.gestation
    }

    fn growing(&self) -> &dyn BandedRows {
        &self.growing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NutrientSet;
    use rust_decimal_macros::dec;

    fn row(weight: Decimal) -> MaintenanceRow {
        MaintenanceRow {
            weight_kg: weight,
            nutrients: NutrientSet {
                dry_matter_kg: weight / dec!(50),
                ..NutrientSet::ZERO
            },
        }
    }

    fn band(w: (Decimal, Decimal), g: (Decimal, Decimal), cp: Decimal) -> GrowingRow {
        GrowingRow {
            weight_min_kg: w.0,
            weight_max_kg: w.1,
            gain_min_kg: g.0,
            gain_max_kg: g.1,
            crude_protein_g: cp,
            digestible_protein_g: Decimal::ZERO,
            metabolizable_energy_mcal: Decimal::ZERO,
            calcium_g: Decimal::ZERO,
            phosphorus_g: Decimal::ZERO,
            dry_matter_kg: Decimal::ZERO,
        }
    }

    #[test]
    fn new_sorts_rows_by_key() {
        let table = ReferenceTable::new(vec![row(dec!(500)), row(dec!(400)), row(dec!(450))])
            .unwrap();
        let keys: Vec<_> = table.rows().iter().map(KeyedRow::key).collect();
        assert_eq!(keys, vec![dec!(400), dec!(450), dec!(500)]);
        assert_eq!(table.key_range(), Some((dec!(400), dec!(500))));
    }

    #[test]
    fn new_rejects_duplicate_keys() {
        let err = ReferenceTable::new(vec![row(dec!(400)), row(dec!(400.0))]).unwrap_err();
        assert_eq!(
            err,
            CalcError::DuplicateKey {
                table: TableKind::Maintenance,
                key: dec!(400),
            }
        );
    }

    #[test]
    fn neighbour_queries() {
        let table = ReferenceTable::new(vec![row(dec!(400)), row(dec!(500))]).unwrap();

        assert!(table.find_exact(dec!(450)).is_none());
        assert_eq!(table.find_exact(dec!(500)).unwrap().weight_kg, dec!(500));

        assert_eq!(table.find_less_or_equal(dec!(450)).unwrap().weight_kg, dec!(400));
        assert_eq!(table.find_less_or_equal(dec!(500)).unwrap().weight_kg, dec!(500));
        assert!(table.find_less_or_equal(dec!(399)).is_none());

        assert_eq!(table.find_greater(dec!(400)).unwrap().weight_kg, dec!(500));
        assert!(table.find_greater(dec!(500)).is_none());
    }

    #[test]
    fn band_lookup_is_first_match_in_table_order() {
        let table = GrowingTable::new(vec![
            band((dec!(300), dec!(350)), (dec!(0.8), dec!(1.2)), dec!(850)),
            band((dec!(340), dec!(400)), (dec!(0.8), dec!(1.2)), dec!(900)),
        ]);

        let hit = table.find_by_band(dec!(345), Some(dec!(1.0))).unwrap();
        assert_eq!(hit.crude_protein_g, dec!(850));

        let hit = table.find_by_band(dec!(360), None).unwrap();
        assert_eq!(hit.crude_protein_g, dec!(900));

        assert!(table.find_by_band(dec!(320), Some(dec!(2.0))).is_none());
        assert_eq!(table.overlapping_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn band_edges_are_inclusive() {
        let table = GrowingTable::new(vec![band(
            (dec!(300), dec!(350)),
            (dec!(0.8), dec!(1.2)),
            dec!(850),
        )]);
        assert!(table.find_by_band(dec!(300), Some(dec!(0.8))).is_some());
        assert!(table.find_by_band(dec!(350), Some(dec!(1.2))).is_some());
        assert!(table.find_by_band(dec!(350.1), Some(dec!(1.0))).is_none());
    }

    #[test]
    fn touching_bands_do_not_overlap() {
        let table = GrowingTable::new(vec![
            band((dec!(300), dec!(350)), (dec!(0.8), dec!(1.2)), dec!(850)),
            band((dec!(350), dec!(400)), (dec!(0.8), dec!(1.2)), dec!(900)),
        ]);
        assert!(table.overlapping_pairs().is_empty());
        let edge = table.find_by_band(dec!(350), Some(dec!(1.0))).unwrap();
        assert_eq!(edge.crude_protein_g, dec!(850));
    }

    #[test]
    fn lookup_by_kind_tags_the_row() {
        let tables = ReferenceTables {
            maintenance: ReferenceTable::new(vec![row(dec!(400)), row(dec!(500))]).unwrap(),
            ..ReferenceTables::default()
        };
        let (found, resolution) = tables
            .lookup(TableKind::Maintenance, dec!(450), None)
            .unwrap();
        assert!(matches!(found, ReferenceRow::Maintenance(r) if r.weight_kg == dec!(450)));
        assert_eq!(
            resolution,
            Resolution::Interpolated {
                lower_key: dec!(400),
                upper_key: dec!(500),
            }
        );

        let err = tables.lookup(TableKind::Growing, dec!(300), None).unwrap_err();
        assert_eq!(
            err,
            CalcError::ReferenceDataMissing {
                table: TableKind::Growing
            }
        );
    }
}

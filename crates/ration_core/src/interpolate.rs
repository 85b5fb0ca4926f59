use rust_decimal::Decimal;

use crate::{BandedRows, CalcError, GrowingRow, KeyedRow, KeyedRows, Resolution, TableKind};

/// Exact row, interpolated row, or the nearest edge row when `key` lies outside
/// the table. Never extrapolates.
pub fn lookup<T>(table: &T, key: Decimal) -> Result<T::Row, CalcError>
where
    T: KeyedRows + ?Sized,
{
    resolve(table, key).map(|(row, _)| row)
}

/// Like [`lookup`], also reporting how the row was obtained.
pub fn resolve<T>(table: &T, key: Decimal) -> Result<(T::Row, Resolution), CalcError>
where
    T: KeyedRows + ?Sized,
{
    if let Some(row) = table.find_exact(key) {
        return Ok((row, Resolution::Exact));
    }

    match (table.find_less_or_equal(key), table.find_greater(key)) {
        (Some(lower), Some(upper)) => {
            let (lo, hi) = (lower.key(), upper.key());
            let factor = (key - lo) / (hi - lo);
            let row = <T::Row as KeyedRow>::interpolate(&lower, &upper, key, factor);
            Ok((
                row,
                Resolution::Interpolated {
                    lower_key: lo,
                    upper_key: hi,
                },
            ))
        }
        (Some(lower), None) => Ok((lower, Resolution::ClampedHigh)),
        (None, Some(upper)) => Ok((upper, Resolution::ClampedLow)),
        (None, None) => Err(CalcError::ReferenceDataMissing {
            table: <T::Row as KeyedRow>::TABLE,
        }),
    }
}

/// Growing-table lookup by inclusive weight band and, when given, gain band.
pub fn lookup_band<T>(
    table: &T,
    weight_kg: Decimal,
    daily_gain_kg: Option<Decimal>,
) -> Result<GrowingRow, CalcError>
where
    T: BandedRows + ?Sized,
{
    if table.is_empty() {
        return Err(CalcError::ReferenceDataMissing {
            table: TableKind::Growing,
        });
    }
    table
        .find_by_band(weight_kg, daily_gain_kg)
        .ok_or(CalcError::OutOfRange {
            table: TableKind::Growing,
            weight_kg,
            daily_gain_kg,
        })
}

use rust_decimal::Decimal;
use thiserror::Error;

use crate::TableKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("reference table '{table}' has no rows")]
    ReferenceDataMissing { table: TableKind },

    #[error("no '{table}' row covers weight {weight_kg} kg{}", gain_suffix(.daily_gain_kg))]
    OutOfRange {
        table: TableKind,
        weight_kg: Decimal,
        daily_gain_kg: Option<Decimal>,
    },

    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("duplicate key {key} in reference table '{table}'")]
    DuplicateKey { table: TableKind, key: Decimal },
}

fn gain_suffix(gain: &Option<Decimal>) -> String {
    gain.map(|g| format!(" and daily gain {g} kg"))
        .unwrap_or_default()
}

impl CalcError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            CalcError::ReferenceDataMissing { .. } => "reference_data_missing",
            CalcError::OutOfRange { .. } => "out_of_range",
            CalcError::InvalidInput { .. } => "invalid_input",
            CalcError::DuplicateKey { .. } => "duplicate_key",
        }
    }
}

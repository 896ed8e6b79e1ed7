use itertools::Itertools;

use crate::table::Timestamp;

/// Errors raised while building tables, loading configuration or computing uncertainties
///
/// `InsufficientData` and `NegativeRadicand` are column-scoped: they are stored next to the
/// successful columns of an [`crate::UncertaintyTable`] rather than aborting the whole call. A
/// column only fails with `NegativeRadicand` when no paired point has a valid radicand; isolated
/// negative radicands leave NaN at their points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reference column `{0}` is not present in the table")]
    MissingReferenceColumn(String),
    #[error("unsupported approach `{0}`, expected one of `GDE`, `NILU1` or `NILU2`")]
    UnsupportedApproach(String),
    #[error("parameter `{name}` has invalid value {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("column `{column}` has {pairs} valid paired observations, at least 3 are required")]
    InsufficientData { column: String, pairs: usize },
    #[error(
        "column `{column}` has a negative value under the square root at {}",
        display_timestamps(.timestamps)
    )]
    NegativeRadicand {
        column: String,
        timestamps: Vec<Timestamp>,
    },
    #[error("a table requires at least one column")]
    EmptyTable,
    #[error("column `{column}` has {found} values but the index has {expected}")]
    MisalignedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("column `{0}` appears more than once")]
    DuplicateColumn(String),
    #[error("column `{column}` holds an infinite value at row {row}")]
    NonFiniteValue { column: String, row: usize },
    #[error("column `{column}` holds `{value}` at row {row}, which is not a number")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

fn display_timestamps(timestamps: &[Timestamp]) -> String {
    timestamps.iter().map(|timestamp| &timestamp.0).join(", ")
}

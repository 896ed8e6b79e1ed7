use std::fmt::{Debug, Display};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use num_traits::{Float, FromPrimitive};

use crate::approach::Approach;
use crate::config::Config;
use crate::margin::{column_uncertainty, output_name, UncertaintySeries};
use crate::table::{Series, Table, Timestamp};
use crate::{Error, Result};

/// Label of the index of an [`UncertaintyTable`]
pub const INDEX_NAME: &str = "Timestamp";

/// Compute the relative expanded uncertainty of every column of `table` against `reference`
///
/// Shorthand for [`compute`] with a [`Config`] built from the arguments.
///
/// # Errors
/// See [`compute`].
pub fn relative_expanded_uncertainty<E: Float + FromPrimitive + Debug>(
    table: &Table<E>,
    reference: &str,
    lambda: E,
    u_xi: E,
    approach: Approach,
) -> Result<UncertaintyTable<E>> {
    let config = Config::new(reference)
        .with_lambda(lambda)
        .with_measurement_error(u_xi)
        .with_approach(approach);
    compute(table, &config)
}

/// Compute the relative expanded uncertainty of every column of `table`
///
/// Each column, the reference included, is compared with the reference column independently.
/// Failures are scoped to their column: a column with too few pairs, or with a negative radicand
/// at every paired point, is stored as an error in the output while the other columns are still
/// computed. A negative radicand at only some points leaves NaN at those points, see
/// [`UncertaintySeries::negative_radicands`]. Use [`UncertaintyTable::into_strict`] for
/// all-or-nothing semantics.
///
/// # Errors
/// Returns an error, without partial output, if the parameters are invalid or the reference
/// column is missing from `table`.
pub fn compute<E: Float + FromPrimitive + Debug>(
    table: &Table<E>,
    config: &Config<E>,
) -> Result<UncertaintyTable<E>> {
    config.validate()?;
    let reference = table
        .column(&config.reference)
        .ok_or_else(|| Error::MissingReferenceColumn(config.reference.clone()))?;

    let columns = table
        .columns()
        .iter()
        .map(|candidate| {
            let outcome = column_uncertainty(reference, candidate, table.timestamps(), config);
            if let Err(e) = &outcome {
                tracing::warn!(column = candidate.name(), error = %e, "uncertainty not computed");
            }
            Column {
                name: output_name(candidate.name()),
                outcome,
            }
        })
        .collect::<Vec<_>>();

    tracing::info!(
        reference = %config.reference,
        approach = %config.approach,
        rows = table.len(),
        columns = columns.len(),
        failed = columns.iter().filter(|column| column.outcome.is_err()).count(),
        "computed relative expanded uncertainty"
    );

    Ok(UncertaintyTable {
        timestamps: table.timestamps().to_vec(),
        reference: reference.clone(),
        columns,
    })
}

struct Column<E> {
    name: String,
    outcome: Result<UncertaintySeries<E>>,
}

/// The reference column followed by one uncertainty column per input column
pub struct UncertaintyTable<E> {
    timestamps: Vec<Timestamp>,
    reference: Series<E>,
    columns: Vec<Column<E>>,
}

impl<E: Float> UncertaintyTable<E> {
    pub const fn index_name(&self) -> &'static str {
        INDEX_NAME
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// The reference column, unchanged
    pub const fn reference(&self) -> &Series<E> {
        &self.reference
    }

    /// Output column names: the reference name, then `u_<name>` for every input column
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(self.reference.name())
            .chain(self.columns.iter().map(|column| column.name.as_str()))
            .collect()
    }

    /// Look up an uncertainty column by its output name, such as `u_LC1`
    pub fn column(&self, name: &str) -> Option<&Result<UncertaintySeries<E>>> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| &column.outcome)
    }

    /// Uncertainty columns in input order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Result<UncertaintySeries<E>>)> {
        self.columns
            .iter()
            .map(|column| (column.name.as_str(), &column.outcome))
    }

    /// Columns for which no uncertainty could be computed
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.columns().filter_map(|(name, outcome)| match outcome {
            Ok(_) => None,
            Err(e) => Some((name, e)),
        })
    }

    /// All uncertainty columns, or the first column error
    ///
    /// # Errors
    /// Returns the error of the first column which failed, or [`Error::NegativeRadicand`] for
    /// the first column with a negative radicand at any point.
    pub fn into_strict(self) -> Result<Vec<UncertaintySeries<E>>> {
        self.columns
            .into_iter()
            .map(|column| {
                column.outcome.and_then(|series| {
                    series
                        .negative_radicand_error()
                        .map_or(Ok(series), Err)
                })
            })
            .collect()
    }
}

impl<E: Float + Display> UncertaintyTable<E> {
    /// Write the table as CSV
    ///
    /// The header is the index label followed by [`UncertaintyTable::column_names`]. Missing and
    /// undefined values are written as empty cells, as is every cell of a failed column.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(std::iter::once(INDEX_NAME).chain(self.column_names()))?;

        for (ii, timestamp) in self.timestamps.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 2);
            record.push(timestamp.0.clone());
            record.push(cell(self.reference.values().get(ii).copied()));
            for column in &self.columns {
                let value = column
                    .outcome
                    .as_ref()
                    .ok()
                    .and_then(|series| series.values().get(ii).copied());
                record.push(cell(value));
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write the table as CSV to `path`, see [`UncertaintyTable::to_writer`]
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        tracing::info!(?path, "writing uncertainty table");
        self.to_writer(File::create(path)?)
    }
}

fn cell<E: Float + Display>(value: Option<E>) -> String {
    value
        .filter(|value| !value.is_nan())
        .map_or_else(String::new, |value| value.to_string())
}

use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;

use ndarray::Array1;
use num_traits::Float;

use crate::{Error, Result};

/// Label of a row in a [`Table`]
///
/// Timestamps are kept as given by the source; they only need to be ordered consistently across
/// the columns of one table.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Timestamp(pub String);

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A named measurement series. Missing observations are stored as NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct Series<E> {
    name: String,
    values: Array1<E>,
}

impl<E> Series<E> {
    pub(crate) const fn new(name: String, values: Array1<E>) -> Self {
        Self { name, values }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn values(&self) -> &Array1<E> {
        &self.values
    }
}

/// An ordered set of equally long series sharing one timestamp index
#[derive(Clone, Debug, PartialEq)]
pub struct Table<E> {
    timestamps: Vec<Timestamp>,
    columns: Vec<Series<E>>,
}

impl<E> Table<E> {
    pub fn builder(timestamps: Vec<Timestamp>) -> TableBuilder<E, Empty> {
        TableBuilder {
            timestamps,
            columns: vec![],
            phantom_data: PhantomData,
        }
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Series<E>] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Series<E>> {
        self.columns.iter().find(|series| series.name == name)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

pub enum Empty {}
pub enum Populated {}

/// Collects columns for a [`Table`]. A table can only be built once a column has been added.
pub struct TableBuilder<E, N> {
    timestamps: Vec<Timestamp>,
    columns: Vec<(String, Vec<E>)>,
    phantom_data: PhantomData<N>,
}

impl<E, N> TableBuilder<E, N> {
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: impl Into<Vec<E>>,
    ) -> TableBuilder<E, Populated> {
        self.columns.push((name.into(), values.into()));
        TableBuilder {
            timestamps: self.timestamps,
            columns: self.columns,
            phantom_data: PhantomData,
        }
    }
}

impl<E: Float> TableBuilder<E, Populated> {
    /// Validate the collected columns and assemble the table
    ///
    /// # Errors
    /// Returns an error if a column length differs from the number of timestamps, if a column
    /// name is repeated or if any value is infinite.
    pub fn build(self) -> Result<Table<E>> {
        let expected = self.timestamps.len();
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());

        for (name, values) in self.columns {
            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateColumn(name));
            }
            if values.len() != expected {
                return Err(Error::MisalignedColumn {
                    column: name,
                    expected,
                    found: values.len(),
                });
            }
            if let Some(row) = values.iter().position(|value| value.is_infinite()) {
                return Err(Error::NonFiniteValue { column: name, row });
            }
            columns.push(Series::new(name, Array1::from(values)));
        }

        Ok(Table {
            timestamps: self.timestamps,
            columns,
        })
    }
}

impl<E: Float + FromStr> Table<E> {
    /// Read a table from CSV
    ///
    /// The header row names the columns. The first column holds the timestamps and every other
    /// column a series; empty cells and `NaN` are read as missing observations.
    ///
    /// # Errors
    /// Returns an error if the CSV is malformed, a cell cannot be parsed as a number or the
    /// resulting table fails validation.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let names = rdr
            .headers()?
            .iter()
            .skip(1)
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        if names.is_empty() {
            return Err(Error::EmptyTable);
        }

        let mut timestamps = vec![];
        let mut values: Vec<Vec<E>> = vec![vec![]; names.len()];

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            timestamps.push(Timestamp(record.get(0).unwrap_or_default().to_owned()));
            for (ii, name) in names.iter().enumerate() {
                let cell = record.get(ii + 1).unwrap_or_default();
                values[ii].push(parse_cell(cell, name, row)?);
            }
        }

        let mut columns = names.into_iter().zip(values);
        let (name, first) = columns.next().ok_or(Error::EmptyTable)?;
        columns
            .fold(Self::builder(timestamps).with_column(name, first), |builder, (name, values)| {
                builder.with_column(name, values)
            })
            .build()
    }

    /// Read a table from a CSV file on disk, see [`Table::from_reader`]
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its contents are not a valid table.
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!(?path, "reading table");
        let file = fs::read(path)?;
        Self::from_reader(&file[..])
    }
}

fn parse_cell<E: Float + FromStr>(cell: &str, column: &str, row: usize) -> Result<E> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(E::nan());
    }
    cell.parse::<E>().map_err(|_| Error::InvalidValue {
        column: column.to_owned(),
        row,
        value: cell.to_owned(),
    })
}

use crate::error::TableError;

use ndarray::{Array1, ArrayView1, Axis};
use std::collections::BTreeMap;

/// Recovered magnitudes at or above this value mean "source not recovered".
pub const NOT_RECOVERED_MAG: f64 = 90.0;

/// The three per-filter columns of an AST table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// `<FILTER>_IN`, input magnitude of the injected star
    InputMag,
    /// `<FILTER>_RATE`, recovered flux normalized by the vega flux
    Rate,
    /// `<FILTER>_VEGA`, recovered vega magnitude, [NOT_RECOVERED_MAG] and
    /// above meaning "not recovered"
    RecoveredMag,
}

impl ColumnKind {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::InputMag => "_IN",
            Self::Rate => "_RATE",
            Self::RecoveredMag => "_VEGA",
        }
    }

    /// Column name for a filter, e.g. `"F475W_RATE"`
    pub fn column_name(self, filter: &str) -> String {
        format!("{}{}", filter, self.suffix())
    }
}

/// Artificial star test results as named float columns of equal length
///
/// One row per injected-and-measured instance. Each filter contributes the
/// three [ColumnKind] columns.
#[derive(Clone, Debug, Default)]
pub struct AstTable {
    n_rows: Option<usize>,
    columns: BTreeMap<String, Array1<f64>>,
}

impl AstTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table from an iterator of named columns
    pub fn from_columns<N, C, I>(columns: I) -> Result<Self, TableError>
    where
        N: Into<String>,
        C: Into<Array1<f64>>,
        I: IntoIterator<Item = (N, C)>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }

    /// Number of rows, zero for a table without columns
    pub fn n_rows(&self) -> usize {
        self.n_rows.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Add or replace a column
    ///
    /// The first column fixes the table length, all further columns must have
    /// the same length.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: impl Into<Array1<f64>>,
    ) -> Result<&mut Self, TableError> {
        let name = name.into();
        let values = values.into();
        match self.n_rows {
            Some(expected) if expected != values.len() => {
                return Err(TableError::ColumnLengthMismatch {
                    name,
                    expected,
                    actual: values.len(),
                });
            }
            _ => self.n_rows = Some(values.len()),
        }
        self.columns.insert(name, values);
        Ok(self)
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>, TableError> {
        self.columns
            .get(name)
            .map(|values| values.view())
            .ok_or_else(|| TableError::MissingColumn { name: name.into() })
    }

    /// Per-filter column by kind
    pub fn filter_column(
        &self,
        filter: &str,
        kind: ColumnKind,
    ) -> Result<ArrayView1<'_, f64>, TableError> {
        self.column(&kind.column_name(filter))
    }

    /// Sub-table with the given rows, in the given order
    ///
    /// Panics if a row index is out of bounds.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values.select(Axis(0), rows)))
            .collect();
        Self {
            n_rows: Some(rows.len()),
            columns,
        }
    }
}

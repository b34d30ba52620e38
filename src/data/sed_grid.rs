use crate::error::TableError;

use ndarray::{ArrayView2, CowArray, Ix2};

/// Synthetic photometry grid: one row per model, one flux column per filter
///
/// Fluxes are in physical units, [crate::AstNoiseModel::evaluate] normalizes
/// them by the per-filter vega flux. Borrows or owns the flux matrix.
#[derive(Clone, Debug)]
pub struct SedGrid<'a> {
    filters: Vec<String>,
    seds: CowArray<'a, f64, Ix2>,
}

impl<'a> SedGrid<'a> {
    pub fn new(
        filters: impl Into<Vec<String>>,
        seds: impl Into<CowArray<'a, f64, Ix2>>,
    ) -> Result<Self, TableError> {
        let filters = filters.into();
        let seds = seds.into();
        if seds.ncols() != filters.len() {
            return Err(TableError::ColumnCountMismatch {
                filters: filters.len(),
                columns: seds.ncols(),
            });
        }
        Ok(Self { filters, seds })
    }

    pub fn n_models(&self) -> usize {
        self.seds.nrows()
    }

    pub fn n_filters(&self) -> usize {
        self.filters.len()
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn seds(&self) -> ArrayView2<'_, f64> {
        self.seds.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn dimensions() {
        let grid = SedGrid::new(
            vec!["F1".to_string(), "F2".to_string()],
            array![[1e-13, 2e-13], [3e-13, 4e-13], [5e-13, 6e-13]],
        )
        .unwrap();
        assert_eq!(grid.n_models(), 3);
        assert_eq!(grid.n_filters(), 2);
        assert_eq!(grid.seds()[[2, 1]], 6e-13);
    }

    #[test]
    fn column_count_mismatch_is_an_error() {
        let result = SedGrid::new(
            vec!["F1".to_string()],
            array![[1e-13, 2e-13]],
        );
        assert_eq!(
            result.err(),
            Some(TableError::ColumnCountMismatch {
                filters: 1,
                columns: 2,
            })
        );
    }
}

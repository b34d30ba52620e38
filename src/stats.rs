use crate::data::{AstTable, ColumnKind, NOT_RECOVERED_MAG};
use crate::error::NoiseModelError;
use crate::vega::mag_to_flux;

use ndarray::{Array1, Array2, Axis};
use ndarray_stats::CorrelationExt;

/// Noise statistics of one model group, estimated from its AST instances
///
/// All flux quantities are in vega-normalized units, matching the `RATE`
/// columns of the AST table.
#[derive(Clone, Debug)]
pub struct GroupStats {
    /// Input vega magnitude per filter, taken from the first usable instance
    pub input_mags: Array1<f64>,
    /// Input flux per filter, `10^(-0.4 input_mag)`
    pub input_fluxes: Array1<f64>,
    /// Mean recovered-minus-input flux difference per filter
    pub bias: Array1<f64>,
    /// Sample standard deviation of the flux differences per filter
    pub sigmas: Array1<f64>,
    /// Unbiased sample covariance of the flux differences across filters
    pub covariance: Array2<f64>,
    /// Correlation matrix, zero wherever a sigma vanishes
    pub correlation: Array2<f64>,
    /// Raw flux differences, one row per filter, one column per usable instance
    pub diffs: Array2<f64>,
    /// Fraction of instances recovered per filter
    pub completeness: Array1<f64>,
    /// Number of instances kept by the recovered-anywhere cut
    pub n_usable: usize,
}

impl GroupStats {
    /// Estimate the noise statistics from the AST instances of one model group
    ///
    /// `rows` indexes the group's instances in `table`. An instance recovered
    /// in no filter at all is dropped first, replicating how observed catalogs
    /// are built. Fails with [NoiseModelError::InsufficientData] when fewer
    /// than `min_group_size` instances survive the cut.
    pub fn estimate(
        table: &AstTable,
        rows: &[usize],
        filters: &[String],
        min_group_size: usize,
    ) -> Result<Self, NoiseModelError> {
        assert!(!filters.is_empty(), "filter list must not be empty");
        assert!(
            min_group_size >= 2,
            "min_group_size must be at least 2 for the sample covariance to be defined"
        );

        let n_filters = filters.len();
        let recovered_mags = filters
            .iter()
            .map(|filter| table.filter_column(filter, ColumnKind::RecoveredMag))
            .collect::<Result<Vec<_>, _>>()?;

        let usable: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&row| {
                recovered_mags
                    .iter()
                    .any(|mags| mags[row] < NOT_RECOVERED_MAG)
            })
            .collect();
        let n_usable = usable.len();
        if n_usable < min_group_size {
            return Err(NoiseModelError::InsufficientData {
                usable: n_usable,
                required: min_group_size,
            });
        }

        let mut input_mags = Array1::zeros(n_filters);
        let mut diffs = Array2::zeros((n_filters, n_usable));
        let mut completeness = Array1::zeros(n_filters);
        for (ck, filter) in filters.iter().enumerate() {
            let input = table.filter_column(filter, ColumnKind::InputMag)?;
            let rate = table.filter_column(filter, ColumnKind::Rate)?;
            input_mags[ck] = input[usable[0]];
            for (i, &row) in usable.iter().enumerate() {
                diffs[[ck, i]] = rate[row] - mag_to_flux(input[row]);
            }
            let n_recovered = rows
                .iter()
                .filter(|&&row| recovered_mags[ck][row] < NOT_RECOVERED_MAG)
                .count();
            completeness[ck] = n_recovered as f64 / rows.len() as f64;
        }

        let bias = diffs
            .mean_axis(Axis(1))
            .expect("group has at least two usable instances");
        let covariance = diffs
            .cov(1.0)
            .expect("group has at least two usable instances");
        let sigmas = covariance.diag().mapv(f64::sqrt);

        let mut correlation = covariance.clone();
        for ck in 0..n_filters {
            for dk in 0..n_filters {
                let norm = sigmas[ck] * sigmas[dk];
                correlation[[ck, dk]] = if norm > 0.0 {
                    covariance[[ck, dk]] / norm
                } else {
                    0.0
                };
            }
        }

        let input_fluxes = input_mags.mapv(mag_to_flux);
        Ok(Self {
            input_mags,
            input_fluxes,
            bias,
            sigmas,
            covariance,
            correlation,
            diffs,
            completeness,
            n_usable,
        })
    }

    pub fn n_filters(&self) -> usize {
        self.bias.len()
    }
}

//! Per-model AST statistics stacked into dense arrays

use crate::config::NoiseModelConfig;
use crate::data::{AstTable, ColumnKind};
use crate::error::NoiseModelError;
use crate::progress::ProgressSink;
use crate::stats::GroupStats;

use itertools::Itertools;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// Noise statistics of every retained model, stacked model-major.
///
/// Models are the distinct input magnitudes of the reference filter, the last
/// one of the filter set, ordered by ascending magnitude. Groups failing the
/// [NoiseModelConfig::min_group_size] cuts are dropped, so the model axis has
/// no gaps.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AstModelSet {
    input_fluxes: Array2<f64>,
    biases: Array2<f64>,
    covariances: Array3<f64>,
    correlations: Array3<f64>,
    completeness: Array2<f64>,
}

impl AstModelSet {
    /// Estimates noise statistics for every model group of an AST table.
    ///
    /// `progress` is started with the number of groups and bumped once per
    /// group, skipped or not.
    pub fn aggregate(
        table: &AstTable,
        filters: &[String],
        config: &NoiseModelConfig,
        mut progress: impl ProgressSink,
    ) -> Result<Self, NoiseModelError> {
        assert!(!filters.is_empty(), "filters must be non-empty");

        let n_filters = filters.len();
        let ref_filter = filters[n_filters - 1].as_str();
        let ref_mags = table.filter_column(ref_filter, ColumnKind::InputMag)?;

        let mut order: Vec<usize> = (0..table.n_rows()).collect();
        order.sort_by(|&a, &b| ref_mags[a].total_cmp(&ref_mags[b]));
        let groups: Vec<(f64, Vec<usize>)> = order
            .into_iter()
            .chunk_by(|&row| ref_mags[row])
            .into_iter()
            .map(|(ref_mag, rows)| (ref_mag, rows.collect()))
            .collect();
        let n_groups = groups.len();

        progress.start(n_groups);
        let mut kept = Vec::with_capacity(n_groups);
        for (ref_mag, rows) in groups {
            if rows.len() < config.min_group_size {
                tracing::debug!(ref_mag, n_asts = rows.len(), "skipping model group");
            } else {
                match GroupStats::estimate(table, &rows, filters, config.min_group_size) {
                    Ok(stats) => kept.push(stats),
                    Err(NoiseModelError::InsufficientData { usable, required }) => {
                        tracing::debug!(ref_mag, usable, required, "skipping model group");
                    }
                    Err(err) => {
                        progress.finish();
                        return Err(err);
                    }
                }
            }
            progress.inc();
        }
        progress.finish();
        tracing::info!(
            n_groups,
            n_models = kept.len(),
            n_filters,
            "aggregated AST noise statistics"
        );

        let n_models = kept.len();
        let mut input_fluxes = Array2::zeros((n_models, n_filters));
        let mut biases = Array2::zeros((n_models, n_filters));
        let mut covariances = Array3::zeros((n_models, n_filters, n_filters));
        let mut correlations = Array3::zeros((n_models, n_filters, n_filters));
        let mut completeness = Array2::zeros((n_models, n_filters));
        for (i, stats) in kept.iter().enumerate() {
            input_fluxes.row_mut(i).assign(&stats.input_fluxes);
            biases.row_mut(i).assign(&stats.bias);
            covariances
                .index_axis_mut(Axis(0), i)
                .assign(&stats.covariance);
            correlations
                .index_axis_mut(Axis(0), i)
                .assign(&stats.correlation);
            completeness.row_mut(i).assign(&stats.completeness);
        }

        Ok(Self {
            input_fluxes,
            biases,
            covariances,
            correlations,
            completeness,
        })
    }

    /// Number of retained models
    pub fn len(&self) -> usize {
        self.biases.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_filters(&self) -> usize {
        self.biases.ncols()
    }

    /// Model input fluxes, shape `(models, filters)`
    pub fn input_fluxes(&self) -> ArrayView2<'_, f64> {
        self.input_fluxes.view()
    }

    /// Mean flux biases, shape `(models, filters)`
    pub fn biases(&self) -> ArrayView2<'_, f64> {
        self.biases.view()
    }

    /// Flux-difference covariance matrices, shape `(models, filters, filters)`
    pub fn covariances(&self) -> ArrayView3<'_, f64> {
        self.covariances.view()
    }

    /// Correlation matrices, shape `(models, filters, filters)`
    pub fn correlations(&self) -> ArrayView3<'_, f64> {
        self.correlations.view()
    }

    /// Recovered fractions, shape `(models, filters)`
    pub fn completeness(&self) -> ArrayView2<'_, f64> {
        self.completeness.view()
    }

    /// Decimal log of the model input fluxes, the nearest-model coordinates
    pub fn log_fluxes(&self) -> Array2<f64> {
        self.input_fluxes.mapv(f64::log10)
    }
}

//! Noise-model construction and its interpolation over a model grid

use crate::config::{DegeneracyPolicy, NoiseModelConfig};
use crate::covariance::{
    distance_weights, invert_covariance, n_offdiag, pack_symmetric, weighted_mean_stack,
};
use crate::data::{AstTable, SedGrid};
use crate::error::NoiseModelError;
use crate::kdtree::KdTree;
use crate::model_set::AstModelSet;
use crate::progress::ProgressSink;
use crate::vega::ReferenceFlux;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Multi-band photometric noise model estimated from artificial star tests.
///
/// Construction groups the AST table by the input magnitude of the reference
/// filter and estimates per-group flux statistics, see [AstModelSet].
/// [Self::evaluate] then propagates those statistics to arbitrary model SEDs
/// through inverse-distance weighting of the nearest models in log flux
/// space.
#[derive(Clone, Debug)]
pub struct AstNoiseModel {
    filters: Vec<String>,
    vega_fluxes: Array1<f64>,
    config: NoiseModelConfig,
    models: AstModelSet,
    index: KdTree,
}

impl AstNoiseModel {
    /// Builds the noise model from an AST table.
    ///
    /// `filters` orders the bands, the last one is the reference filter whose
    /// input magnitudes define the model groups. Fails with
    /// [NoiseModelError::EmptyModelSet] when no group passes the
    /// [NoiseModelConfig::min_group_size] cuts.
    pub fn from_asts(
        table: &AstTable,
        filters: impl Into<Vec<String>>,
        vega: &impl ReferenceFlux,
        config: NoiseModelConfig,
        progress: impl ProgressSink,
    ) -> Result<Self, NoiseModelError> {
        let filters = filters.into();
        let vega_fluxes = vega.resolve(&filters)?;
        let models = AstModelSet::aggregate(table, &filters, &config, progress)?;
        let index = KdTree::build(models.log_fluxes()).ok_or(NoiseModelError::EmptyModelSet)?;
        tracing::debug!(
            n_models = index.len(),
            n_dims = index.n_dims(),
            "built the nearest-model index"
        );
        Ok(Self {
            filters,
            vega_fluxes,
            config,
            models,
            index,
        })
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn n_filters(&self) -> usize {
        self.filters.len()
    }

    /// Vega flux per filter, in the physical flux units of the model grids
    pub fn vega_fluxes(&self) -> ArrayView1<'_, f64> {
        self.vega_fluxes.view()
    }

    pub fn config(&self) -> NoiseModelConfig {
        self.config
    }

    /// Per-model statistics backing the interpolation
    pub fn models(&self) -> &AstModelSet {
        &self.models
    }

    /// Interpolates the per-model statistics over a synthetic photometry grid.
    ///
    /// Every grid SED is normalized by the vega fluxes and matched to its
    /// [NoiseModelConfig::n_neighbors] nearest models in log flux space,
    /// whose statistics are averaged with inverse-distance weights. The
    /// averaged covariance matrix is inverted and packed into the likelihood
    /// terms of the output, degenerate matrices are handled per
    /// [NoiseModelConfig::degeneracy].
    ///
    /// `progress` is bumped once per grid row.
    pub fn evaluate(
        &self,
        grid: &SedGrid<'_>,
        mut progress: impl ProgressSink,
    ) -> Result<InterpolatedNoise, NoiseModelError> {
        if grid.n_filters() != self.n_filters() {
            return Err(NoiseModelError::DimensionMismatch {
                grid: grid.n_filters(),
                model: self.n_filters(),
            });
        }

        let n_grid = grid.n_models();
        let mut noise = InterpolatedNoise::zeros(n_grid, self.n_filters());
        let seds = grid.seds();
        let biases = self.models.biases();
        let covariances = self.models.covariances();
        let completeness = self.models.completeness();

        progress.start(n_grid);
        for i in 0..n_grid {
            let query = (&seds.row(i) / &self.vega_fluxes).mapv(f64::log10);
            let neighbors = self.index.nearest(query.view(), self.config.n_neighbors);
            let indices: Vec<_> = neighbors.iter().map(|neighbor| neighbor.index).collect();
            let distances: Vec<_> = neighbors
                .iter()
                .map(|neighbor| neighbor.distance)
                .collect();
            let weights = distance_weights(&distances);

            noise.bias.row_mut(i).assign(&weighted_mean_stack(
                &biases.select(Axis(0), &indices),
                &weights,
            ));
            noise.completeness.row_mut(i).assign(&weighted_mean_stack(
                &completeness.select(Axis(0), &indices),
                &weights,
            ));
            let covariance =
                weighted_mean_stack(&covariances.select(Axis(0), &indices), &weights);
            noise
                .sigma
                .row_mut(i)
                .assign(&covariance.diag().mapv(f64::sqrt));

            match invert_covariance(covariance.view()) {
                Some(inverted) if inverted.det_sign > 0.0 && inverted.ln_abs_det.is_finite() => {
                    let (diag, offdiag) = pack_symmetric(inverted.inverse.view());
                    noise.icov_diag.row_mut(i).assign(&diag);
                    noise.icov_offdiag.row_mut(i).assign(&offdiag);
                    noise.q_norm[i] = -0.5 * inverted.ln_abs_det;
                }
                _ => match self.config.degeneracy {
                    DegeneracyPolicy::Fail => {
                        progress.finish();
                        return Err(NoiseModelError::SingularCovariance { model: i });
                    }
                    DegeneracyPolicy::Flag => {
                        tracing::warn!(model = i, "degenerate interpolated covariance matrix");
                        noise.icov_diag.row_mut(i).fill(f64::NAN);
                        noise.icov_offdiag.row_mut(i).fill(f64::NAN);
                        noise.q_norm[i] = f64::NAN;
                        noise.degenerate.push(i);
                    }
                },
            }
            progress.inc();
        }
        progress.finish();
        tracing::info!(
            n_grid,
            n_degenerate = noise.degenerate.len(),
            "interpolated AST noise over the model grid"
        );

        Ok(noise)
    }
}

/// Noise-model outputs for every row of a [SedGrid], shapes are
/// `(grid models, filters)` unless noted otherwise.
///
/// All flux quantities are vega-normalized, like the model-group statistics
/// they are averaged from.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InterpolatedNoise {
    /// Mean flux bias
    pub bias: Array2<f64>,
    /// One-sigma flux uncertainty
    pub sigma: Array2<f64>,
    /// Recovered fraction
    pub completeness: Array2<f64>,
    /// Diagonal of the inverse covariance matrix
    pub icov_diag: Array2<f64>,
    /// Strictly-upper triangle of the inverse covariance matrix, row-major,
    /// `filters (filters - 1) / 2` wide
    pub icov_offdiag: Array2<f64>,
    /// Likelihood log-normalization `-ln(det) / 2` per grid model
    pub q_norm: Array1<f64>,
    /// Grid rows whose interpolated covariance matrix was degenerate
    pub degenerate: Vec<usize>,
}

impl InterpolatedNoise {
    fn zeros(n_models: usize, n_filters: usize) -> Self {
        Self {
            bias: Array2::zeros((n_models, n_filters)),
            sigma: Array2::zeros((n_models, n_filters)),
            completeness: Array2::zeros((n_models, n_filters)),
            icov_diag: Array2::zeros((n_models, n_filters)),
            icov_offdiag: Array2::zeros((n_models, n_offdiag(n_filters))),
            q_norm: Array1::zeros(n_models),
            degenerate: Vec::new(),
        }
    }

    pub fn n_models(&self) -> usize {
        self.bias.nrows()
    }

    pub fn n_filters(&self) -> usize {
        self.bias.ncols()
    }
}

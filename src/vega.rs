use crate::error::NoiseModelError;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vega-normalized flux of a source with vega magnitude `mag`, `10^(-0.4 mag)`
pub fn mag_to_flux(mag: f64) -> f64 {
    f64::powf(10.0, -0.4 * mag)
}

/// Per-filter vega zero-point flux lookup
///
/// AST inputs are vega magnitudes and recovered rates are vega-normalized
/// fluxes, while model grids carry physical fluxes. Implementations supply
/// the conversion factor between the two unit systems.
pub trait ReferenceFlux {
    /// Vega flux for the filter, `None` when the filter is unknown
    fn reference_flux(&self, filter: &str) -> Option<f64>;

    /// Fluxes for an ordered filter list
    fn resolve(&self, filters: &[String]) -> Result<Array1<f64>, NoiseModelError> {
        let fluxes = filters
            .iter()
            .map(|filter| {
                self.reference_flux(filter)
                    .ok_or_else(|| NoiseModelError::UnknownFilter {
                        filter: filter.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fluxes.into())
    }
}

/// Map-backed [ReferenceFlux] provider
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VegaFluxes(BTreeMap<String, f64>);

impl VegaFluxes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filter: impl Into<String>, flux: f64) -> &mut Self {
        self.0.insert(filter.into(), flux);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ReferenceFlux for VegaFluxes {
    fn reference_flux(&self, filter: &str) -> Option<f64> {
        self.0.get(filter).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for VegaFluxes {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(filter, flux)| (filter.into(), flux))
                .collect(),
        )
    }
}

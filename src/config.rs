use serde::{Deserialize, Serialize};

/// How [crate::AstNoiseModel::evaluate] treats a grid point whose interpolated
/// covariance matrix cannot be inverted or has a non-positive determinant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegeneracyPolicy {
    /// Log a warning, store NaN for the affected outputs and record the grid
    /// row in [crate::InterpolatedNoise::degenerate].
    #[default]
    Flag,
    /// Abort the evaluation with [crate::NoiseModelError::SingularCovariance].
    Fail,
}

/// Estimation and interpolation parameters
///
/// Passed explicitly to every stage, there is no process-wide configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseModelConfig {
    /// Minimum number of usable AST instances for a model group to be retained
    pub min_group_size: usize,
    /// Number of nearest AST models averaged per grid point, clamped to the
    /// retained model count
    pub n_neighbors: usize,
    /// Degenerate-covariance handling during evaluation
    pub degeneracy: DegeneracyPolicy,
}

impl NoiseModelConfig {
    pub fn new(min_group_size: usize, n_neighbors: usize, degeneracy: DegeneracyPolicy) -> Self {
        assert!(
            min_group_size >= 2,
            "min_group_size must be at least 2 for the sample covariance to be defined"
        );
        assert!(n_neighbors > 0, "n_neighbors must be positive");
        Self {
            min_group_size,
            n_neighbors,
            degeneracy,
        }
    }

    #[inline]
    pub fn default_min_group_size() -> usize {
        6
    }

    #[inline]
    pub fn default_n_neighbors() -> usize {
        10
    }
}

impl Default for NoiseModelConfig {
    fn default() -> Self {
        Self::new(
            Self::default_min_group_size(),
            Self::default_n_neighbors(),
            DegeneracyPolicy::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = NoiseModelConfig::default();
        assert_eq!(config.min_group_size, 6);
        assert_eq!(config.n_neighbors, 10);
        assert_eq!(config.degeneracy, DegeneracyPolicy::Flag);
    }

    #[test]
    #[should_panic(expected = "min_group_size")]
    fn too_small_group_size_panics() {
        NoiseModelConfig::new(1, 10, DegeneracyPolicy::Flag);
    }

    #[test]
    #[should_panic(expected = "n_neighbors")]
    fn zero_neighbors_panics() {
        NoiseModelConfig::new(6, 0, DegeneracyPolicy::Flag);
    }

    #[test]
    fn config_ser_json_de() {
        let config = NoiseModelConfig::new(8, 4, DegeneracyPolicy::Fail);
        let roundtrip: NoiseModelConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(config, roundtrip);
    }
}

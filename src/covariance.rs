//! Covariance-matrix algebra shared by estimation and interpolation

use nalgebra::DMatrix;
use ndarray::{Array, Array1, Array2, ArrayView1, ArrayView2, Axis, RemoveAxis};
use ndarray_stats::SummaryStatisticsExt;

/// Number of strictly-upper off-diagonal entries of an `n x n` symmetric matrix
pub fn n_offdiag(n_filters: usize) -> usize {
    n_filters * n_filters.saturating_sub(1) / 2
}

/// Pack a symmetric matrix into its diagonal and strictly-upper triangle
///
/// Off-diagonal entries are ordered row-major, by increasing row then column.
pub fn pack_symmetric(matrix: ArrayView2<'_, f64>) -> (Array1<f64>, Array1<f64>) {
    assert!(matrix.is_square(), "matrix must be square");
    let n = matrix.nrows();
    let diag = matrix.diag().to_owned();
    let mut offdiag = Array1::zeros(n_offdiag(n));
    let mut m = 0;
    for k in 0..n {
        for l in (k + 1)..n {
            offdiag[m] = matrix[[k, l]];
            m += 1;
        }
    }
    (diag, offdiag)
}

/// Rebuild the full symmetric matrix from [pack_symmetric] output
pub fn unpack_symmetric(diag: ArrayView1<'_, f64>, offdiag: ArrayView1<'_, f64>) -> Array2<f64> {
    let n = diag.len();
    assert_eq!(
        offdiag.len(),
        n_offdiag(n),
        "off-diagonal length does not match the diagonal"
    );
    let mut matrix = Array2::zeros((n, n));
    let mut m = 0;
    for k in 0..n {
        matrix[[k, k]] = diag[k];
        for l in (k + 1)..n {
            matrix[[k, l]] = offdiag[m];
            matrix[[l, k]] = offdiag[m];
            m += 1;
        }
    }
    matrix
}

/// Normalized inverse-distance weights
///
/// A zero distance means the query coincides with an indexed point, coincident
/// points then share the full weight and all others get none.
pub(crate) fn distance_weights(distances: &[f64]) -> Array1<f64> {
    assert!(!distances.is_empty(), "at least one neighbor is required");
    let n_coincident = distances.iter().filter(|&&d| d == 0.0).count();
    if n_coincident > 0 {
        let weight = 1.0 / n_coincident as f64;
        return distances
            .iter()
            .map(|&d| if d == 0.0 { weight } else { 0.0 })
            .collect();
    }
    let mut weights: Array1<f64> = distances.iter().map(|&d| 1.0 / d).collect();
    let norm = weights.sum();
    weights /= norm;
    weights
}

/// Weighted mean over the first axis of a stacked array
///
/// [SummaryStatisticsExt::weighted_mean_axis] requires the weights to share
/// the storage type of `self`, hence owned arrays on both sides.
pub(crate) fn weighted_mean_stack<D>(
    stack: &Array<f64, D>,
    weights: &Array1<f64>,
) -> Array<f64, D::Smaller>
where
    D: RemoveAxis,
{
    stack
        .weighted_mean_axis(Axis(0), weights)
        .expect("weights length matches the stack")
}

/// Inverse and sign-and-log-determinant of a square matrix, both derived from
/// a single LU decomposition
#[derive(Clone, Debug)]
pub(crate) struct InvertedCovariance {
    pub inverse: Array2<f64>,
    /// Sign of the determinant, `1.0` or `-1.0`
    pub det_sign: f64,
    /// Natural log of the absolute determinant
    pub ln_abs_det: f64,
}

/// `None` when the matrix is singular
///
/// The log-determinant form stays representable where the determinant itself
/// underflows, which is the normal situation for covariances of faint
/// vega-normalized fluxes.
pub(crate) fn invert_covariance(matrix: ArrayView2<'_, f64>) -> Option<InvertedCovariance> {
    assert!(matrix.is_square(), "matrix must be square");
    let n = matrix.nrows();
    let lu = DMatrix::from_row_iterator(n, n, matrix.iter().copied()).lu();
    let inverse = lu.try_inverse()?;
    // All pivots are non-zero here, otherwise try_inverse had failed
    let mut det_sign: f64 = lu.p().determinant();
    let mut ln_abs_det = 0.0;
    for &pivot in lu.u().diagonal().iter() {
        det_sign *= pivot.signum();
        ln_abs_det += pivot.abs().ln();
    }
    Some(InvertedCovariance {
        inverse: Array2::from_shape_fn((n, n), |(row, col)| inverse[(row, col)]),
        det_sign,
        ln_abs_det,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::{array, Array3, stack};

    #[test]
    fn n_offdiag_counts() {
        assert_eq!(n_offdiag(0), 0);
        assert_eq!(n_offdiag(1), 0);
        assert_eq!(n_offdiag(2), 1);
        assert_eq!(n_offdiag(6), 15);
    }

    #[test]
    fn pack_ordering() {
        let matrix = array![[1.0, 2.0, 3.0], [2.0, 4.0, 5.0], [3.0, 5.0, 6.0]];
        let (diag, offdiag) = pack_symmetric(matrix.view());
        assert_eq!(diag.to_vec(), vec![1.0, 4.0, 6.0]);
        assert_eq!(offdiag.to_vec(), vec![2.0, 3.0, 5.0]);
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let matrix = array![
            [2.0, -0.5, 0.25, 1.0],
            [-0.5, 3.0, -1.5, 0.125],
            [0.25, -1.5, 4.0, 2.5],
            [1.0, 0.125, 2.5, 5.0],
        ];
        let (diag, offdiag) = pack_symmetric(matrix.view());
        assert_eq!(unpack_symmetric(diag.view(), offdiag.view()), matrix);
    }

    #[test]
    fn weights_are_normalized_and_inverse_to_distance() {
        let weights = distance_weights(&[1.0, 2.0, 4.0]);
        assert_relative_eq!(weights.sum(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(weights[0], 4.0 / 7.0, epsilon = 1e-15);
        assert_relative_eq!(weights[1], 2.0 / 7.0, epsilon = 1e-15);
        assert_relative_eq!(weights[2], 1.0 / 7.0, epsilon = 1e-15);
    }

    #[test]
    fn coincident_point_takes_the_full_weight() {
        let weights = distance_weights(&[0.0, 1.0, 2.0]);
        assert_eq!(weights.to_vec(), vec![1.0, 0.0, 0.0]);

        let weights = distance_weights(&[0.0, 1.0, 0.0]);
        assert_eq!(weights.to_vec(), vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn weighted_mean_is_order_independent() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[10.0, 20.0], [30.0, 40.0]];
        let c = array![[100.0, 200.0], [300.0, 400.0]];
        let stacked: Array3<f64> =
            stack(Axis(0), &[a.view(), b.view(), c.view()]).unwrap();
        let permuted: Array3<f64> =
            stack(Axis(0), &[c.view(), a.view(), b.view()]).unwrap();

        let weights = array![0.5, 0.3, 0.2];
        let weights_permuted = array![0.2, 0.5, 0.3];

        let mean = weighted_mean_stack(&stacked, &weights);
        let mean_permuted = weighted_mean_stack(&permuted, &weights_permuted);
        assert_relative_eq!(mean, mean_permuted, epsilon = 1e-12);
    }

    #[test]
    fn invert_two_by_two() {
        let matrix = array![[4.0, 1.0], [1.0, 9.0]];
        let inverted = invert_covariance(matrix.view()).unwrap();
        let expected = array![[9.0 / 35.0, -1.0 / 35.0], [-1.0 / 35.0, 4.0 / 35.0]];
        assert_relative_eq!(inverted.inverse, expected, epsilon = 1e-12);
        assert_eq!(inverted.det_sign, 1.0);
        assert_relative_eq!(inverted.ln_abs_det, 35.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn singular_matrix_is_none() {
        let matrix = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(invert_covariance(matrix.view()).is_none());
    }

    #[test]
    fn negative_determinant_sign() {
        let matrix = array![[0.0, 1.0], [1.0, 0.0]];
        let inverted = invert_covariance(matrix.view()).unwrap();
        assert_eq!(inverted.det_sign, -1.0);
        assert_relative_eq!(inverted.ln_abs_det, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn log_determinant_survives_underflow() {
        // det = 1e-400 is not representable in f64, its log is
        let matrix = array![[1e-200, 0.0], [0.0, 1e-200]];
        let inverted = invert_covariance(matrix.view()).unwrap();
        assert_eq!(inverted.det_sign, 1.0);
        assert_relative_eq!(
            inverted.ln_abs_det,
            2.0 * 1e-200_f64.ln(),
            epsilon = 1e-9
        );
        assert_relative_eq!(inverted.inverse[[0, 0]], 1e200, max_relative = 1e-12);
    }
}

//! Linear least-squares helpers.
//!
//! Each Levenberg–Marquardt step is a small linear least-squares problem:
//!
//! ```text
//! minimize ‖A δ - r‖²
//! ```
//!
//! where `A` is the weighted Jacobian stacked on top of the damping rows.
//!
//! Implementation choices:
//! - We solve with SVD so that tall (more rows than columns) and nearly
//!   collinear systems are handled without forming `AᵀA` explicitly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter covariance at the solution is `(JᵀJ)⁻¹`, computed from the
//!   same decomposition as `V Σ⁻² Vᵀ`.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(a: &DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(x) = svd.solve(rhs, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}

/// Compute `(JᵀJ)⁻¹` from the SVD of `J`.
///
/// Singular values below `max(s) * max(rows, cols) * f64::EPSILON` are treated
/// as zero; if any is, `JᵀJ` is singular and `None` is returned.
pub fn normal_matrix_inverse(j: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let cols = j.ncols();
    if j.nrows() < cols {
        return None;
    }

    let svd = j.clone().svd(false, true);
    let v_t = svd.v_t?;
    let s = &svd.singular_values;
    if s.len() < cols {
        return None;
    }

    let s_max = s.iter().copied().fold(0.0_f64, f64::max);
    let threshold = s_max * j.nrows().max(cols) as f64 * f64::EPSILON;
    if s.iter().any(|&v| !(v > threshold)) {
        return None;
    }

    let inv_sq = DMatrix::from_diagonal(&s.map(|v| 1.0 / (v * v)));
    let cov = v_t.transpose() * inv_sq * v_t;
    if cov.iter().all(|v| v.is_finite()) {
        Some(cov)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&a, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn normal_inverse_matches_direct_inverse() {
        let j = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 4.0]);
        let direct = (j.transpose() * &j).try_inverse().unwrap();
        let via_svd = normal_matrix_inverse(&j).unwrap();
        for (a, b) in direct.iter().zip(via_svd.iter()) {
            assert!((a - b).abs() < 1e-10, "{a} vs {b}");
        }
    }

    #[test]
    fn normal_inverse_rejects_collinear_columns() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(normal_matrix_inverse(&j).is_none());
    }

    #[test]
    fn normal_inverse_rejects_short_matrix() {
        let j = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        assert!(normal_matrix_inverse(&j).is_none());
    }
}

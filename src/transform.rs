//! The unscented transform: sigma point generation and moment recovery
//!
//! The unscented transform represents a Gaussian distribution by a small
//! deterministic set of weighted sample points, propagates those points
//! through an arbitrary nonlinear function, and recovers the mean and
//! covariance of the result. It is the core of the Unscented Kalman Filter
//! but is useful on its own whenever a distribution must be pushed through a
//! nonlinearity without Jacobians.
//!
//! # Sigma Point Selection
//!
//! For an `n`-dimensional mean and covariance this implementation uses the
//! symmetric selection:
//! - χ₀ = μ (mean)
//! - χᵢ = μ + √((n+λ)P)ᵢ for i = 1...n
//! - χᵢ₊ₙ = μ - √((n+λ)P)ᵢ for i = 1...n
//!
//! where λ = α²(n+κ) - n is the scaling parameter and √((n+λ)P)ᵢ is the
//! i-th column of a matrix square root.
//!
//! # Degenerate Covariances
//!
//! The square root tolerates positive semi-definite input: an axis with zero
//! (or numerically zero) variance contributes zero spread, so its sigma
//! points coincide with the mean instead of producing NaNs.

use alloc::vec::Vec;

use nalgebra::{DMatrix, DVector, RealField};
use num_traits::Float;

use crate::types::normalize::{IdentityNormalize, Normalize};
use crate::types::spaces::{Covariance, CrossCovariance, Vector};
use crate::{FilterError, Result};

// ============================================================================
// Transform Parameters
// ============================================================================

/// Scaling parameters of the unscented transform.
///
/// These parameters control the sigma point spread and weighting.
///
/// # Common Parameter Choices
///
/// - **Van der Merwe**: α=1e-3, β=2, κ=0 (good default)
/// - **Scaled UKF**: α=1, β=2, κ=3-n
#[derive(Debug, Clone, Copy)]
pub struct TransformParams<T: RealField> {
    /// Primary scaling parameter (controls sigma point spread)
    ///
    /// Typical values: 1e-4 ≤ α ≤ 1. Smaller α puts sigma points closer to
    /// the mean.
    pub alpha: T,

    /// Secondary scaling parameter (incorporates prior knowledge of the
    /// distribution)
    ///
    /// For Gaussian distributions, β=2 is optimal.
    pub beta: T,

    /// Tertiary scaling parameter
    ///
    /// Common choices: κ=0 or κ=3-n.
    pub kappa: T,
}

impl<T: RealField + Float> Default for TransformParams<T> {
    fn default() -> Self {
        Self {
            alpha: T::from_f64(1e-3).unwrap(),
            beta: T::from_f64(2.0).unwrap(),
            kappa: T::zero(),
        }
    }
}

impl<T: RealField + Float + Copy> TransformParams<T> {
    /// Creates new transform parameters.
    ///
    /// # Panics
    /// Panics if α ≤ 0.
    pub fn new(alpha: T, beta: T, kappa: T) -> Self {
        assert!(alpha > T::zero(), "Alpha must be positive");
        Self { alpha, beta, kappa }
    }
}

// ============================================================================
// Sigma Points
// ============================================================================

/// A weighted sigma point set capturing a distribution's first two moments.
///
/// For an `n`-dimensional distribution there are `2n+1` points. The two
/// weight sequences run parallel to the points: `w_mean` weights the mean
/// recovery, `w_cov` the covariance recovery. A transformed sigma set (the
/// output of a motion or sensor model) keeps the weights of the set it was
/// derived from, which is what makes cross-covariances between the two sets
/// meaningful.
#[derive(Debug, Clone)]
pub struct SigmaPoints<T: RealField, Space> {
    /// The sigma points: [χ₀, χ₁, ..., χ₂ₙ]
    pub points: Vec<Vector<T, Space>>,
    /// Weights for mean recovery, one per point
    pub w_mean: DVector<T>,
    /// Weights for covariance recovery, one per point
    pub w_cov: DVector<T>,
}

impl<T: RealField + Copy, Space> SigmaPoints<T, Space> {
    /// Number of sigma points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimension of the points.
    #[inline]
    pub fn dim(&self) -> usize {
        self.points.first().map(|p| p.len()).unwrap_or(0)
    }

    /// Applies a function to every point, carrying the weights over into the
    /// target space.
    pub fn map<B, F>(&self, f: F) -> SigmaPoints<T, B>
    where
        F: Fn(&Vector<T, Space>) -> Vector<T, B>,
    {
        SigmaPoints {
            points: self.points.iter().map(f).collect(),
            w_mean: self.w_mean.clone(),
            w_cov: self.w_cov.clone(),
        }
    }
}

// ============================================================================
// Unscented Transform
// ============================================================================

/// Result of pushing a distribution through a nonlinear function with
/// [`UnscentedTransform::transform`].
#[derive(Debug, Clone)]
pub struct Transformed<T: RealField, A, B> {
    /// Mean of the transformed distribution
    pub mean: Vector<T, B>,
    /// Covariance of the transformed distribution
    pub covariance: Covariance<T, B>,
    /// Cross-covariance between input and output, if requested
    pub cross_covariance: Option<CrossCovariance<T, A, B>>,
}

/// The unscented transform engine.
///
/// Stateless apart from its three scaling parameters; all methods are
/// deterministic computations over their arguments.
#[derive(Debug, Clone)]
pub struct UnscentedTransform<T: RealField> {
    params: TransformParams<T>,
}

impl<T: RealField + Float> Default for UnscentedTransform<T> {
    fn default() -> Self {
        Self {
            params: TransformParams::default(),
        }
    }
}

impl<T: RealField + Float + Copy> UnscentedTransform<T> {
    /// Creates a transform with the given scaling parameters.
    #[inline]
    pub fn new(params: TransformParams<T>) -> Self {
        Self { params }
    }

    /// The scaling parameters in use.
    #[inline]
    pub fn params(&self) -> &TransformParams<T> {
        &self.params
    }

    /// Computes the scaling parameter λ = α²(n + κ) - n for dimension `n`.
    #[inline]
    pub fn lambda(&self, n: usize) -> T {
        let n_t = T::from_usize(n).unwrap();
        self.params.alpha * self.params.alpha * (n_t + self.params.kappa) - n_t
    }

    /// Generates the sigma points of a distribution.
    ///
    /// Every point passes through `normalize` so the set is canonical from
    /// the start. Zero-variance axes collapse to the mean (see the module
    /// documentation).
    ///
    /// # Errors
    /// [`FilterError::DimensionMismatch`] if `cov` is not square of the
    /// mean's dimension.
    pub fn sigma_points<Space>(
        &self,
        mean: &Vector<T, Space>,
        cov: &Covariance<T, Space>,
        normalize: &dyn Normalize<T>,
    ) -> Result<SigmaPoints<T, Space>> {
        let n = mean.len();
        if cov.dim() != n {
            return Err(FilterError::DimensionMismatch {
                what: "covariance vs mean",
                expected: n,
                actual: cov.dim(),
            });
        }

        let lambda = self.lambda(n);
        let scale = T::from_usize(n).unwrap() + lambda;
        let root = psd_sqrt(&(cov.as_matrix() * scale));

        let num_points = 2 * n + 1;
        let mut points = Vec::with_capacity(num_points);

        points.push(Vector::from_dvector(
            normalize.normalize(mean.as_dvector().clone()),
        ));
        for i in 0..n {
            points.push(Vector::from_dvector(
                normalize.normalize(mean.as_dvector() + root.column(i)),
            ));
        }
        for i in 0..n {
            points.push(Vector::from_dvector(
                normalize.normalize(mean.as_dvector() - root.column(i)),
            ));
        }

        let w_i = T::one() / (T::from_f64(2.0).unwrap() * scale);
        let mut w_mean = DVector::from_element(num_points, w_i);
        w_mean[0] = lambda / scale;
        let mut w_cov = w_mean.clone();
        w_cov[0] += T::one() - self.params.alpha * self.params.alpha + self.params.beta;

        Ok(SigmaPoints {
            points,
            w_mean,
            w_cov,
        })
    }

    /// Recovers the mean of a sigma point set.
    ///
    /// The weighted sum is formed first and `normalize` applied once to the
    /// result.
    pub fn recover_mean<Space>(
        &self,
        sigma: &SigmaPoints<T, Space>,
        normalize: &dyn Normalize<T>,
    ) -> Vector<T, Space> {
        let mut mean = DVector::zeros(sigma.dim());
        for (i, point) in sigma.points.iter().enumerate() {
            mean += point.as_dvector() * sigma.w_mean[i];
        }
        Vector::from_dvector(normalize.normalize(mean))
    }

    /// Recovers the covariance of a sigma point set around a mean.
    ///
    /// Each residual is canonicalized by `normalize` before the outer
    /// product, which keeps circular components from inflating the spread.
    pub fn recover_covariance<Space>(
        &self,
        sigma: &SigmaPoints<T, Space>,
        mean: &Vector<T, Space>,
        normalize: &dyn Normalize<T>,
    ) -> Covariance<T, Space> {
        let dim = mean.len();
        let mut cov = DMatrix::zeros(dim, dim);
        for (i, point) in sigma.points.iter().enumerate() {
            let diff = normalize.normalize(point.as_dvector() - mean.as_dvector());
            cov += (&diff * diff.transpose()) * sigma.w_cov[i];
        }
        Covariance::from_matrix(cov)
    }

    /// Recovers mean and covariance in one call.
    pub fn recover_distribution<Space>(
        &self,
        sigma: &SigmaPoints<T, Space>,
        normalize: &dyn Normalize<T>,
    ) -> (Vector<T, Space>, Covariance<T, Space>) {
        let mean = self.recover_mean(sigma, normalize);
        let cov = self.recover_covariance(sigma, &mean, normalize);
        (mean, cov)
    }

    /// Computes the cross-covariance between two sigma point sets.
    ///
    /// The sets must originate from the same sigma point index (one being a
    /// transform of the other), so they share point count and weights; the
    /// covariance weights of set `A` are applied. Residuals of each set are
    /// canonicalized by that set's normalizer.
    ///
    /// # Errors
    /// [`FilterError::DimensionMismatch`] if the sets differ in point count.
    pub fn cross_covariance<A, B>(
        &self,
        mean_a: &Vector<T, A>,
        sigma_a: &SigmaPoints<T, A>,
        normalize_a: &dyn Normalize<T>,
        mean_b: &Vector<T, B>,
        sigma_b: &SigmaPoints<T, B>,
        normalize_b: &dyn Normalize<T>,
    ) -> Result<CrossCovariance<T, A, B>> {
        if sigma_a.len() != sigma_b.len() {
            return Err(FilterError::DimensionMismatch {
                what: "sigma point count",
                expected: sigma_a.len(),
                actual: sigma_b.len(),
            });
        }

        let mut cross = DMatrix::zeros(mean_a.len(), mean_b.len());
        for i in 0..sigma_a.len() {
            let diff_a =
                normalize_a.normalize(sigma_a.points[i].as_dvector() - mean_a.as_dvector());
            let diff_b =
                normalize_b.normalize(sigma_b.points[i].as_dvector() - mean_b.as_dvector());
            cross += (&diff_a * diff_b.transpose()) * sigma_a.w_cov[i];
        }
        Ok(CrossCovariance::from_matrix(cross))
    }

    /// Pushes a distribution through a nonlinear function.
    ///
    /// Generates sigma points from `(mean, cov)`, applies `f` independently
    /// to every point, and recovers the transformed mean and covariance —
    /// plus the input/output cross-covariance when `with_cross` is set.
    ///
    /// # Errors
    /// [`FilterError::DimensionMismatch`] if `cov` does not match `mean`.
    pub fn transform<A, B, F>(
        &self,
        mean: &Vector<T, A>,
        cov: &Covariance<T, A>,
        f: F,
        with_cross: bool,
    ) -> Result<Transformed<T, A, B>>
    where
        F: Fn(&Vector<T, A>) -> Vector<T, B>,
    {
        let identity = IdentityNormalize;
        let sigma = self.sigma_points(mean, cov, &identity)?;
        let mapped = sigma.map(f);

        let (t_mean, t_cov) = self.recover_distribution(&mapped, &identity);
        let cross = if with_cross {
            Some(self.cross_covariance(mean, &sigma, &identity, &t_mean, &mapped, &identity)?)
        } else {
            None
        };

        Ok(Transformed {
            mean: t_mean,
            covariance: t_cov,
            cross_covariance: cross,
        })
    }
}

// ============================================================================
// Matrix Square Root
// ============================================================================

/// Lower-triangular square root L with L·Lᵗ = A for a symmetric positive
/// semi-definite A.
///
/// Standard Cholesky fails on semi-definite input; here a pivot at or below
/// machine epsilon zeroes its entire column instead, so degenerate axes
/// contribute no spread.
fn psd_sqrt<T: RealField + Float + Copy>(a: &DMatrix<T>) -> DMatrix<T> {
    let n = a.nrows();
    let mut l = DMatrix::zeros(n, n);

    for j in 0..n {
        let mut pivot = a[(j, j)];
        for k in 0..j {
            pivot -= l[(j, k)] * l[(j, k)];
        }
        if pivot <= T::epsilon() {
            continue;
        }

        let l_jj = Float::sqrt(pivot);
        l[(j, j)] = l_jj;
        for i in (j + 1)..n {
            let mut s = a[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / l_jj;
        }
    }

    l
}

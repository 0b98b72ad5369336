//! Vector space markers and typed vectors
//!
//! This module provides type-safe vectors that cannot be accidentally mixed
//! across different mathematical spaces (state, control, observation). The
//! dimensions themselves are runtime values; only the space is a compile-time
//! property, so mixing a state vector with an observation vector is a type
//! error while a dimension disagreement inside one space surfaces as a
//! runtime [`FilterError::DimensionMismatch`](crate::FilterError).

use ::core::marker::PhantomData;
use ::core::ops::{Add, Mul, Sub};
use nalgebra::{DMatrix, DVector, RealField, Scalar};

// ============================================================================
// Vector Space Markers
// ============================================================================

/// Marker type for state space vectors (e.g., pose, velocity)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace;

/// Marker type for control space vectors (e.g., commanded velocities)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSpace;

/// Marker type for observation space vectors (stacked sensor measurements)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationSpace;

// ============================================================================
// Typed Vector
// ============================================================================

/// A dynamically sized vector bound to a mathematical space.
///
/// # Type Parameters
///
/// - `T`: The scalar type (typically `f32` or `f64`)
/// - `Space`: A marker type indicating which mathematical space this vector
///   belongs to
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T: Scalar, Space> {
    inner: DVector<T>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, Space> Vector<T, Space> {
    /// Creates a new vector from raw components.
    #[inline]
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            inner: DVector::from_column_slice(data),
            _marker: PhantomData,
        }
    }

    /// Creates a new vector from an nalgebra `DVector`.
    #[inline]
    pub fn from_dvector(inner: DVector<T>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying nalgebra vector.
    #[inline]
    pub fn as_dvector(&self) -> &DVector<T> {
        &self.inner
    }

    /// Consumes self and returns the underlying nalgebra vector.
    #[inline]
    pub fn into_dvector(self) -> DVector<T> {
        self.inner
    }

    /// Returns a reference to the raw data slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    /// Number of components.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.nrows()
    }

    /// Whether the vector has zero components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.nrows() == 0
    }

    /// Access element at index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.inner.get(index)
    }

    /// Access element at index (unchecked).
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn index(&self, index: usize) -> &T {
        &self.inner[index]
    }
}

impl<T: RealField + Copy, Space> Vector<T, Space> {
    /// Creates a zero vector of the given dimension.
    #[inline]
    pub fn zeros(dim: usize) -> Self {
        Self {
            inner: DVector::zeros(dim),
            _marker: PhantomData,
        }
    }

    /// Computes the Euclidean norm.
    #[inline]
    pub fn norm(&self) -> T {
        self.inner.norm()
    }
}

impl<T: Scalar, Space> Vector<T, Space> {
    /// Stacks the columns of a measurement matrix into one vector.
    ///
    /// Observation matrices carry one measurement block per column; this is
    /// the canonical flattening used throughout the filter, so a `d x k`
    /// matrix of `k` repeated measurements becomes a `d * k` vector with
    /// block `j` occupying components `j*d .. (j+1)*d`.
    #[inline]
    pub fn from_column_stacked(mat: &DMatrix<T>) -> Self {
        Self {
            inner: DVector::from_column_slice(mat.as_slice()),
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Type Aliases
// ============================================================================

/// A state vector in state space.
pub type StateVector<T> = Vector<T, StateSpace>;

/// A control vector (system inputs between two estimation steps).
pub type ControlVector<T> = Vector<T, ControlSpace>;

/// A flattened, column-stacked observation vector.
pub type Observation<T> = Vector<T, ObservationSpace>;

// ============================================================================
// Operations: Same-Space Arithmetic
// ============================================================================

impl<T: RealField + Copy, Space> Add for Vector<T, Space> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner + rhs.inner,
            _marker: PhantomData,
        }
    }
}

impl<T: RealField + Copy, Space> Sub for Vector<T, Space> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner - rhs.inner,
            _marker: PhantomData,
        }
    }
}

impl<T: RealField + Copy, Space> Mul<T> for Vector<T, Space> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            inner: self.inner * rhs,
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Covariance Matrix
// ============================================================================

/// A covariance matrix bound to a specific vector space.
///
/// Covariance matrices are symmetric positive semi-definite matrices that
/// describe the uncertainty in a vector estimate.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance<T: Scalar, Space> {
    inner: DMatrix<T>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, Space> Covariance<T, Space> {
    /// Creates a covariance matrix from a raw matrix.
    ///
    /// The caller should ensure the matrix is symmetric and positive
    /// semi-definite.
    ///
    /// # Panics
    /// Panics if the matrix is not square.
    #[inline]
    pub fn from_matrix(inner: DMatrix<T>) -> Self {
        assert!(inner.is_square(), "Covariance matrix must be square");
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying matrix.
    #[inline]
    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.inner
    }

    /// Consumes self and returns the underlying matrix.
    #[inline]
    pub fn into_matrix(self) -> DMatrix<T> {
        self.inner
    }

    /// Dimension of the space the matrix describes.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }
}

impl<T: RealField + Copy, Space> Covariance<T, Space> {
    /// Creates a zero covariance matrix of the given dimension.
    #[inline]
    pub fn zeros(dim: usize) -> Self {
        Self {
            inner: DMatrix::zeros(dim, dim),
            _marker: PhantomData,
        }
    }

    /// Creates an identity covariance matrix of the given dimension.
    #[inline]
    pub fn identity(dim: usize) -> Self {
        Self {
            inner: DMatrix::identity(dim, dim),
            _marker: PhantomData,
        }
    }

    /// Creates a diagonal covariance matrix.
    #[inline]
    pub fn from_diagonal(diag: &DVector<T>) -> Self {
        Self {
            inner: DMatrix::from_diagonal(diag),
            _marker: PhantomData,
        }
    }

    /// Adds two covariance matrices.
    ///
    /// # Panics
    /// Panics if the dimensions differ.
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            inner: &self.inner + &other.inner,
            _marker: PhantomData,
        }
    }

    /// Computes the trace of the covariance matrix.
    #[inline]
    pub fn trace(&self) -> T {
        self.inner.trace()
    }

    /// Attempts to compute the inverse of the covariance matrix.
    #[inline]
    pub fn try_inverse(&self) -> Option<Self> {
        self.inner.clone().try_inverse().map(|inner| Self {
            inner,
            _marker: PhantomData,
        })
    }

    /// Replicates this matrix as blocks along the diagonal of a larger one.
    ///
    /// This is the noise model for `copies` repeated measurements of the same
    /// sensor type: each measurement carries this matrix as its own noise
    /// block, and distinct measurements are uncorrelated, so every off-block
    /// entry is zero. A `d x d` block replicated `copies` times yields a
    /// `d*copies x d*copies` matrix.
    pub fn replicate(&self, copies: usize) -> Self {
        let d = self.inner.nrows();
        let mut tiled = DMatrix::zeros(d * copies, d * copies);
        for block in 0..copies {
            tiled
                .view_mut((block * d, block * d), (d, d))
                .copy_from(&self.inner);
        }
        Self {
            inner: tiled,
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Type Aliases for Covariance
// ============================================================================

/// Covariance matrix in state space.
pub type StateCovariance<T> = Covariance<T, StateSpace>;

/// Covariance matrix in observation space.
pub type ObservationCovariance<T> = Covariance<T, ObservationSpace>;

// ============================================================================
// Cross-Covariance
// ============================================================================

/// A cross-covariance between two spaces: rows belong to space `A`, columns
/// to space `B`.
///
/// The Kalman gain is formed from a state-observation cross-covariance, so
/// keeping the two spaces in the type prevents transposed usage.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossCovariance<T: Scalar, A, B> {
    inner: DMatrix<T>,
    _marker: PhantomData<(A, B)>,
}

impl<T: Scalar, A, B> CrossCovariance<T, A, B> {
    /// Creates a cross-covariance from a raw matrix.
    #[inline]
    pub fn from_matrix(inner: DMatrix<T>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying matrix.
    #[inline]
    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.inner
    }

    /// Consumes self and returns the underlying matrix.
    #[inline]
    pub fn into_matrix(self) -> DMatrix<T> {
        self.inner
    }

    /// Row dimension (space `A`).
    #[inline]
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Column dimension (space `B`).
    #[inline]
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }
}

/// Cross-covariance between the state and the predicted observations.
pub type StateObservationCov<T> = CrossCovariance<T, StateSpace, ObservationSpace>;

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn test_state_vector_operations() {
        let v1: StateVector<f64> = StateVector::from_slice(&[1.0, 2.0, 3.0]);
        let v2: StateVector<f64> = StateVector::from_slice(&[0.5, 1.0, 1.5]);

        let sum = v1.clone() + v2.clone();
        assert!((sum.index(0) - 1.5).abs() < 1e-10);
        assert!((sum.index(2) - 4.5).abs() < 1e-10);

        let diff = v1 - v2;
        assert!((diff.index(1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_column_stacked_flattening() {
        // Columns are measurement blocks: [(1, 2), (3, 4)] stacks to (1, 2, 3, 4)
        let mat = dmatrix![1.0, 3.0; 2.0, 4.0];
        let obs: Observation<f64> = Observation::from_column_stacked(&mat);

        assert_eq!(obs.len(), 4);
        assert_eq!(obs.as_slice(), &[1.0, 2.0, 3.0, 4.0][..]);
    }

    #[test]
    fn test_covariance_replicate() {
        let block: ObservationCovariance<f64> =
            ObservationCovariance::from_matrix(dmatrix![4.0, 0.5; 0.5, 9.0]);
        let tiled = block.replicate(2);

        assert_eq!(tiled.dim(), 4);
        let expected = dmatrix![
            4.0, 0.5, 0.0, 0.0;
            0.5, 9.0, 0.0, 0.0;
            0.0, 0.0, 4.0, 0.5;
            0.0, 0.0, 0.5, 9.0
        ];
        assert_eq!(tiled.as_matrix(), &expected);
    }

    #[test]
    fn test_covariance_from_diagonal() {
        let cov: StateCovariance<f64> = StateCovariance::from_diagonal(&dvector![1.0, 2.0, 3.0]);
        assert_eq!(cov.dim(), 3);
        assert!((cov.trace() - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_singular_covariance_inverse() {
        let singular: StateCovariance<f64> =
            StateCovariance::from_matrix(dmatrix![1.0, 1.0; 1.0, 1.0]);
        assert!(singular.try_inverse().is_none());
    }
}

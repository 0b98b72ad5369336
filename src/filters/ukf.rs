//! Unscented Kalman Filter for nonlinear state estimation
//!
//! The UKF composes the [unscented transform](crate::transform) with
//! externally supplied motion and sensor capabilities. It holds the current
//! belief (mean + covariance); each predict step pushes the belief's sigma
//! points through the motion model, each correct step pushes them through the
//! sensor model and folds the measurement back in via the Kalman gain. No
//! Jacobians are required of either model.
//!
//! # Observations
//!
//! Raw observations arrive as a matrix with one measurement block per
//! column. The filter flattens it column-wise and tiles the single-block
//! sensor noise covariance block-diagonally across the repeated
//! measurements, so `k` measurements of a `d`-dimensional sensor yield a
//! `d*k` observation vector with a `d*k x d*k` noise matrix.
//!
//! # Example
//!
//! ```
//! use kalmar::filters::ukf::UnscentedKalmanFilter;
//! use kalmar::models::{ConstantVelocity2D, PositionSensor2D};
//! use kalmar::types::spaces::{ControlVector, StateCovariance, StateVector};
//! use nalgebra::{dmatrix, DMatrix};
//!
//! let mut filter = UnscentedKalmanFilter::new(
//!     ConstantVelocity2D::new(1.0),
//!     PositionSensor2D::new(),
//! );
//!
//! // State [x, y, vx, vy]
//! filter
//!     .init(
//!         StateVector::from_slice(&[0.0, 0.0, 1.0, 0.0]),
//!         StateCovariance::identity(4),
//!     )
//!     .unwrap();
//!
//! // Predict one step, then correct with a position fix at (1.1, 0.1)
//! let controls = ControlVector::from_slice(&[]);
//! let motion_noise = StateCovariance::identity(4);
//! filter
//!     .predict(&controls, &DMatrix::zeros(0, 0), &motion_noise)
//!     .unwrap();
//!
//! let observations = dmatrix![1.1; 0.1];
//! let sensor_noise = kalmar::types::spaces::ObservationCovariance::identity(2);
//! filter.correct(&observations, &sensor_noise).unwrap();
//!
//! let belief = filter.estimate().unwrap();
//! assert_eq!(belief.mean.len(), 4);
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use nalgebra::{DMatrix, RealField};
use num_traits::Float;

use crate::models::{MotionModel, SensorModel};
use crate::transform::{SigmaPoints, TransformParams, UnscentedTransform};
use crate::types::normalize::{IdentityNormalize, Normalize};
use crate::types::spaces::{
    ControlVector, Observation, ObservationCovariance, StateCovariance, StateVector,
};
use crate::{FilterError, Result};

// ============================================================================
// Belief
// ============================================================================

/// The filter's current estimate: a Gaussian over the state.
///
/// Owned exclusively by one filter instance and replaced wholesale on every
/// predict/correct; [`UnscentedKalmanFilter::estimate`] hands out read-only
/// snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Belief<T: RealField> {
    /// State estimate mean
    pub mean: StateVector<T>,
    /// State estimate covariance
    pub covariance: StateCovariance<T>,
}

impl<T: RealField + Copy> Belief<T> {
    /// Creates a new belief.
    #[inline]
    pub fn new(mean: StateVector<T>, covariance: StateCovariance<T>) -> Self {
        Self { mean, covariance }
    }

    /// State dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Returns the trace of the covariance matrix (sum of variances).
    #[inline]
    pub fn uncertainty(&self) -> T {
        self.covariance.trace()
    }
}

// ============================================================================
// Unscented Kalman Filter
// ============================================================================

/// An Unscented Kalman Filter over runtime-dimensioned states.
///
/// # Type Parameters
///
/// - `T`: Scalar type
/// - `M`: Motion model capability (must implement [`MotionModel`])
/// - `S`: Sensor model capability (must implement [`SensorModel`])
///
/// # Lifecycle
///
/// A fresh filter is uninitialized; [`init`](Self::init) installs the first
/// belief and fixes the state dimension. From then on
/// [`predict`](Self::predict) and [`correct`](Self::correct) may be called in
/// any order, indefinitely.
pub struct UnscentedKalmanFilter<T, M, S>
where
    T: RealField,
    M: MotionModel<T>,
    S: SensorModel<T>,
{
    /// Motion (process) model capability
    pub motion: M,
    /// Sensor (observation) model capability
    pub sensor: S,
    transform: UnscentedTransform<T>,
    normalize_state: Box<dyn Normalize<T>>,
    normalize_observation: Box<dyn Normalize<T>>,
    belief: Option<Belief<T>>,
}

impl<T, M, S> UnscentedKalmanFilter<T, M, S>
where
    T: RealField + Float + Copy,
    M: MotionModel<T>,
    S: SensorModel<T>,
{
    /// Creates a new filter with default transform parameters and identity
    /// normalization in both spaces.
    pub fn new(motion: M, sensor: S) -> Self {
        Self::with_params(motion, sensor, TransformParams::default())
    }

    /// Creates a new filter with custom transform parameters.
    pub fn with_params(motion: M, sensor: S, params: TransformParams<T>) -> Self {
        Self {
            motion,
            sensor,
            transform: UnscentedTransform::new(params),
            normalize_state: Box::new(IdentityNormalize),
            normalize_observation: Box::new(IdentityNormalize),
            belief: None,
        }
    }

    /// Installs a state-space normalization strategy.
    ///
    /// Affects all subsequent predict/correct calls, not past ones.
    pub fn set_state_normalizer(&mut self, normalize: Box<dyn Normalize<T>>) {
        self.normalize_state = normalize;
    }

    /// Installs an observation-space normalization strategy.
    ///
    /// Affects all subsequent predict/correct calls, not past ones.
    pub fn set_observation_normalizer(&mut self, normalize: Box<dyn Normalize<T>>) {
        self.normalize_observation = normalize;
    }

    /// The current belief, or `None` before [`init`](Self::init).
    #[inline]
    pub fn estimate(&self) -> Option<&Belief<T>> {
        self.belief.as_ref()
    }

    /// Installs the initial belief and fixes the state dimension.
    ///
    /// # Errors
    /// [`FilterError::DimensionMismatch`] if `covariance` is not square of
    /// the state dimension.
    pub fn init(&mut self, mean: StateVector<T>, covariance: StateCovariance<T>) -> Result<()> {
        if covariance.dim() != mean.len() {
            return Err(FilterError::DimensionMismatch {
                what: "initial covariance vs state",
                expected: mean.len(),
                actual: covariance.dim(),
            });
        }
        self.belief = Some(Belief::new(mean, covariance));
        Ok(())
    }

    /// Prediction step: propagates the belief through the motion model.
    ///
    /// The belief's sigma points are each passed to the motion model along
    /// with `controls` (and `observations` as context), re-normalized, and
    /// the propagated distribution recovered. `motion_cov` is added to the
    /// recovered covariance — process noise is additive.
    ///
    /// # Errors
    /// - [`FilterError::Uninitialized`] before `init`
    /// - [`FilterError::DimensionMismatch`] if `motion_cov` does not match
    ///   the state dimension, or the motion model returns a state of the
    ///   wrong dimension
    pub fn predict(
        &mut self,
        controls: &ControlVector<T>,
        observations: &DMatrix<T>,
        motion_cov: &StateCovariance<T>,
    ) -> Result<()> {
        let belief = self.belief.as_ref().ok_or(FilterError::Uninitialized)?;
        let n = belief.dim();

        if motion_cov.dim() != n {
            return Err(FilterError::DimensionMismatch {
                what: "motion covariance vs state",
                expected: n,
                actual: motion_cov.dim(),
            });
        }

        let mut sigma = self.transform.sigma_points(
            &belief.mean,
            &belief.covariance,
            self.normalize_state.as_ref(),
        )?;

        for point in sigma.points.iter_mut() {
            let propagated = self.motion.estimate_state(point, controls, observations);
            if propagated.len() != n {
                return Err(FilterError::DimensionMismatch {
                    what: "propagated state vs state",
                    expected: n,
                    actual: propagated.len(),
                });
            }
            *point = StateVector::from_dvector(
                self.normalize_state.normalize(propagated.into_dvector()),
            );
        }

        let mean = self
            .transform
            .recover_mean(&sigma, self.normalize_state.as_ref());
        let covariance = self
            .transform
            .recover_covariance(&sigma, &mean, self.normalize_state.as_ref());

        self.belief = Some(Belief::new(mean, covariance.add(motion_cov)));
        Ok(())
    }

    /// Correction step: folds a set of observations into the belief.
    ///
    /// `observations` is the raw measurement matrix (one block per column);
    /// `sensor_cov` is the noise covariance of a *single* measurement block
    /// and is tiled block-diagonally across all received blocks.
    ///
    /// # Errors
    /// - [`FilterError::Uninitialized`] before `init`
    /// - [`FilterError::DimensionMismatch`] if the flattened observation
    ///   length is not a whole multiple of the `sensor_cov` block dimension,
    ///   if the sensor model's outputs disagree in dimension across sigma
    ///   points, or if the predicted observations do not match the received
    ///   ones in dimension
    /// - [`FilterError::SingularMatrix`] if the innovation covariance cannot
    ///   be inverted
    pub fn correct(
        &mut self,
        observations: &DMatrix<T>,
        sensor_cov: &ObservationCovariance<T>,
    ) -> Result<()> {
        let belief = self.belief.as_ref().ok_or(FilterError::Uninitialized)?;
        let n = belief.dim();

        let obs = Observation::from_column_stacked(observations);
        let block = sensor_cov.dim();
        if block == 0 || obs.len() % block != 0 {
            return Err(FilterError::DimensionMismatch {
                what: "stacked observations vs sensor covariance block",
                expected: block,
                actual: obs.len(),
            });
        }
        let obs_noise = sensor_cov.replicate(obs.len() / block);

        let sigma_state = self.transform.sigma_points(
            &belief.mean,
            &belief.covariance,
            self.normalize_state.as_ref(),
        )?;

        // Push every sigma point through the sensor model; the observation
        // dimension is fixed by the first point's result.
        let mut obs_points: Vec<Observation<T>> = Vec::with_capacity(sigma_state.len());
        for point in &sigma_state.points {
            let predicted = self.sensor.estimate_observations(point, observations);
            let flat = Observation::from_column_stacked(&predicted);
            if let Some(first) = obs_points.first() {
                if flat.len() != first.len() {
                    return Err(FilterError::DimensionMismatch {
                        what: "predicted observation dimension across sigma points",
                        expected: first.len(),
                        actual: flat.len(),
                    });
                }
            }
            obs_points.push(Observation::from_dvector(
                self.normalize_observation.normalize(flat.into_dvector()),
            ));
        }
        let sigma_obs = SigmaPoints {
            points: obs_points,
            w_mean: sigma_state.w_mean.clone(),
            w_cov: sigma_state.w_cov.clone(),
        };

        let obs_mean = self
            .transform
            .recover_mean(&sigma_obs, self.normalize_observation.as_ref());
        let obs_cov = self.transform.recover_covariance(
            &sigma_obs,
            &obs_mean,
            self.normalize_observation.as_ref(),
        );
        let cross = self.transform.cross_covariance(
            &belief.mean,
            &sigma_state,
            self.normalize_state.as_ref(),
            &obs_mean,
            &sigma_obs,
            self.normalize_observation.as_ref(),
        )?;

        if obs_mean.len() != obs.len() {
            return Err(FilterError::DimensionMismatch {
                what: "predicted observations vs received observations",
                expected: obs.len(),
                actual: obs_mean.len(),
            });
        }
        if cross.nrows() != n || cross.ncols() != obs_mean.len() {
            return Err(FilterError::DimensionMismatch {
                what: "cross covariance vs state and observations",
                expected: n,
                actual: cross.nrows(),
            });
        }

        let innovation_cov = obs_cov.add(&obs_noise);
        let innovation_inv = innovation_cov
            .try_inverse()
            .ok_or(FilterError::SingularMatrix)?;

        let gain = cross.as_matrix() * innovation_inv.as_matrix();
        let residual = self
            .normalize_observation
            .normalize(obs.as_dvector() - obs_mean.as_dvector());

        let mean = StateVector::from_dvector(belief.mean.as_dvector() + &gain * residual);
        let covariance = StateCovariance::from_matrix(
            belief.covariance.as_matrix() - &gain * innovation_cov.as_matrix() * gain.transpose(),
        );

        self.belief = Some(Belief::new(mean, covariance));
        Ok(())
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use crate::models::{ConstantVelocity2D, PositionSensor2D};
    use nalgebra::dmatrix;

    fn cv_filter() -> UnscentedKalmanFilter<f64, ConstantVelocity2D<f64>, PositionSensor2D> {
        UnscentedKalmanFilter::new(ConstantVelocity2D::new(1.0), PositionSensor2D::new())
    }

    #[test]
    fn test_uninitialized_filter() {
        let mut filter = cv_filter();
        assert!(filter.estimate().is_none());

        let controls = ControlVector::from_slice(&[]);
        let err = filter
            .predict(&controls, &DMatrix::zeros(0, 0), &StateCovariance::zeros(4))
            .unwrap_err();
        assert_eq!(err, FilterError::Uninitialized);

        let err = filter
            .correct(&dmatrix![1.0; 2.0], &ObservationCovariance::identity(2))
            .unwrap_err();
        assert_eq!(err, FilterError::Uninitialized);
    }

    #[test]
    fn test_init_dimension_mismatch() {
        let mut filter = cv_filter();
        let err = filter
            .init(
                StateVector::from_slice(&[0.0, 0.0, 0.0, 0.0]),
                StateCovariance::identity(3),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::DimensionMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_predict_motion_cov_mismatch() {
        let mut filter = cv_filter();
        filter
            .init(
                StateVector::from_slice(&[0.0, 0.0, 1.0, 0.0]),
                StateCovariance::identity(4),
            )
            .unwrap();

        let controls = ControlVector::from_slice(&[]);
        let err = filter
            .predict(&controls, &DMatrix::zeros(0, 0), &StateCovariance::zeros(3))
            .unwrap_err();
        assert!(matches!(err, FilterError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_predict_moves_state() {
        let mut filter = cv_filter();
        filter
            .init(
                StateVector::from_slice(&[0.0, 0.0, 1.0, 2.0]),
                StateCovariance::identity(4),
            )
            .unwrap();

        let controls = ControlVector::from_slice(&[]);
        filter
            .predict(&controls, &DMatrix::zeros(0, 0), &StateCovariance::zeros(4))
            .unwrap();

        let belief = filter.estimate().unwrap();
        assert!((belief.mean.index(0) - 1.0).abs() < 1e-6);
        assert!((belief.mean.index(1) - 2.0).abs() < 1e-6);
        assert!((belief.mean.index(2) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_correct_block_multiple_precondition() {
        let mut filter = cv_filter();
        filter
            .init(
                StateVector::from_slice(&[0.0, 0.0, 0.0, 0.0]),
                StateCovariance::identity(4),
            )
            .unwrap();

        // Three stacked components cannot be whole copies of a 2x2 block
        let err = filter
            .correct(
                &dmatrix![1.0; 2.0; 3.0],
                &ObservationCovariance::identity(2),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::DimensionMismatch {
                what: "stacked observations vs sensor covariance block",
                ..
            }
        ));
    }

    #[test]
    fn test_correct_pulls_state_toward_measurement() {
        let mut filter = cv_filter();
        filter
            .init(
                StateVector::from_slice(&[0.0, 0.0, 0.0, 0.0]),
                StateCovariance::identity(4),
            )
            .unwrap();

        let sensor_cov = ObservationCovariance::from_matrix(dmatrix![0.01, 0.0; 0.0, 0.01]);
        filter.correct(&dmatrix![1.0; 1.0], &sensor_cov).unwrap();

        let belief = filter.estimate().unwrap();
        assert!(*belief.mean.index(0) > 0.9, "x: {}", belief.mean.index(0));
        assert!(*belief.mean.index(1) > 0.9, "y: {}", belief.mean.index(1));
        // Position uncertainty shrinks
        assert!(belief.covariance.as_matrix()[(0, 0)] < 0.1);
    }
}

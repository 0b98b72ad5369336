//! Sensor models predicting observations from states
//!
//! A sensor model is a black-box capability: given one state sample and the
//! raw measurement matrix of the current step, it returns the observation
//! matrix the sensor would produce from that state. The filter evaluates it
//! once per sigma point per correction and flattens the result column-wise,
//! so implementations must be pure and keep a fixed output shape within one
//! correction step.
//!
//! Observation matrices carry one measurement block per column — e.g., a
//! range-bearing sensor seeing three landmarks produces a 2x3 matrix.

use alloc::vec::Vec;

use nalgebra::{DMatrix, RealField};
use num_traits::Float;

use crate::types::normalize::wrap_angle;
use crate::types::spaces::StateVector;

/// Trait for sensor (observation) models.
///
/// Describes the measurement process z = h(x) + v, where v is zero-mean
/// measurement noise whose single-block covariance the caller passes to the
/// filter's correct step.
pub trait SensorModel<T: RealField> {
    /// Predicts the observation matrix a sensor would produce from `state`.
    ///
    /// `observations` is the actual measurement matrix received this step;
    /// models use it to mirror its shape (how many repeated measurements to
    /// predict) or to resolve which entities were observed.
    fn estimate_observations(
        &self,
        state: &StateVector<T>,
        observations: &DMatrix<T>,
    ) -> DMatrix<T>;
}

// ============================================================================
// Common Sensor Models
// ============================================================================

/// Direct position sensor in 2D.
///
/// Observes [x, y] from any state whose first two components are the
/// position. The prediction is replicated across as many columns as the
/// received measurement matrix holds, covering the repeated-measurement case
/// (several position fixes of the same target in one step).
#[derive(Debug, Clone)]
pub struct PositionSensor2D;

impl PositionSensor2D {
    /// Creates a new position sensor.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PositionSensor2D {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Float + Copy> SensorModel<T> for PositionSensor2D {
    fn estimate_observations(
        &self,
        state: &StateVector<T>,
        observations: &DMatrix<T>,
    ) -> DMatrix<T> {
        let x = *state.index(0);
        let y = *state.index(1);
        let copies = ::core::cmp::max(observations.ncols(), 1);

        DMatrix::from_fn(2, copies, |row, _| if row == 0 { x } else { y })
    }
}

/// Range-bearing sensor against a known landmark map.
///
/// State: [x, y, heading]. For every landmark the sensor predicts one
/// [range; bearing] column, bearing measured relative to the heading and
/// wrapped into [-pi, pi). Pair the filter with a
/// [`WrapAngles::per_block`](crate::types::normalize::WrapAngles::per_block)
/// observation normalizer so stacked bearing residuals stay canonical.
#[derive(Debug, Clone)]
pub struct LandmarkRangeBearing<T: RealField> {
    /// Landmark positions [x, y], observed in declaration order
    pub landmarks: Vec<[T; 2]>,
}

impl<T: RealField + Float + Copy> LandmarkRangeBearing<T> {
    /// Creates a new range-bearing sensor for the given landmark map.
    ///
    /// # Panics
    /// Panics if the map is empty.
    pub fn new(landmarks: Vec<[T; 2]>) -> Self {
        assert!(!landmarks.is_empty(), "Landmark map must not be empty");
        Self { landmarks }
    }
}

impl<T: RealField + Float + Copy> SensorModel<T> for LandmarkRangeBearing<T> {
    fn estimate_observations(
        &self,
        state: &StateVector<T>,
        _observations: &DMatrix<T>,
    ) -> DMatrix<T> {
        let x = *state.index(0);
        let y = *state.index(1);
        let heading = *state.index(2);

        DMatrix::from_fn(2, self.landmarks.len(), |row, col| {
            let dx = self.landmarks[col][0] - x;
            let dy = self.landmarks[col][1] - y;
            if row == 0 {
                Float::sqrt(dx * dx + dy * dy)
            } else {
                wrap_angle(Float::atan2(dy, dx) - heading)
            }
        })
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;
    use nalgebra::DMatrix;

    #[test]
    fn test_position_sensor_mirrors_measurement_count() {
        let sensor = PositionSensor2D::new();
        let state = StateVector::from_slice(&[10.0, 20.0, 1.0, 2.0]);

        let received = DMatrix::from_element(2, 3, 0.0);
        let predicted = sensor.estimate_observations(&state, &received);

        assert_eq!(predicted.nrows(), 2);
        assert_eq!(predicted.ncols(), 3);
        for col in 0..3 {
            assert!((predicted[(0, col)] - 10.0).abs() < 1e-10);
            assert!((predicted[(1, col)] - 20.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_position_sensor_without_measurements() {
        let sensor = PositionSensor2D::new();
        let state = StateVector::from_slice(&[1.0, 2.0, 0.0, 0.0]);

        let predicted = sensor.estimate_observations(&state, &DMatrix::zeros(0, 0));
        assert_eq!(predicted.ncols(), 1);
    }

    #[test]
    fn test_range_bearing_prediction() {
        let sensor = LandmarkRangeBearing::new(vec![[10.0, 0.0], [0.0, 5.0]]);
        let state = StateVector::from_slice(&[0.0, 0.0, 0.0]);

        let predicted = sensor.estimate_observations(&state, &DMatrix::zeros(0, 0));

        assert_eq!(predicted.nrows(), 2);
        assert_eq!(predicted.ncols(), 2);

        // Landmark at (10, 0): range 10, dead ahead
        assert!((predicted[(0, 0)] - 10.0).abs() < 1e-10);
        assert!(predicted[(1, 0)].abs() < 1e-10);

        // Landmark at (0, 5): range 5, 90 degrees left
        assert!((predicted[(0, 1)] - 5.0).abs() < 1e-10);
        assert!((predicted[(1, 1)] - FRAC_PI_2).abs() < 1e-10);
    }

    #[test]
    fn test_range_bearing_relative_to_heading() {
        let sensor = LandmarkRangeBearing::new(vec![[10.0, 0.0]]);
        // Facing the landmark directly
        let state = StateVector::from_slice(&[0.0, 0.0, 0.0]);
        let ahead = sensor.estimate_observations(&state, &DMatrix::zeros(0, 0));
        assert!(ahead[(1, 0)].abs() < 1e-10);

        // Facing north: the landmark appears 90 degrees right
        let state = StateVector::from_slice(&[0.0, 0.0, FRAC_PI_2]);
        let right = sensor.estimate_observations(&state, &DMatrix::zeros(0, 0));
        assert!((right[(1, 0)] - (-FRAC_PI_2)).abs() < 1e-10);
    }
}

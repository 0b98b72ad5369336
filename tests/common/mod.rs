//! Common test helpers for UKF integration tests

#![cfg(feature = "alloc")]
#![allow(dead_code)]

use kalmar::filters::ukf::UnscentedKalmanFilter;
use kalmar::models::{MotionModel, SensorModel};
use kalmar::types::spaces::{ControlVector, StateVector};
use nalgebra::DMatrix;

/// Motion model that leaves every state sample unchanged
#[derive(Debug, Clone)]
pub struct IdentityMotion;

impl MotionModel<f64> for IdentityMotion {
    fn estimate_state(
        &self,
        state: &StateVector<f64>,
        _controls: &ControlVector<f64>,
        _observations: &DMatrix<f64>,
    ) -> StateVector<f64> {
        state.clone()
    }
}

/// Sensor model that observes the full state directly (one column)
#[derive(Debug, Clone)]
pub struct FullStateSensor;

impl SensorModel<f64> for FullStateSensor {
    fn estimate_observations(
        &self,
        state: &StateVector<f64>,
        _observations: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        DMatrix::from_column_slice(state.len(), 1, state.as_slice())
    }
}

/// Misbehaving sensor whose output dimension depends on the state sample.
///
/// Returns one measurement column at the anchor point and two elsewhere, so
/// the central sigma point and the spread points disagree.
#[derive(Debug, Clone)]
pub struct FlakySensor {
    pub anchor_x: f64,
}

impl SensorModel<f64> for FlakySensor {
    fn estimate_observations(
        &self,
        state: &StateVector<f64>,
        _observations: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        let at_anchor = (state.index(0) - self.anchor_x).abs() < 1e-12;
        let copies = if at_anchor { 1 } else { 2 };
        DMatrix::from_element(1, copies, *state.index(0))
    }
}

/// A filter over identity dynamics and a full-state sensor
pub fn make_identity_filter() -> UnscentedKalmanFilter<f64, IdentityMotion, FullStateSensor> {
    UnscentedKalmanFilter::new(IdentityMotion, FullStateSensor)
}

/// Empty observation matrix for predict calls that carry no hint
pub fn no_observations() -> DMatrix<f64> {
    DMatrix::zeros(0, 0)
}

//! Motion models describing state propagation under controls
//!
//! A motion model is a black-box capability: given one state sample and the
//! controls applied since the last estimation step, it returns the propagated
//! state. The filter evaluates it once per sigma point per prediction, so
//! implementations must be pure and cheap to call repeatedly.

use nalgebra::{DMatrix, RealField};
use num_traits::Float;

use crate::types::normalize::wrap_angle;
use crate::types::spaces::{ControlVector, StateVector};

/// Trait for motion (process) models.
///
/// Describes target dynamics in the form x_{k+1} = g(x_k, u_k) + w, where w
/// is zero-mean process noise whose covariance the caller passes to the
/// filter's predict step.
pub trait MotionModel<T: RealField> {
    /// Propagates one state sample under the given controls.
    ///
    /// `observations` carries the raw measurement matrix of the current step
    /// for models that fold measurement context into their prediction (e.g.,
    /// slip correction); most models ignore it. The returned vector must
    /// have the dimension of `state` — the filter enforces this.
    fn estimate_state(
        &self,
        state: &StateVector<T>,
        controls: &ControlVector<T>,
        observations: &DMatrix<T>,
    ) -> StateVector<T>;
}

// ============================================================================
// Common Motion Models
// ============================================================================

/// Constant velocity model in 2D.
///
/// State: [x, y, vx, vy]. Controls are ignored; the time step is fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct ConstantVelocity2D<T: RealField> {
    /// Time step between estimation cycles
    pub dt: T,
}

impl<T: RealField + Float + Copy> ConstantVelocity2D<T> {
    /// Creates a new constant velocity model.
    ///
    /// # Panics
    /// Panics if `dt < 0`.
    pub fn new(dt: T) -> Self {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        Self { dt }
    }
}

impl<T: RealField + Float + Copy> MotionModel<T> for ConstantVelocity2D<T> {
    fn estimate_state(
        &self,
        state: &StateVector<T>,
        _controls: &ControlVector<T>,
        _observations: &DMatrix<T>,
    ) -> StateVector<T> {
        let x = *state.index(0);
        let y = *state.index(1);
        let vx = *state.index(2);
        let vy = *state.index(3);

        StateVector::from_slice(&[x + vx * self.dt, y + vy * self.dt, vx, vy])
    }
}

/// Differential drive (unicycle) model.
///
/// State: [x, y, heading]. Controls: [v, omega] — translational and angular
/// velocity. The pose follows a circular arc of radius v/omega; for
/// |omega| near zero the dynamics degenerate to a straight line.
///
/// The heading component lives on a circle, so pair this model with a
/// [`WrapAngles`](crate::types::normalize::WrapAngles) state normalizer.
#[derive(Debug, Clone)]
pub struct DifferentialDrive<T: RealField> {
    /// Time step between estimation cycles
    pub dt: T,
}

impl<T: RealField + Float + Copy> DifferentialDrive<T> {
    /// Creates a new differential drive model.
    ///
    /// # Panics
    /// Panics if `dt < 0`.
    pub fn new(dt: T) -> Self {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        Self { dt }
    }
}

impl<T: RealField + Float + Copy> MotionModel<T> for DifferentialDrive<T> {
    fn estimate_state(
        &self,
        state: &StateVector<T>,
        controls: &ControlVector<T>,
        _observations: &DMatrix<T>,
    ) -> StateVector<T> {
        let x = *state.index(0);
        let y = *state.index(1);
        let heading = *state.index(2);
        let v = *controls.index(0);
        let omega = *controls.index(1);

        let eps = T::from_f64(1e-10).unwrap();

        if Float::abs(omega) < eps {
            // Straight-line limit
            let dx = v * self.dt * Float::cos(heading);
            let dy = v * self.dt * Float::sin(heading);
            StateVector::from_slice(&[x + dx, y + dy, heading])
        } else {
            // Exact arc integration
            let radius = v / omega;
            let heading_new = heading + omega * self.dt;
            let x_new = x + radius * (Float::sin(heading_new) - Float::sin(heading));
            let y_new = y + radius * (Float::cos(heading) - Float::cos(heading_new));
            StateVector::from_slice(&[x_new, y_new, wrap_angle(heading_new)])
        }
    }
}

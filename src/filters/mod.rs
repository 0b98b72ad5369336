//! State estimation filters
//!
//! - [`ukf::UnscentedKalmanFilter`]: Unscented Kalman Filter for nonlinear
//!   systems with runtime-dimensioned states and observations

pub mod ukf;

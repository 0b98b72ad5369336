//! Integration scenarios: differential-drive localization with angle wrapping

#![cfg(feature = "alloc")]

mod common;

use approx::assert_relative_eq;
use common::no_observations;
use kalmar::filters::ukf::UnscentedKalmanFilter;
use kalmar::models::{DifferentialDrive, LandmarkRangeBearing, MotionModel, SensorModel};
use kalmar::types::normalize::{wrap_angle, WrapAngles};
use kalmar::types::spaces::{
    ControlVector, ObservationCovariance, StateCovariance, StateVector,
};
use nalgebra::dvector;

fn make_pose_filter(
    dt: f64,
    landmarks: Vec<[f64; 2]>,
) -> UnscentedKalmanFilter<f64, DifferentialDrive<f64>, LandmarkRangeBearing<f64>> {
    let mut filter = UnscentedKalmanFilter::new(
        DifferentialDrive::new(dt),
        LandmarkRangeBearing::new(landmarks),
    );
    // Pose state [x, y, heading]; stacked [range, bearing] observations
    filter.set_state_normalizer(Box::new(WrapAngles::at(vec![2])));
    filter.set_observation_normalizer(Box::new(WrapAngles::per_block(vec![1], 2)));
    filter
}

#[test]
fn test_localization_converges_to_truth() {
    let dt = 0.5;
    let landmarks = vec![[10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];

    let motion = DifferentialDrive::new(dt);
    let sensor = LandmarkRangeBearing::new(landmarks.clone());
    let mut filter = make_pose_filter(dt, landmarks);

    // Initial guess is half a meter off the true pose
    let mut truth = StateVector::from_slice(&[0.0, 0.0, 0.0]);
    filter
        .init(
            StateVector::from_slice(&[0.4, -0.3, 0.15]),
            StateCovariance::from_diagonal(&dvector![0.5, 0.5, 0.2]),
        )
        .unwrap();

    let initial_error = {
        let belief = filter.estimate().unwrap();
        let dx = belief.mean.index(0) - truth.index(0);
        let dy = belief.mean.index(1) - truth.index(1);
        (dx * dx + dy * dy).sqrt()
    };

    let controls = ControlVector::from_slice(&[1.0, 0.3]);
    let motion_cov = StateCovariance::from_diagonal(&dvector![0.01, 0.01, 0.005]);
    let sensor_cov = ObservationCovariance::from_diagonal(&dvector![0.01, 0.0025]);

    for _ in 0..8 {
        truth = motion.estimate_state(&truth, &controls, &no_observations());
        let observations = sensor.estimate_observations(&truth, &no_observations());

        filter
            .predict(&controls, &observations, &motion_cov)
            .unwrap();
        filter.correct(&observations, &sensor_cov).unwrap();
    }

    let belief = filter.estimate().unwrap();
    let dx = belief.mean.index(0) - truth.index(0);
    let dy = belief.mean.index(1) - truth.index(1);
    let final_error = (dx * dx + dy * dy).sqrt();

    assert!(
        final_error < initial_error,
        "Error grew: {} -> {}",
        initial_error,
        final_error
    );
    assert!(
        final_error < 0.15,
        "Did not converge to truth: error {}",
        final_error
    );
}

#[test]
fn test_heading_stays_canonical_across_wrap() {
    // Turning in place pushes the heading across the +pi boundary; the
    // recovered mean must follow the wrapped representative.
    let dt = 1.0;
    let mut filter = make_pose_filter(dt, vec![[10.0, 0.0]]);

    filter
        .init(
            StateVector::from_slice(&[0.0, 0.0, 3.0]),
            StateCovariance::from_diagonal(&dvector![0.01, 0.01, 0.01]),
        )
        .unwrap();

    let controls = ControlVector::from_slice(&[0.0, 0.5]);
    let motion_cov = StateCovariance::zeros(3);

    for step in 1..=4 {
        filter
            .predict(&controls, &no_observations(), &motion_cov)
            .unwrap();

        let belief = filter.estimate().unwrap();
        let heading = *belief.mean.index(2);
        let expected = wrap_angle(3.0 + 0.5 * step as f64);

        assert!(
            (-core::f64::consts::PI..core::f64::consts::PI).contains(&heading),
            "Step {}: heading {} left the canonical range",
            step,
            heading
        );
        assert_relative_eq!(heading, expected, epsilon = 1e-6);
    }
}

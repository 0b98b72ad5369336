//! Example usage of the Kalmar library
//!
//! Localizes a differential-drive robot against a known landmark map with
//! range-bearing measurements.

use kalmar::prelude::*;
use nalgebra::{dvector, DMatrix};

fn main() {
    println!("Kalmar: Unscented Kalman Filtering");
    println!("==================================\n");

    let dt: f64 = 0.5;
    let landmarks = vec![[10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];

    // Models used by the filter (and, cloned, to simulate the real robot)
    let motion = DifferentialDrive::new(dt);
    let sensor = LandmarkRangeBearing::new(landmarks);

    let mut filter = UnscentedKalmanFilter::new(motion.clone(), sensor.clone());

    // Pose state [x, y, heading]: wrap the heading and every stacked bearing
    filter.set_state_normalizer(Box::new(WrapAngles::at(vec![2])));
    filter.set_observation_normalizer(Box::new(WrapAngles::per_block(vec![1], 2)));

    // The robot starts at the origin; our initial guess is off by a bit
    let mut truth = StateVector::from_slice(&[0.0, 0.0, 0.0]);
    filter
        .init(
            StateVector::from_slice(&[0.3, -0.2, 0.1]),
            StateCovariance::from_diagonal(&dvector![0.5, 0.5, 0.2]),
        )
        .expect("state and covariance dimensions agree");

    // Constant controls: drive forward while turning gently left
    let controls = ControlVector::from_slice(&[1.0, 0.2]);
    let motion_cov = StateCovariance::from_diagonal(&dvector![0.01, 0.01, 0.005]);
    let sensor_cov = ObservationCovariance::from_diagonal(&dvector![0.01, 0.0025]);

    for step in 1..=10 {
        // Advance the true robot and take perfect measurements of it
        truth = motion.estimate_state(&truth, &controls, &DMatrix::zeros(0, 0));
        let observations = sensor.estimate_observations(&truth, &DMatrix::zeros(0, 0));

        filter
            .predict(&controls, &observations, &motion_cov)
            .expect("predict");
        filter.correct(&observations, &sensor_cov).expect("correct");

        let belief = filter.estimate().expect("initialized");
        let dx = belief.mean.index(0) - truth.index(0);
        let dy = belief.mean.index(1) - truth.index(1);
        let position_error = (dx * dx + dy * dy).sqrt();

        println!(
            "Step {:2}: est=({:6.3}, {:6.3}, {:6.3})  true=({:6.3}, {:6.3}, {:6.3})  \
             pos err={:.4}  uncertainty={:.4}",
            step,
            belief.mean.index(0),
            belief.mean.index(1),
            belief.mean.index(2),
            truth.index(0),
            truth.index(1),
            truth.index(2),
            position_error,
            belief.uncertainty()
        );
    }

    println!("\nLocalization complete!");
}

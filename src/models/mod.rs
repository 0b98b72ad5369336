//! Model capabilities for state estimation
//!
//! This module defines the traits through which the filter evaluates the
//! system dynamics and the sensor, plus a few ready-made implementations.

mod motion;
mod sensor;

pub use motion::*;
pub use sensor::*;

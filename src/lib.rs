//! Kalmar: unscented state estimation for nonlinear systems
//!
//! A library for recursive state estimation with the Unscented Kalman Filter.
//! The unscented transform propagates a Gaussian belief through arbitrary
//! nonlinear motion and sensor models without Jacobians, by pushing a small
//! deterministic set of weighted sample points ("sigma points") through the
//! model and recovering the output statistics.
//!
//! # Features
//!
//! - **Type Safety**: state, control, and observation spaces encoded in the
//!   type system; vectors from different spaces cannot be mixed
//! - **Runtime Dimensions**: state and observation sizes are plain runtime
//!   values, so one filter type serves any model
//! - **Pluggable Capabilities**: motion models, sensor models, and
//!   normalization strategies are injected, not hard-wired
//! - **no_std Support**: works in embedded environments with `alloc`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
pub mod types;
#[cfg(feature = "alloc")]
pub mod models;
#[cfg(feature = "alloc")]
pub mod transform;
#[cfg(feature = "alloc")]
pub mod filters;

#[cfg(feature = "alloc")]
pub mod prelude {
    pub use crate::filters::ukf::*;
    pub use crate::models::*;
    pub use crate::transform::*;
    pub use crate::types::normalize::*;
    pub use crate::types::spaces::*;
    pub use crate::{FilterError, Result};
}

/// Error types for the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Two quantities that must agree in dimension do not.
    ///
    /// `what` names the failed check so the caller can tell which of the
    /// filter's preconditions was violated.
    DimensionMismatch {
        /// Which dimension relationship failed
        what: &'static str,
        /// The dimension the operation required
        expected: usize,
        /// The dimension it was given
        actual: usize,
    },
    /// Matrix is singular and cannot be inverted
    SingularMatrix,
    /// The filter was used before `init`
    Uninitialized,
}

#[cfg(feature = "std")]
impl std::error::Error for FilterError {}

impl ::core::fmt::Display for FilterError {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        match self {
            FilterError::DimensionMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "dimension mismatch in {}: expected {}, got {}",
                what, expected, actual
            ),
            FilterError::SingularMatrix => write!(f, "matrix is singular"),
            FilterError::Uninitialized => write!(f, "filter has not been initialized"),
        }
    }
}

pub type Result<T> = ::core::result::Result<T, FilterError>;

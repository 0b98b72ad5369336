//! Normalization strategies for state and observation vectors
//!
//! Some state representations have components living on a circle (headings,
//! bearings) whose raw arithmetic drifts out of the canonical range. The
//! filter lets callers inject a [`Normalize`] strategy per space; every
//! sigma point, recovered mean, and residual passes through it so weighted
//! sums stay meaningful.

use alloc::vec::Vec;

use nalgebra::{DVector, RealField};
use num_traits::Float;

/// Maps a raw vector to its canonical representation.
///
/// Implementations must be idempotent: applying the strategy to an already
/// canonical vector returns it unchanged.
pub trait Normalize<T: RealField> {
    /// Canonicalizes the vector.
    fn normalize(&self, v: DVector<T>) -> DVector<T>;
}

/// The identity mapping, used wherever no strategy is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalize;

impl<T: RealField> Normalize<T> for IdentityNormalize {
    #[inline]
    fn normalize(&self, v: DVector<T>) -> DVector<T> {
        v
    }
}

/// Wraps an angle into the interval [-pi, pi).
#[inline]
pub fn wrap_angle<T: RealField + Float + Copy>(angle: T) -> T {
    angle - T::two_pi() * Float::floor((angle + T::pi()) / T::two_pi())
}

/// Wraps selected vector components into [-pi, pi).
///
/// Components are selected either by absolute index (state vectors with a
/// fixed layout) or by index modulo a block length (stacked observation
/// vectors where the same measurement layout repeats).
#[derive(Debug, Clone)]
pub struct WrapAngles {
    offsets: Vec<usize>,
    block: Option<usize>,
}

impl WrapAngles {
    /// Wraps the components at the given absolute indices.
    pub fn at(indices: Vec<usize>) -> Self {
        Self {
            offsets: indices,
            block: None,
        }
    }

    /// Wraps the components at the given offsets within every repeated block.
    ///
    /// For range-bearing measurements stacked as `[r, b, r, b, ...]` the
    /// bearings are `WrapAngles::per_block(vec![1], 2)`.
    ///
    /// # Panics
    /// Panics if `block` is zero.
    pub fn per_block(offsets: Vec<usize>, block: usize) -> Self {
        assert!(block > 0, "Block length must be positive");
        Self {
            offsets,
            block: Some(block),
        }
    }

    fn selects(&self, index: usize) -> bool {
        let key = match self.block {
            Some(block) => index % block,
            None => index,
        };
        self.offsets.contains(&key)
    }
}

impl<T: RealField + Float + Copy> Normalize<T> for WrapAngles {
    fn normalize(&self, mut v: DVector<T>) -> DVector<T> {
        for i in 0..v.nrows() {
            if self.selects(i) {
                v[i] = wrap_angle(v[i]);
            }
        }
        v
    }
}

//! Nearest neighbor interpolation.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use serde::{Deserialize, Serialize};

use super::trait_::{coordinate, GridLayout, Interpolator};

/// Nearest Neighbor Interpolator.
///
/// Rounds each index to the closest grid point and clamps it into the
/// domain, so samples outside the grid repeat the border value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NearestInterpolator;

impl NearestInterpolator {
    /// Create a new nearest neighbor interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for NearestInterpolator {
    fn interpolate(&self, data: &Tensor<B, 4>, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let layout = GridLayout::of(data);
        let mut idx: Option<Tensor<B, 1, Int>> = None;
        for axis in 0..layout.rank {
            let x_i = coordinate(&indices, axis)
                .round()
                .clamp(0.0, layout.upper(axis))
                .int()
                * layout.strides[axis];
            idx = Some(match idx {
                Some(acc) => acc + x_i,
                None => x_i,
            });
        }
        let flat = layout.flatten(data);
        match idx {
            Some(idx) => flat.select(0, idx),
            None => flat,
        }
    }
}

//! Cubic convolution interpolation.
//!
//! Uses the Catmull-Rom kernel (Keys, `a = -0.5`): interpolating at grid
//! points and exact for polynomials up to degree two. Each axis uses four
//! taps around the sample.
//!
//! Taps beyond the border are replaced by Keys' boundary extrapolation,
//! `f(-1) = 3 f(0) - 3 f(1) + f(2)` and its mirror on the far side, and
//! points outside the grid reuse the edge cell with an unclamped fractional
//! position. Quadratics therefore stay exact up to and past the border.
//! Axes with fewer than three samples fall back to linear taps.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::linear::LinearInterpolator;
use super::trait_::{coordinate, separable_sum, GridLayout, Interpolator, Tap};

/// Cubic (Catmull-Rom) Interpolator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CubicInterpolator;

impl CubicInterpolator {
    /// Create a new cubic interpolator.
    pub fn new() -> Self {
        Self
    }

    /// Kernel weights for the taps at offsets -1, 0, 1, 2 given the
    /// fractional position `t`, in `[0, 1)` inside the grid.
    fn weights<B: Backend>(t: Tensor<B, 1>) -> [Tensor<B, 1>; 4] {
        let t2 = t.clone().powf_scalar(2.0);
        let t3 = t.clone().powf_scalar(3.0);

        let w_m1 = t3.clone().mul_scalar(-0.5) + t2.clone() - t.clone().mul_scalar(0.5);
        let w_0 = t3.clone().mul_scalar(1.5) - t2.clone().mul_scalar(2.5) + 1.0;
        let w_1 =
            t3.clone().mul_scalar(-1.5) + t2.clone().mul_scalar(2.0) + t.mul_scalar(0.5);
        let w_2 = t3.mul_scalar(0.5) - t2.mul_scalar(0.5);
        [w_m1, w_0, w_1, w_2]
    }

    fn axis_taps<B: Backend>(
        layout: &GridLayout,
        indices: &Tensor<B, 2>,
        axis: usize,
    ) -> Vec<Tap<B>> {
        if layout.extents[axis] < 3 {
            return LinearInterpolator::axis_taps(layout, indices, axis);
        }
        let upper = layout.upper(axis);
        let x = coordinate(indices, axis);
        let x0 = x.clone().floor().clamp(0.0, upper - 1.0);
        let t = x - x0.clone();
        let [w_m1, w_0, w_1, w_2] = Self::weights(t);

        // Fold the tap below index 0 onto indices 0, 1, 2.
        let first = x0.clone().equal_elem(0.0).float();
        let spill = w_m1.clone() * first.clone();
        let w_0 = w_0 + spill.clone().mul_scalar(3.0);
        let w_1 = w_1 - spill.clone().mul_scalar(3.0);
        let w_2 = w_2 + spill;
        let w_m1 = w_m1 * (first.neg() + 1.0);

        // Fold the tap above `upper` onto the last three indices.
        let last = x0.clone().equal_elem(upper - 1.0).float();
        let spill = w_2.clone() * last.clone();
        let w_1 = w_1 + spill.clone().mul_scalar(3.0);
        let w_0 = w_0 - spill.clone().mul_scalar(3.0);
        let w_m1 = w_m1 + spill;
        let w_2 = w_2 * (last.neg() + 1.0);

        [w_m1, w_0, w_1, w_2]
            .into_iter()
            .zip([-1.0, 0.0, 1.0, 2.0])
            .map(|(weight, offset)| Tap {
                index: (x0.clone() + offset).clamp(0.0, upper).int(),
                weight,
            })
            .collect()
    }
}

impl<B: Backend> Interpolator<B> for CubicInterpolator {
    fn interpolate(&self, data: &Tensor<B, 4>, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let layout = GridLayout::of(data);
        let taps: Vec<Vec<Tap<B>>> = (0..layout.rank)
            .map(|axis| Self::axis_taps(&layout, &indices, axis))
            .collect();
        separable_sum(&layout.flatten(data), &layout, &taps)
    }
}

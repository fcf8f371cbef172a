//! Linear interpolation implementation.
//!
//! Bilinear for planar data, trilinear for volumes.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::trait_::{coordinate, separable_sum, GridLayout, Interpolator, Tap};

/// Linear Interpolator.
///
/// Points outside the grid are extrapolated from the edge cell: the lower
/// corner is clamped into `[0, extent - 2]` while the fractional weight is
/// left free, so affine data stays exact beyond the border.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    /// Create a new linear interpolator.
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn axis_taps<B: Backend>(
        layout: &GridLayout,
        indices: &Tensor<B, 2>,
        axis: usize,
    ) -> Vec<Tap<B>> {
        let upper = layout.upper(axis);
        let x = coordinate(indices, axis);
        let x0 = x.clone().floor().clamp(0.0, (upper - 1.0).max(0.0));
        let wx = x - x0.clone();
        let x1 = (x0.clone() + 1.0).clamp(0.0, upper);

        vec![
            Tap {
                index: x0.int(),
                weight: wx.clone().neg() + 1.0,
            },
            Tap {
                index: x1.int(),
                weight: wx,
            },
        ]
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate(&self, data: &Tensor<B, 4>, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let layout = GridLayout::of(data);
        let taps: Vec<Vec<Tap<B>>> = (0..layout.rank)
            .map(|axis| Self::axis_taps(&layout, &indices, axis))
            .collect();
        separable_sum(&layout.flatten(data), &layout, &taps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f64>;

    fn sample(data: &Tensor<TestBackend, 4>, points: Vec<f64>, rank: usize) -> Vec<f64> {
        let device = Default::default();
        let batch = points.len() / rank;
        let indices =
            Tensor::<TestBackend, 2>::from_data(TensorData::new(points, [batch, rank]), &device);
        LinearInterpolator::new()
            .interpolate(data, indices)
            .into_data()
            .iter::<f64>()
            .collect()
    }

    #[test]
    fn test_linear_interpolator_2d() {
        let device = Default::default();
        // value = 10 * i + j
        let data = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![0.0, 1.0, 10.0, 11.0], [2, 2, 1, 1]),
            &device,
        );
        let values = sample(&data, vec![0.0, 0.0, 1.0, 1.0, 0.5, 0.5, 0.25, 0.0, 0.0, 0.75], 2);
        let expected = [0.0, 11.0, 5.5, 2.5, 0.75];
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-12, "{} vs {}", v, e);
        }
    }

    #[test]
    fn test_linear_reproduces_affine_3d() {
        let device = Default::default();
        let mut values = Vec::new();
        for i in 0..4 {
            for j in 0..5 {
                for k in 0..6 {
                    values.push(2.0 * i as f64 - j as f64 + 0.5 * k as f64 + 1.0);
                    values.push(-(i as f64));
                }
            }
        }
        let data =
            Tensor::<TestBackend, 4>::from_data(TensorData::new(values, [4, 5, 6, 2]), &device);
        let out = sample(&data, vec![1.3, 2.7, 4.1], 3);
        let expected = 2.0 * 1.3 - 2.7 + 0.5 * 4.1 + 1.0;
        assert!((out[0] - expected).abs() < 1e-12);
        assert!((out[1] + 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_linear_extrapolates_from_edge_cell() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![0.0, 1.0, 10.0, 11.0], [2, 2, 1, 1]),
            &device,
        );
        let values = sample(&data, vec![-2.0, 0.5, 3.0, 1.5], 2);
        assert!((values[0] + 19.5).abs() < 1e-12, "{}", values[0]);
        assert!((values[1] - 31.5).abs() < 1e-12, "{}", values[1]);
    }

    #[test]
    fn test_linear_identity_outside_grid() {
        let device = Default::default();
        // f(x) = x on a 6x6 grid, two channels.
        let mut values = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                values.push(i as f64);
                values.push(j as f64);
            }
        }
        let data =
            Tensor::<TestBackend, 4>::from_data(TensorData::new(values, [6, 6, 1, 2]), &device);
        let out = sample(&data, vec![-1.0, 7.0, 5.5, -0.25], 2);
        let expected = [-1.0, 7.0, 5.5, -0.25];
        for (v, e) in out.iter().zip(expected) {
            assert!((v - e).abs() < 1e-12, "{} vs {}", v, e);
        }
    }

    #[test]
    fn test_single_sample_axis_is_constant() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![3.0, 5.0], [2, 1, 1, 1]),
            &device,
        );
        let values = sample(&data, vec![0.5, 4.0, 0.5, -2.0], 2);
        assert!((values[0] - 4.0).abs() < 1e-12);
        assert!((values[1] - 4.0).abs() < 1e-12);
    }
}

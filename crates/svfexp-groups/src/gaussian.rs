//! Separable Gaussian smoothing of vector fields.

use burn::tensor::backend::Backend;
use burn::tensor::module::conv1d;
use burn::tensor::ops::ConvOptions;
use burn::tensor::{Tensor, TensorData};
use svfexp_core::{FieldError, Result, VectorField, FIELD_RANK};

/// Gaussian smoothing filter.
///
/// Convolves every component of a field with a normalized Gaussian kernel
/// along each spatial axis in turn. Samples beyond the border count as zero.
#[derive(Debug, Clone, Copy)]
pub struct GaussianSmoother {
    /// Standard deviation in grid cells.
    sigma: f64,
    max_kernel_width: usize,
}

impl GaussianSmoother {
    /// Create a smoother with the given standard deviation in grid cells.
    pub fn new(sigma: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(FieldError::configuration(format!(
                "smoothing sigma must be finite and non-negative, got {}",
                sigma
            )));
        }
        Ok(Self {
            sigma,
            max_kernel_width: 33,
        })
    }

    /// Set the maximum kernel width (radius * 2 + 1).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width.max(1);
        self
    }

    /// Normalized kernel of length `2 * radius + 1`.
    pub fn kernel(&self) -> Vec<f64> {
        let radius = (3.0 * self.sigma).ceil() as usize;
        let width = (2 * radius + 1).min(self.max_kernel_width);
        let radius = (width - 1) / 2;

        let two_sigma2 = 2.0 * self.sigma * self.sigma;
        let kernel: Vec<f64> = (0..=2 * radius)
            .map(|i| {
                let x = i as f64 - radius as f64;
                (-x * x / two_sigma2).exp()
            })
            .collect();
        let sum: f64 = kernel.iter().sum();
        kernel.into_iter().map(|v| v / sum).collect()
    }

    /// Smooth a field along each of its spatial axes.
    pub fn apply<B: Backend>(&self, field: &VectorField<B>) -> Result<VectorField<B>> {
        if self.sigma <= 1e-6 {
            return Ok(field.clone());
        }
        let kernel = self.kernel();
        let device = field.device();
        let kernel_tensor =
            Tensor::<B, 1>::from_data(TensorData::new(kernel.clone(), [kernel.len()]), &device);

        let mut data = field.data().clone();
        for axis in 0..field.dim() {
            if field.shape()[axis] > 1 {
                data = convolve_axis(data, kernel_tensor.clone(), axis);
            }
        }
        VectorField::on_domain(data, field.domain(), field.convention())
    }
}

/// Convolve a rank-5 tensor along one axis with a centered odd kernel.
///
/// The result is returned in row-major layout, not as a permuted view.
fn convolve_axis<B: Backend>(
    input: Tensor<B, FIELD_RANK>,
    kernel: Tensor<B, 1>,
    axis: usize,
) -> Tensor<B, FIELD_RANK> {
    let dims = input.dims();
    let device = input.device();

    // Move the target axis last.
    let mut permutation = [0isize; FIELD_RANK];
    let mut next = 0;
    for i in 0..FIELD_RANK {
        if i != axis {
            permutation[next] = i as isize;
            next += 1;
        }
    }
    permutation[FIELD_RANK - 1] = axis as isize;
    let permuted = input.permute(permutation);

    let length = dims[axis];
    let batch: usize = dims.iter().product::<usize>() / length;
    let kernel_size = kernel.dims()[0];
    let options = ConvOptions::new([1], [kernel_size / 2], [1], 1);
    let output = conv1d(
        permuted.reshape([batch, 1, length]),
        kernel.reshape([1, 1, kernel_size]),
        None,
        options,
    );

    let mut permuted_shape = [0usize; FIELD_RANK];
    for (slot, &source) in permutation.iter().enumerate() {
        permuted_shape[slot] = dims[source as usize];
    }
    let mut inverse = [0isize; FIELD_RANK];
    for (slot, &source) in permutation.iter().enumerate() {
        inverse[source as usize] = slot as isize;
    }
    let restored = output.reshape(permuted_shape).permute(inverse);
    Tensor::from_data(restored.into_data(), &device)
}

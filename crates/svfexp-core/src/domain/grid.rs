//! Coordinate grids over a domain.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use super::shape::Domain;

/// Grid coordinates of every point of the domain, flattened row-major.
///
/// Points are visited with axis 0 slowest; each point contributes `dim`
/// consecutive values, the `i`-th being its axis-`i` coordinate.
pub fn grid_coordinates(domain: &Domain) -> Vec<f64> {
    let [n0, n1, n2] = domain.spatial_shape();
    let dim = domain.dim();

    let mut grid = Vec::with_capacity(domain.num_points() * dim);
    for i in 0..n0 {
        for j in 0..n1 {
            for k in 0..n2 {
                grid.push(i as f64);
                grid.push(j as f64);
                if dim == 3 {
                    grid.push(k as f64);
                }
            }
        }
    }
    grid
}

/// Generate the grid of continuous indices for a domain.
///
/// Returns a tensor of shape `[N, dim]` where N is the number of grid points,
/// in the same row-major order as the spatial axes of a field tensor.
pub fn generate_grid<B: Backend>(domain: &Domain, device: &B::Device) -> Tensor<B, 2> {
    let total = domain.num_points();
    let dim = domain.dim();
    Tensor::<B, 1>::from_data(TensorData::new(grid_coordinates(domain), [total * dim]), device)
        .reshape([total, dim])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_grid_coordinates_2d_order() {
        let domain = Domain::new(&[2, 3]).unwrap();
        let grid = grid_coordinates(&domain);
        assert_eq!(
            grid,
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 1.0, 1.0, 1.0, 2.0]
        );
    }

    #[test]
    fn test_generate_grid_3d() {
        let device = Default::default();
        let domain = Domain::new(&[2, 3, 4]).unwrap();
        let grid = generate_grid::<TestBackend>(&domain, &device);
        assert_eq!(grid.dims(), [24, 3]);

        let values: Vec<f64> = grid.into_data().iter::<f64>().collect();
        // Last point is (1, 2, 3).
        assert_eq!(&values[69..72], &[1.0, 2.0, 3.0]);
        // Second point advances the fastest axis.
        assert_eq!(&values[3..6], &[0.0, 0.0, 1.0]);
    }
}

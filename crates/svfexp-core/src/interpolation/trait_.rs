//! Interpolator trait for sampling grid data at continuous indices.
//!
//! Grid data is laid out `[Ω0, Ω1, Ω2, C]`, channels last, the same order
//! as the spatial and component axes of a vector field timepoint. Indices are
//! `[Batch, dim]` with column `i` addressing axis `i`.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Interpolator trait for sampling values at continuous coordinates.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Interpolator<B: Backend> {
    /// Interpolate every channel of `data` at the given continuous indices.
    ///
    /// # Arguments
    /// * `data` - Grid data `[Ω0, Ω1, Ω2, C]`; planar data has `Ω2 = 1`
    /// * `indices` - Continuous indices `[Batch, dim]`, `dim` 2 or 3
    ///
    /// # Returns
    /// Tensor of sampled values `[Batch, C]`
    fn interpolate(&self, data: &Tensor<B, 4>, indices: Tensor<B, 2>) -> Tensor<B, 2>;
}

/// Spatial layout of flattened grid data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GridLayout {
    pub extents: [usize; 3],
    pub strides: [i32; 3],
    pub rank: usize,
    pub channels: usize,
}

impl GridLayout {
    pub fn of<B: Backend>(data: &Tensor<B, 4>) -> Self {
        let [n0, n1, n2, channels] = data.dims();
        Self {
            extents: [n0, n1, n2],
            strides: [(n1 * n2) as i32, n2 as i32, 1],
            rank: if n2 == 1 { 2 } else { 3 },
            channels,
        }
    }

    pub fn num_points(&self) -> usize {
        self.extents.iter().product()
    }

    /// Flatten `[Ω0, Ω1, Ω2, C]` into `[N, C]` rows.
    pub fn flatten<B: Backend>(&self, data: &Tensor<B, 4>) -> Tensor<B, 2> {
        data.clone().reshape([self.num_points(), self.channels])
    }

    /// Largest valid index along an axis.
    pub fn upper(&self, axis: usize) -> f64 {
        (self.extents[axis] - 1) as f64
    }
}

/// Column `axis` of an index tensor as `[Batch]`.
pub(crate) fn coordinate<B: Backend>(indices: &Tensor<B, 2>, axis: usize) -> Tensor<B, 1> {
    let batch = indices.dims()[0];
    indices.clone().narrow(1, axis, 1).reshape([batch])
}

/// One interpolation tap along a single axis: integer position and weight.
pub(crate) struct Tap<B: Backend> {
    pub index: Tensor<B, 1, Int>,
    pub weight: Tensor<B, 1>,
}

/// Weighted sum over the tensor product of per-axis taps.
///
/// `taps[a]` lists the taps along axis `a` for the `layout.rank` spatial axes.
pub(crate) fn separable_sum<B: Backend>(
    flat: &Tensor<B, 2>,
    layout: &GridLayout,
    taps: &[Vec<Tap<B>>],
) -> Tensor<B, 2> {
    let batch = taps[0][0].index.dims()[0];
    let device = flat.device();
    let mut acc = Tensor::<B, 2>::zeros([batch, layout.channels], &device);

    let counts: Vec<usize> = taps.iter().map(|t| t.len()).collect();
    let total: usize = counts.iter().product();
    for combo in 0..total {
        let mut rest = combo;
        let mut index: Option<Tensor<B, 1, Int>> = None;
        let mut weight: Option<Tensor<B, 1>> = None;
        for (axis, axis_taps) in taps.iter().enumerate() {
            let tap = &axis_taps[rest % counts[axis]];
            rest /= counts[axis];
            let offset = tap.index.clone() * layout.strides[axis];
            index = Some(match index {
                Some(i) => i + offset,
                None => offset,
            });
            weight = Some(match weight {
                Some(w) => w * tap.weight.clone(),
                None => tap.weight.clone(),
            });
        }
        if let (Some(index), Some(weight)) = (index, weight) {
            let values = flat.clone().select(0, index);
            acc = acc + values * weight.reshape([batch, 1]);
        }
    }
    acc
}

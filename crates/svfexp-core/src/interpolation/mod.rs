//! Interpolation types and operations.
//!
//! This module provides interpolation traits and implementations for
//! sampling multi-channel grid data at continuous indices. Outside
//! `[0, Ω_i - 1]` nearest clamps to the border sample, while linear and cubic
//! extrapolate from the edge cell by their own interpolation rule.

pub mod cubic;
pub mod linear;
pub mod nearest;
pub mod trait_;

use std::fmt;
use std::str::FromStr;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

pub use cubic::CubicInterpolator;
pub use linear::LinearInterpolator;
pub use nearest::NearestInterpolator;
pub use trait_::Interpolator;

/// Interpolation scheme used when sampling a field off-grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    Nearest,
    #[default]
    Linear,
    Cubic,
}

impl InterpolationMethod {
    /// Every supported method.
    pub const ALL: [Self; 3] = [Self::Nearest, Self::Linear, Self::Cubic];

    /// Name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Cubic => "cubic",
        }
    }
}

impl<B: Backend> Interpolator<B> for InterpolationMethod {
    fn interpolate(&self, data: &Tensor<B, 4>, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Self::Nearest => NearestInterpolator.interpolate(data, indices),
            Self::Linear => LinearInterpolator.interpolate(data, indices),
            Self::Cubic => CubicInterpolator.interpolate(data, indices),
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMethod {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                FieldError::configuration(format!(
                    "unknown interpolation method '{}', expected one of nearest, linear, cubic",
                    s
                ))
            })
    }
}

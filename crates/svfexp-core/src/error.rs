//! Error types for field operations.
//!
//! Errors fall into three families: malformed shapes, invalid configuration,
//! and numerical failures local to a single point or trajectory. Only the
//! last family is recoverable; callers that work grid-wide collect numerical
//! errors into a report instead of aborting.

use thiserror::Error;

use crate::field::Convention;

/// Main error type for vector field operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Malformed domain or field shape.
    #[error("Shape error: {0}")]
    Shape(String),

    /// Two operands disagree in shape.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Invalid method or parameter combination.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// An operand carries the wrong coordinate convention.
    #[error("Convention mismatch: expected {expected}, got {actual}")]
    ConventionMismatch {
        expected: Convention,
        actual: Convention,
    },

    /// A point or trajectory failed to resolve.
    #[error("Numerical error at {point:?}: {reason}")]
    Numerical { point: Vec<f64>, reason: String },
}

/// Result type for field operations.
pub type Result<T> = std::result::Result<T, FieldError>;

impl FieldError {
    /// Create a shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a numerical error attached to a point.
    pub fn numerical(point: &[f64], reason: impl Into<String>) -> Self {
        Self::Numerical {
            point: point.to_vec(),
            reason: reason.into(),
        }
    }

    /// Whether the error is local to a point and may be aggregated.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Numerical { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FieldError::shape("rank 4");
        assert!(matches!(err, FieldError::Shape(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = FieldError::configuration("zero steps");
        assert_eq!(err.to_string(), "Invalid configuration: zero steps");
    }

    #[test]
    fn test_numerical_is_recoverable() {
        let err = FieldError::numerical(&[1.0, 2.0], "step size underflow");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("step size underflow"));
    }

    #[test]
    fn test_convention_mismatch_display() {
        let err = FieldError::ConventionMismatch {
            expected: Convention::Lagrangian,
            actual: Convention::Eulerian,
        };
        assert_eq!(
            err.to_string(),
            "Convention mismatch: expected lagrangian, got eulerian"
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let err = FieldError::ShapeMismatch {
            expected: vec![10, 10, 1, 1, 2],
            actual: vec![5, 5, 1, 1, 2],
        };
        let err_str = err.to_string();
        assert!(err_str.contains("expected"));
        assert!(err_str.contains("got"));
    }
}
